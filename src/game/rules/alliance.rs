use super::{active_quest, ensure_battle_roster, ensure_phase, RuleEngine, RuleError};
use crate::game::content::ContentCatalog;
use crate::game::events::GameEvent;
use crate::game::reputation::FactionId;
use crate::game::state::{CardSource, GamePhase, GameState};

impl<C: ContentCatalog> RuleEngine<C> {
    /// 结盟不推进阶段，可以连续与多个阵营结盟。
    pub(super) fn form_alliance(
        &self,
        state: &GameState,
        faction_id: FactionId,
    ) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Alliance])?;
        let quest = active_quest(state)?;
        if quest.is_allied_with(faction_id) {
            return Err(RuleError::AllianceAlreadyFormed { faction_id });
        }
        let reputation_status = state.reputation_status(faction_id);
        let bounty_share = reputation_status
            .bounty_share()
            .ok_or(RuleError::FactionHostile { faction_id })?;

        let mut events = vec![GameEvent::AllianceFormed {
            quest_id: quest.quest_id.clone(),
            faction_id,
            bounty_share,
            reputation_status,
        }];
        for card_id in self.content.get_alliance_card_ids(faction_id) {
            events.extend(self.card_gained(state, &card_id, CardSource::Alliance)?);
        }
        Ok(events)
    }

    pub(super) fn finalize_alliances(&self, state: &GameState) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Alliance])?;
        let quest = active_quest(state)?;
        ensure_battle_roster(state)?;

        let mut events = vec![GameEvent::AlliancesFinalized {
            quest_id: quest.quest_id.clone(),
            faction_ids: quest
                .alliances
                .iter()
                .map(|alliance| alliance.faction_id)
                .collect(),
        }];
        events.extend(self.start_battle(state, quest)?);
        Ok(events)
    }

    pub(super) fn decline_all_alliances(&self, state: &GameState) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Alliance])?;
        let quest = active_quest(state)?;
        if !quest.alliances.is_empty() {
            return Err(RuleError::AlliancesAlreadyFormed);
        }
        ensure_battle_roster(state)?;

        let mut events = vec![GameEvent::AlliancesDeclined {
            quest_id: quest.quest_id.clone(),
        }];
        events.extend(self.start_battle(state, quest)?);
        Ok(events)
    }
}
