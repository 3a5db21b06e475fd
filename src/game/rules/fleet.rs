use std::collections::BTreeSet;

use super::{content_missing, ensure_phase, phase_changed, RuleEngine, RuleError};
use crate::ai::fleet::{generate_opponent_fleet, opponent_combatant, player_combatant};
use crate::game::combat::resolve_battle;
use crate::game::content::{BattleMode, ContentCatalog};
use crate::game::events::GameEvent;
use crate::game::state::{
    BattleState, CardId, GamePhase, GameState, OwnedCard, BATTLEFIELD_SLOTS, FLEET_SIZE,
};

fn current_battle(state: &GameState) -> Result<&BattleState, RuleError> {
    state.current_battle.as_ref().ok_or(RuleError::NoActiveBattle)
}

fn usable_card<'a>(state: &'a GameState, card_id: &str) -> Result<&'a OwnedCard, RuleError> {
    let card = state
        .owned_card(card_id)
        .ok_or_else(|| RuleError::CardNotOwned {
            card_id: card_id.to_string(),
        })?;
    if card.is_locked {
        return Err(RuleError::CardLocked {
            card_id: card_id.to_string(),
        });
    }
    Ok(card)
}

impl<C: ContentCatalog> RuleEngine<C> {
    pub(super) fn select_card(&self, state: &GameState, card_id: &str) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::CardSelection])?;
        let battle = current_battle(state)?;
        usable_card(state, card_id)?;
        if battle.selected_card_ids.iter().any(|id| id == card_id) {
            return Err(RuleError::CardAlreadySelected {
                card_id: card_id.to_string(),
            });
        }
        if battle.selected_card_ids.len() >= FLEET_SIZE {
            return Err(RuleError::FleetFull);
        }
        Ok(vec![GameEvent::CardSelected {
            battle_id: battle.battle_id.clone(),
            card_id: card_id.to_string(),
        }])
    }

    pub(super) fn deselect_card(&self, state: &GameState, card_id: &str) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::CardSelection])?;
        let battle = current_battle(state)?;
        if !battle.selected_card_ids.iter().any(|id| id == card_id) {
            return Err(RuleError::CardNotSelected {
                card_id: card_id.to_string(),
            });
        }
        Ok(vec![GameEvent::CardDeselected {
            battle_id: battle.battle_id.clone(),
            card_id: card_id.to_string(),
        }])
    }

    /// 提交舰队。战术任务在这里直接开战，经典任务进入布阵。
    pub(super) fn commit_fleet(
        &mut self,
        state: &GameState,
        card_ids: &[CardId],
    ) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::CardSelection])?;
        let battle = current_battle(state)?;
        if card_ids.len() != FLEET_SIZE {
            return Err(RuleError::FleetSizeMismatch {
                required: FLEET_SIZE,
                actual: card_ids.len(),
            });
        }
        let mut seen = BTreeSet::new();
        let mut fleet = Vec::with_capacity(FLEET_SIZE);
        for card_id in card_ids {
            if !seen.insert(card_id.as_str()) {
                return Err(RuleError::DuplicateCard {
                    card_id: card_id.clone(),
                });
            }
            fleet.push(usable_card(state, card_id)?.clone());
        }
        let (battle_mode, opponent_faction) = {
            let quest = self.quest_definition(&battle.quest_id)?;
            (quest.battle_mode, quest.opponent_faction)
        };

        let mut events = vec![GameEvent::FleetCommitted {
            battle_id: battle.battle_id.clone(),
            card_ids: card_ids.to_vec(),
        }];
        match battle_mode {
            BattleMode::Classic => events.push(phase_changed(state, GamePhase::Deployment)),
            BattleMode::Tactical => {
                let tactical = self.config.tactical;
                let player = player_combatant(&fleet, &tactical, &mut self.rng);
                let opponent = opponent_combatant(&self.content, opponent_faction, &tactical, &mut self.rng)
                    .ok_or_else(|| content_missing(format!("opponent pool for {opponent_faction}")))?;
                events.push(GameEvent::TacticalBattleStarted {
                    battle_id: battle.battle_id.clone(),
                    quest_id: battle.quest_id.clone(),
                    round_limit: tactical.round_limit,
                    move_cost: tactical.move_cost,
                    player,
                    opponent,
                });
                events.push(phase_changed(state, GamePhase::TacticalBattle));
            }
        }
        Ok(events)
    }

    /// 把舰船放到指定位置；目标位置已有舰船时两者交换。
    pub(super) fn set_card_position(
        &self,
        state: &GameState,
        card_id: &str,
        position: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Deployment])?;
        let battle = current_battle(state)?;
        if !battle.selected_card_ids.iter().any(|id| id == card_id) {
            return Err(RuleError::CardNotInFleet {
                card_id: card_id.to_string(),
            });
        }
        if position >= BATTLEFIELD_SLOTS {
            return Err(RuleError::InvalidPosition { position });
        }

        let previous_position = battle.position_of(card_id);
        if previous_position == Some(position) {
            return Ok(Vec::new());
        }
        Ok(vec![GameEvent::CardPositioned {
            battle_id: battle.battle_id.clone(),
            card_id: card_id.to_string(),
            position,
            previous_position,
            displaced_card_id: battle.positions[position].clone(),
        }])
    }

    /// 锁定阵型并同步结算整场经典对决。
    pub(super) fn lock_orders(&mut self, state: &GameState) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Deployment])?;
        let battle = current_battle(state)?;
        if battle.outcome.is_some() {
            return Err(RuleError::BattleAlreadyResolved);
        }
        let filled = battle.positions_filled();
        if filled < FLEET_SIZE {
            return Err(RuleError::PositionsIncomplete { filled });
        }

        let positions: Vec<CardId> = battle.positions.iter().flatten().cloned().collect();
        let player_fleet = positions
            .iter()
            .map(|card_id| usable_card(state, card_id).map(OwnedCard::to_battle_card))
            .collect::<Result<Vec<_>, _>>()?;
        let opponent_fleet = generate_opponent_fleet(&self.content, battle.opponent_faction, &mut self.rng)
            .ok_or_else(|| content_missing(format!("opponent pool for {}", battle.opponent_faction)))?;

        let result = resolve_battle(&player_fleet, &opponent_fleet, &mut self.rng);
        log::debug!(
            "battle {} resolved as {:?} ({}-{}-{})",
            battle.battle_id,
            result.outcome,
            result.player_wins,
            result.opponent_wins,
            result.draws
        );

        let battle_id = battle.battle_id.clone();
        let mut events = vec![
            GameEvent::OrdersLocked {
                battle_id: battle_id.clone(),
                positions,
            },
            GameEvent::OpponentFleetGenerated {
                battle_id: battle_id.clone(),
                fleet: opponent_fleet,
            },
        ];
        events.extend(result.rounds.into_iter().map(|round| GameEvent::RoundResolved {
            battle_id: battle_id.clone(),
            result: round,
        }));
        events.push(GameEvent::BattleResolved {
            battle_id,
            outcome: result.outcome,
            player_wins: result.player_wins,
            opponent_wins: result.opponent_wins,
            draws: result.draws,
        });
        events.push(phase_changed(state, GamePhase::Battle));
        Ok(events)
    }
}
