use super::{content_missing, ensure_phase, phase_changed, RuleEngine, RuleError};
use crate::game::content::ContentCatalog;
use crate::game::endings::evaluate_ending;
use crate::game::events::GameEvent;
use crate::game::state::{CardSource, GamePhase, GameState, GameStatus, Timestamp};

impl<C: ContentCatalog> RuleEngine<C> {
    pub(super) fn start_game(
        &self,
        state: &GameState,
        player_id: &str,
        timestamp: Timestamp,
    ) -> Result<Vec<GameEvent>, RuleError> {
        if state.game_status != GameStatus::NotStarted {
            return Err(RuleError::GameAlreadyStarted);
        }

        let mut events = vec![GameEvent::GameStarted {
            player_id: player_id.to_string(),
            started_at: timestamp,
        }];
        for card_id in self.content.starter_card_ids() {
            let definition = self
                .content
                .get_card_by_id(&card_id)
                .ok_or_else(|| content_missing(format!("starter card {card_id}")))?;
            events.push(GameEvent::CardGained {
                card: definition.to_owned_card(CardSource::Starter),
            });
        }
        events.push(GameEvent::QuestsGenerated {
            quest_ids: self.content.quest_ids(),
        });
        events.push(phase_changed(state, GamePhase::QuestHub));
        Ok(events)
    }

    /// 后果阶段之后：还有未结束的任务就回到任务大厅，否则结算结局。
    pub(super) fn continue_game(
        &self,
        state: &GameState,
        timestamp: Timestamp,
    ) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Consequence, GamePhase::ChoiceConsequence])?;

        let all_resolved = state
            .available_quests
            .iter()
            .all(|quest_id| state.is_quest_resolved(quest_id));
        if !all_resolved {
            return Ok(vec![phase_changed(state, GamePhase::QuestHub)]);
        }

        let ending = evaluate_ending(state);
        log::info!("game ended with {}", ending.as_str());
        Ok(vec![
            GameEvent::GameEnded {
                ending_id: ending.as_str().to_string(),
                ended_at: timestamp,
            },
            phase_changed(state, GamePhase::Ending),
        ])
    }
}
