use super::{active_quest, ensure_phase, phase_changed, ReputationLedger, RuleEngine, RuleError};
use crate::game::combat::BattleOutcome;
use crate::game::content::ContentCatalog;
use crate::game::events::GameEvent;
use crate::game::state::{BattleId, GamePhase, GameState, QuestOutcome};

const VICTORY_REPUTATION: i32 = 10;
const RIVAL_REPUTATION: i32 = -10;
const DEFEAT_REPUTATION: i32 = -5;

/// 已分出胜负的战斗（经典或战术）。
fn resolved_battle(state: &GameState) -> Result<(BattleId, BattleOutcome), RuleError> {
    if let Some(battle) = &state.current_battle {
        let outcome = battle.outcome.ok_or(RuleError::BattleNotResolved)?;
        if battle.acknowledged {
            return Err(RuleError::BattleAlreadyResolved);
        }
        return Ok((battle.battle_id.clone(), outcome));
    }
    let battle = state
        .current_tactical_battle
        .as_ref()
        .ok_or(RuleError::NoActiveBattle)?;
    let outcome = battle.outcome.ok_or(RuleError::BattleNotResolved)?;
    Ok((battle.battle_id.clone(), outcome.battle_outcome()))
}

fn signed(amount: u32) -> i32 {
    i32::try_from(amount).unwrap_or(i32::MAX)
}

impl<C: ContentCatalog> RuleEngine<C> {
    /// 确认战果：发放或扣除赏金、结算声望并结束任务。
    pub(super) fn acknowledge_outcome(&self, state: &GameState) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Battle, GamePhase::PostBattle])?;
        let quest = active_quest(state)?;
        let (battle_id, outcome) = resolved_battle(state)?;
        let definition = self.quest_definition(&quest.quest_id)?;

        let mut ledger = ReputationLedger::new(state);
        let mut events = vec![GameEvent::OutcomeAcknowledged { battle_id, outcome }];
        match outcome {
            BattleOutcome::Victory => {
                let reward = definition.victory_bounty;
                let mut total = state.bounty.saturating_add(reward);
                events.push(GameEvent::BountyModified {
                    amount: signed(reward),
                    new_total: total,
                    reason: "victory".to_string(),
                });
                for alliance in &quest.alliances {
                    let amount = ((f64::from(reward) * alliance.bounty_share).floor() as u32).min(total);
                    total -= amount;
                    events.push(GameEvent::BountyShared {
                        faction_id: alliance.faction_id,
                        amount,
                        new_total: total,
                    });
                }
                events.push(ledger.change(quest.faction_id, VICTORY_REPUTATION));
                if definition.opponent_faction != quest.faction_id {
                    events.push(ledger.change(definition.opponent_faction, RIVAL_REPUTATION));
                }
                events.push(GameEvent::QuestCompleted {
                    quest_id: quest.quest_id.clone(),
                    outcome: QuestOutcome::Victory,
                });
            }
            BattleOutcome::Defeat => {
                let penalty = definition.defeat_penalty.min(state.bounty);
                if penalty > 0 {
                    events.push(GameEvent::BountyModified {
                        amount: -signed(penalty),
                        new_total: state.bounty - penalty,
                        reason: "defeat".to_string(),
                    });
                }
                events.push(ledger.change(quest.faction_id, DEFEAT_REPUTATION));
                events.push(GameEvent::QuestFailed {
                    quest_id: quest.quest_id.clone(),
                    outcome: QuestOutcome::Defeat,
                    reason: "defeated".to_string(),
                });
            }
            BattleOutcome::Draw => events.push(GameEvent::QuestCompleted {
                quest_id: quest.quest_id.clone(),
                outcome: QuestOutcome::Draw,
            }),
        }
        events.push(phase_changed(state, GamePhase::Consequence));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fleet::tests::to_deployment;
    use super::super::tests::run;
    use super::*;
    use crate::game::commands::GameCommand;
    use crate::game::reputation::FactionId;

    /// 在部署阶段直接写入结果，免去掷骰。
    fn resolved(outcome: BattleOutcome) -> (super::super::RuleEngine, GameState) {
        let (engine, mut state) = to_deployment();
        state.current_phase = GamePhase::Battle;
        if let Some(battle) = state.current_battle.as_mut() {
            battle.outcome = Some(outcome);
        }
        (engine, state)
    }

    #[test]
    fn acknowledge_requires_a_resolved_battle() {
        let (mut engine, mut state) = to_deployment();
        state.current_phase = GamePhase::Battle;
        assert_eq!(
            run(&mut engine, &mut state, GameCommand::AcknowledgeOutcome {}),
            Err(RuleError::BattleNotResolved)
        );
    }

    #[test]
    fn victory_pays_reward_minus_alliance_share() {
        let (mut engine, mut state) = resolved(BattleOutcome::Victory);
        let meridian_before = state.reputation_of(FactionId::Meridian);
        let events = run(&mut engine, &mut state, GameCommand::AcknowledgeOutcome {})
            .expect("acknowledge should succeed");

        assert!(matches!(events.first(), Some(GameEvent::OutcomeAcknowledged { .. })));
        // 500 + 750, meridian 中立分走 750 的 30%
        let shared = events.iter().find_map(|event| match event {
            GameEvent::BountyShared { amount, .. } => Some(*amount),
            _ => None,
        });
        assert_eq!(shared, Some(225));
        assert_eq!(state.bounty, 1025);
        assert_eq!(state.reputation_of(FactionId::Meridian), meridian_before + 10);
        assert_eq!(state.reputation_of(FactionId::Ashfall), -10);
        assert_eq!(state.completed_quests, vec!["quest_salvage_claim".to_string()]);
        assert!(state.active_quest.is_none());
        assert!(state.current_battle.is_none());
        assert_eq!(state.current_phase, GamePhase::Consequence);
    }

    #[test]
    fn defeat_costs_penalty_and_fails_quest() {
        let (mut engine, mut state) = resolved(BattleOutcome::Defeat);
        run(&mut engine, &mut state, GameCommand::AcknowledgeOutcome {})
            .expect("acknowledge should succeed");
        assert_eq!(state.bounty, 300);
        assert_eq!(state.failed_quests, vec!["quest_salvage_claim".to_string()]);
        assert_eq!(state.stats.quests_failed, 1);
        assert_eq!(state.current_phase, GamePhase::Consequence);

        run(&mut engine, &mut state, GameCommand::Continue {}).expect("continue should succeed");
        assert_eq!(state.current_phase, GamePhase::QuestHub);
    }

    #[test]
    fn draw_completes_without_bounty_change() {
        let (mut engine, mut state) = resolved(BattleOutcome::Draw);
        let events = run(&mut engine, &mut state, GameCommand::AcknowledgeOutcome {})
            .expect("acknowledge should succeed");
        assert!(!events
            .iter()
            .any(|event| matches!(event, GameEvent::BountyModified { .. })));
        assert_eq!(state.bounty, 500);
        assert_eq!(state.completed_quests.len(), 1);
    }
}
