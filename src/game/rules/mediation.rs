use super::{
    active_quest, ensure_battle_roster, ensure_phase, phase_changed, ReputationLedger, RuleEngine,
    RuleError,
};
use crate::game::content::ContentCatalog;
use crate::game::events::GameEvent;
use crate::game::reputation::FactionId;
use crate::game::state::{GamePhase, GameState, MediationState, QuestOutcome};

const LEAN_FAVOR: i32 = 10;
const LEAN_SLIGHT: i32 = -5;
const REFUSAL_PENALTY: i32 = -5;
/// 妥协花费当前赏金的四分之一。
const COMPROMISE_DIVISOR: u32 = 4;

fn mediation(state: &GameState) -> Result<&MediationState, RuleError> {
    active_quest(state)?
        .mediation
        .as_ref()
        .ok_or(RuleError::NoMediation)
}

impl<C: ContentCatalog> RuleEngine<C> {
    pub(super) fn lean_toward_faction(
        &self,
        state: &GameState,
        faction_id: FactionId,
    ) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Mediation])?;
        let quest = active_quest(state)?;
        let mediation = mediation(state)?;
        if mediation.leaned_toward.is_some() {
            return Err(RuleError::AlreadyLeaned);
        }
        if !mediation.parties.contains(&faction_id) {
            return Err(RuleError::NotMediationParty { faction_id });
        }

        let mut ledger = ReputationLedger::new(state);
        let mut events = vec![
            GameEvent::MediationLeaned {
                quest_id: quest.quest_id.clone(),
                faction_id,
            },
            ledger.change(faction_id, LEAN_FAVOR),
        ];
        for party in mediation.parties.iter().filter(|party| **party != faction_id) {
            events.push(ledger.change(*party, LEAN_SLIGHT));
        }
        Ok(events)
    }

    /// 拒绝表态不可撤销，直接进入战斗。
    pub(super) fn refuse_to_lean(&self, state: &GameState) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Mediation])?;
        let quest = active_quest(state)?;
        let mediation = mediation(state)?;
        ensure_battle_roster(state)?;

        let mut ledger = ReputationLedger::new(state);
        let mut events = vec![GameEvent::MediationRefused {
            quest_id: quest.quest_id.clone(),
        }];
        for party in &mediation.parties {
            events.push(ledger.change(*party, REFUSAL_PENALTY));
        }
        events.extend(self.start_battle(state, quest)?);
        Ok(events)
    }

    pub(super) fn accept_compromise(&self, state: &GameState) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Mediation])?;
        let quest = active_quest(state)?;
        let faction_id = mediation(state)?
            .leaned_toward
            .ok_or(RuleError::LeanRequired)?;

        let bounty_cost = state.bounty / COMPROMISE_DIVISOR;
        let mut events = vec![GameEvent::CompromiseAccepted {
            quest_id: quest.quest_id.clone(),
            faction_id,
            bounty_cost,
        }];
        if bounty_cost > 0 {
            events.push(GameEvent::BountyModified {
                amount: -i32::try_from(bounty_cost).unwrap_or(i32::MAX),
                new_total: state.bounty - bounty_cost,
                reason: "compromise".to_string(),
            });
        }
        events.extend(Self::complete_quest(
            state,
            &quest.quest_id,
            QuestOutcome::Compromise,
            GamePhase::Consequence,
        ));
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{run, started};
    use super::*;
    use crate::game::commands::GameCommand;

    fn to_mediation(engine_state: &mut (super::super::RuleEngine, GameState)) {
        let (engine, state) = engine_state;
        for command in [
            GameCommand::AcceptQuest {
                quest_id: "quest_salvage_claim".into(),
            },
            GameCommand::MakeChoice {
                choice_id: "choice_hail_first".into(),
                dilemma_id: None,
            },
            GameCommand::MakeChoice {
                choice_id: "choice_propose_talks".into(),
                dilemma_id: None,
            },
        ] {
            run(engine, state, command).expect("setup command should succeed");
        }
    }

    #[test]
    fn talks_start_mediation_between_parties() {
        let mut fixture = started();
        to_mediation(&mut fixture);
        let (_, state) = fixture;

        assert_eq!(state.current_phase, GamePhase::Mediation);
        let mediation = mediation(&state).expect("mediation should be running");
        assert_eq!(mediation.parties, vec![FactionId::Meridian, FactionId::Ashfall]);
        assert_eq!(state.reputation_of(FactionId::Meridian), 10);
        assert_eq!(state.reputation_of(FactionId::Ashfall), 5);
    }

    #[test]
    fn lean_once_then_compromise() {
        let mut fixture = started();
        to_mediation(&mut fixture);
        let (mut engine, mut state) = fixture;

        assert_eq!(
            run(&mut engine, &mut state, GameCommand::AcceptCompromise {}),
            Err(RuleError::LeanRequired)
        );
        assert_eq!(
            run(
                &mut engine,
                &mut state,
                GameCommand::LeanTowardFaction {
                    faction_id: FactionId::VoidWardens
                }
            ),
            Err(RuleError::NotMediationParty {
                faction_id: FactionId::VoidWardens
            })
        );

        run(
            &mut engine,
            &mut state,
            GameCommand::LeanTowardFaction {
                faction_id: FactionId::Meridian,
            },
        )
        .expect("lean should succeed");
        assert_eq!(state.reputation_of(FactionId::Meridian), 20);
        assert_eq!(state.reputation_of(FactionId::Ashfall), 0);
        assert_eq!(
            run(
                &mut engine,
                &mut state,
                GameCommand::LeanTowardFaction {
                    faction_id: FactionId::Ashfall
                }
            ),
            Err(RuleError::AlreadyLeaned)
        );

        run(&mut engine, &mut state, GameCommand::AcceptCompromise {})
            .expect("compromise should succeed");
        assert_eq!(state.bounty, 375);
        assert_eq!(state.stats.compromises, 1);
        assert!(state.active_quest.is_none());
        assert_eq!(state.current_phase, GamePhase::Consequence);
    }

    #[test]
    fn refusal_needs_a_full_roster() {
        let mut fixture = started();
        to_mediation(&mut fixture);
        let (mut engine, mut state) = fixture;
        let before = state.clone();

        assert_eq!(
            run(&mut engine, &mut state, GameCommand::RefuseToLean {}),
            Err(RuleError::InsufficientCards {
                required: 5,
                available: 3
            })
        );
        assert_eq!(state, before);
    }
}
