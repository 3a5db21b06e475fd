use std::collections::BTreeSet;

use super::{
    active_quest, content_missing, ensure_in_progress, ensure_phase, phase_changed, ReputationLedger,
    RuleEngine, RuleError,
};
use crate::game::content::{ChoiceTrigger, ContentCatalog};
use crate::game::events::GameEvent;
use crate::game::state::{
    CardSource, GamePhase, GameState, QuestOutcome, Timestamp, MIN_CARDS_FOR_BATTLE,
};

const ABANDON_REPUTATION_PENALTY: i32 = -10;

impl<C: ContentCatalog> RuleEngine<C> {
    pub(super) fn accept_quest(
        &self,
        state: &GameState,
        quest_id: &str,
        timestamp: Timestamp,
    ) -> Result<Vec<GameEvent>, RuleError> {
        ensure_in_progress(state)?;
        if state.active_quest.is_some() {
            return Err(RuleError::QuestAlreadyActive);
        }
        ensure_phase(state, &[GamePhase::QuestHub])?;
        let quest = self.quest_definition(quest_id)?;
        if state.is_quest_resolved(quest_id) {
            return Err(RuleError::QuestAlreadyResolved {
                quest_id: quest_id.to_string(),
            });
        }
        if let Some(requirement) = quest.required_reputation {
            let actual = state.reputation_of(requirement.faction_id);
            if actual < requirement.minimum {
                return Err(RuleError::ReputationTooLow {
                    faction_id: requirement.faction_id,
                    required: requirement.minimum,
                    actual,
                });
            }
        }
        let first_dilemma = quest
            .first_dilemma_id()
            .and_then(|dilemma_id| self.content.get_dilemma_by_id(dilemma_id))
            .ok_or_else(|| content_missing(format!("first dilemma of {quest_id}")))?;

        let mut events = vec![GameEvent::QuestAccepted {
            quest_id: quest.id.clone(),
            faction_id: quest.faction_id,
            initial_bounty: quest.initial_bounty,
            accepted_at: timestamp,
        }];
        for card_id in &quest.initial_card_ids {
            events.extend(self.card_gained(state, card_id, CardSource::Quest)?);
        }
        events.push(phase_changed(state, GamePhase::Narrative));
        events.push(GameEvent::DilemmaPresented {
            quest_id: quest.id.clone(),
            dilemma_id: first_dilemma.id.clone(),
        });
        Ok(events)
    }

    pub(super) fn make_choice(
        &self,
        state: &GameState,
        choice_id: &str,
        dilemma_id: Option<&str>,
        timestamp: Timestamp,
    ) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(state, &[GamePhase::Narrative])?;
        let quest = active_quest(state)?;

        let current = quest.current_dilemma_id.as_deref();
        let requested = dilemma_id
            .or(current)
            .ok_or_else(|| RuleError::UnknownDilemma {
                dilemma_id: String::new(),
            })?;
        if current.is_some_and(|current| current != requested) {
            return Err(RuleError::DilemmaMismatch {
                requested: requested.to_string(),
            });
        }
        let dilemma = self
            .content
            .get_dilemma_by_id(requested)
            .ok_or_else(|| RuleError::UnknownDilemma {
                dilemma_id: requested.to_string(),
            })?;
        if dilemma.quest_id != quest.quest_id {
            return Err(RuleError::DilemmaMismatch {
                requested: requested.to_string(),
            });
        }
        let choice = dilemma
            .choice(choice_id)
            .ok_or_else(|| RuleError::UnknownChoice {
                choice_id: choice_id.to_string(),
            })?;

        // 整个抉择被拒绝，而不是只应用一部分失去的卡。
        let lost: Vec<&String> = choice
            .cards_lost
            .iter()
            .filter(|card_id| state.owns_card(card_id))
            .collect();
        if !lost.is_empty() {
            let mut remaining: BTreeSet<&str> =
                state.owned_cards.iter().map(|card| card.id.as_str()).collect();
            remaining.extend(choice.cards_gained.iter().map(String::as_str));
            for card_id in &lost {
                remaining.remove(card_id.as_str());
            }
            if remaining.len() < MIN_CARDS_FOR_BATTLE {
                return Err(RuleError::InsufficientCards {
                    required: MIN_CARDS_FOR_BATTLE,
                    available: remaining.len(),
                });
            }
        }

        let mut events = vec![GameEvent::ChoiceMade {
            quest_id: quest.quest_id.clone(),
            dilemma_id: dilemma.id.clone(),
            choice_id: choice.id.clone(),
            made_at: timestamp,
        }];

        let mut ledger = ReputationLedger::new(state);
        for change in &choice.reputation {
            events.push(ledger.change(change.faction_id, change.delta));
        }
        for card_id in &choice.cards_gained {
            events.extend(self.card_gained(state, card_id, CardSource::Choice)?);
        }
        for card_id in lost {
            events.push(GameEvent::CardLost {
                card_id: card_id.clone(),
                reason: format!("choice:{}", choice.id),
            });
        }
        if choice.bounty_modifier != 0 {
            let new_total = (i64::from(state.bounty) + i64::from(choice.bounty_modifier)).max(0);
            let new_total = u32::try_from(new_total).unwrap_or(u32::MAX);
            events.push(GameEvent::BountyModified {
                amount: choice.bounty_modifier,
                new_total,
                reason: format!("choice:{}", choice.id),
            });
        }
        for flag in &choice.flags {
            events.push(GameEvent::FlagSet {
                flag: flag.flag.clone(),
                value: flag.value,
            });
        }

        match &choice.trigger {
            ChoiceTrigger::NextDilemma { dilemma_id } => {
                let next = match dilemma_id {
                    Some(next_id) => Some(
                        self.content
                            .get_dilemma_by_id(next_id)
                            .ok_or_else(|| content_missing(format!("dilemma {next_id}")))?,
                    ),
                    None => self.content.get_next_dilemma(&quest.quest_id, &dilemma.id),
                };
                match next {
                    Some(next) => events.push(GameEvent::DilemmaPresented {
                        quest_id: quest.quest_id.clone(),
                        dilemma_id: next.id.clone(),
                    }),
                    None => events.extend(Self::complete_quest(
                        state,
                        &quest.quest_id,
                        QuestOutcome::Peaceful,
                        GamePhase::ChoiceConsequence,
                    )),
                }
            }
            ChoiceTrigger::Alliance => {
                events.push(phase_changed(state, GamePhase::Alliance));
            }
            ChoiceTrigger::Mediation => {
                let definition = self.quest_definition(&quest.quest_id)?;
                let parties = if definition.mediation_parties.is_empty() {
                    vec![definition.faction_id, definition.opponent_faction]
                } else {
                    definition.mediation_parties.clone()
                };
                events.push(GameEvent::MediationStarted {
                    quest_id: quest.quest_id.clone(),
                    parties,
                });
                events.push(phase_changed(state, GamePhase::Mediation));
            }
            ChoiceTrigger::CompleteQuest => {
                events.extend(Self::complete_quest(
                    state,
                    &quest.quest_id,
                    QuestOutcome::Peaceful,
                    GamePhase::ChoiceConsequence,
                ));
            }
        }
        Ok(events)
    }

    pub(super) fn abandon_quest(&self, state: &GameState) -> Result<Vec<GameEvent>, RuleError> {
        ensure_phase(
            state,
            &[GamePhase::Narrative, GamePhase::Alliance, GamePhase::Mediation],
        )?;
        let quest = active_quest(state)?;
        let mut ledger = ReputationLedger::new(state);
        Ok(vec![
            GameEvent::QuestFailed {
                quest_id: quest.quest_id.clone(),
                outcome: QuestOutcome::Abandoned,
                reason: "abandoned".to_string(),
            },
            ledger.change(quest.faction_id, ABANDON_REPUTATION_PENALTY),
            phase_changed(state, GamePhase::Consequence),
        ])
    }
}
