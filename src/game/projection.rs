//! 状态投影：按顺序折叠事件得到 [`GameState`]。
//!
//! `evolve` 是全函数：与当前状态不匹配的事件（例如没有战斗时的战斗事件）直接忽略。

use super::events::GameEvent;
use super::state::{
    ActiveQuest, Alliance, BattleState, GameState, GameStatus, MediationState, QuestOutcome,
    ShipState, Side, TacticalBattleState, TacticalOutcome, TargetRef, BATTLEFIELD_SLOTS,
};

pub fn initial_state() -> GameState {
    GameState::new()
}

pub fn evolve(mut state: GameState, event: &GameEvent) -> GameState {
    apply_event(&mut state, event);
    state
}

pub fn rebuild_state(events: &[GameEvent]) -> GameState {
    fold_events(initial_state(), events)
}

pub fn fold_events(state: GameState, events: &[GameEvent]) -> GameState {
    events.iter().fold(state, evolve)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

fn close_quest(state: &mut GameState) {
    state.active_quest = None;
    state.current_battle = None;
    state.current_tactical_battle = None;
}

fn quest_mut<'a>(state: &'a mut GameState, quest_id: &str) -> Option<&'a mut ActiveQuest> {
    state
        .active_quest
        .as_mut()
        .filter(|quest| quest.quest_id == quest_id)
}

fn battle_mut<'a>(state: &'a mut GameState, battle_id: &str) -> Option<&'a mut BattleState> {
    state
        .current_battle
        .as_mut()
        .filter(|battle| battle.battle_id == battle_id)
}

/// 就地应用单个事件。
pub fn apply_event(state: &mut GameState, event: &GameEvent) {
    match event {
        GameEvent::GameStarted {
            player_id,
            started_at,
        } => {
            state.game_status = GameStatus::InProgress;
            state.player_id = Some(player_id.clone());
            state.started_at = Some(*started_at);
        }
        GameEvent::QuestsGenerated { quest_ids } => {
            state.available_quests = quest_ids.clone();
        }
        GameEvent::PhaseChanged { to, .. } => {
            state.current_phase = *to;
        }
        GameEvent::GameEnded {
            ending_id,
            ended_at,
        } => {
            state.game_status = GameStatus::Ended;
            state.ending = Some(ending_id.clone());
            state.ended_at = Some(*ended_at);
        }
        GameEvent::CardGained { card } => {
            if !state.owns_card(&card.id) {
                state.owned_cards.push(card.clone());
            }
        }
        GameEvent::CardLost { card_id, .. } => {
            let before = state.owned_cards.len();
            state.owned_cards.retain(|card| &card.id != card_id);
            if state.owned_cards.len() < before {
                state.stats.cards_lost += 1;
            }
        }
        GameEvent::ReputationChanged {
            faction_id,
            new_value,
            ..
        } => {
            state.set_reputation(*faction_id, *new_value);
        }
        GameEvent::BountyModified {
            amount, new_total, ..
        } => {
            state.bounty = *new_total;
            if *amount > 0 {
                state.stats.bounty_earned += amount.unsigned_abs();
            }
        }
        GameEvent::BountyShared { new_total, .. } => {
            state.bounty = *new_total;
        }
        GameEvent::FlagSet { flag, value } => {
            state.flags.insert(flag.clone(), *value);
        }
        GameEvent::QuestAccepted {
            quest_id,
            faction_id,
            initial_bounty,
            ..
        } => {
            state.active_quest = Some(ActiveQuest::new(quest_id.clone(), *faction_id));
            state.bounty = state.bounty.saturating_add(*initial_bounty);
        }
        GameEvent::DilemmaPresented {
            quest_id,
            dilemma_id,
        } => {
            if let Some(quest) = quest_mut(state, quest_id) {
                quest.current_dilemma_id = Some(dilemma_id.clone());
            }
        }
        GameEvent::ChoiceMade {
            quest_id,
            dilemma_id,
            choice_id,
            ..
        } => {
            if let Some(quest) = quest_mut(state, quest_id) {
                push_unique(&mut quest.dilemmas_completed, dilemma_id);
                quest.choices_made.push(choice_id.clone());
                quest.current_dilemma_id = None;
            } else {
                return;
            }
            state.stats.choices_made += 1;
        }
        GameEvent::QuestCompleted { quest_id, outcome } => {
            push_unique(&mut state.completed_quests, quest_id);
            state.stats.quests_completed += 1;
            if *outcome == QuestOutcome::Compromise {
                state.stats.compromises += 1;
            }
            close_quest(state);
        }
        GameEvent::QuestFailed { quest_id, .. } => {
            push_unique(&mut state.failed_quests, quest_id);
            state.stats.quests_failed += 1;
            close_quest(state);
        }
        GameEvent::AllianceFormed {
            quest_id,
            faction_id,
            bounty_share,
            ..
        } => {
            let formed = match quest_mut(state, quest_id) {
                Some(quest) if !quest.is_allied_with(*faction_id) => {
                    quest.alliances.push(Alliance {
                        faction_id: *faction_id,
                        bounty_share: *bounty_share,
                    });
                    true
                }
                _ => false,
            };
            if formed {
                state.stats.alliances_formed += 1;
            }
        }
        GameEvent::AlliancesFinalized { quest_id, .. } | GameEvent::AlliancesDeclined { quest_id } => {
            if let Some(quest) = quest_mut(state, quest_id) {
                quest.alliances_closed = true;
            }
        }
        GameEvent::MediationStarted { quest_id, parties } => {
            if let Some(quest) = quest_mut(state, quest_id) {
                quest.mediation = Some(MediationState {
                    parties: parties.clone(),
                    leaned_toward: None,
                    refused: false,
                });
            }
        }
        GameEvent::MediationLeaned {
            quest_id,
            faction_id,
        } => {
            if let Some(mediation) = quest_mut(state, quest_id).and_then(|q| q.mediation.as_mut()) {
                mediation.leaned_toward = Some(*faction_id);
            }
        }
        GameEvent::MediationRefused { quest_id } => {
            if let Some(mediation) = quest_mut(state, quest_id).and_then(|q| q.mediation.as_mut()) {
                mediation.refused = true;
            }
        }
        // 赏金与任务结果由随后的 BOUNTY_MODIFIED / QUEST_COMPLETED 记录。
        GameEvent::CompromiseAccepted { .. } => {}
        GameEvent::BattleStarted {
            battle_id,
            quest_id,
            opponent_faction,
        } => {
            state.current_battle = Some(BattleState::new(
                battle_id.clone(),
                quest_id.clone(),
                *opponent_faction,
            ));
            state.current_tactical_battle = None;
        }
        GameEvent::CardSelected { battle_id, card_id } => {
            if let Some(battle) = battle_mut(state, battle_id) {
                push_unique(&mut battle.selected_card_ids, card_id);
            }
        }
        GameEvent::CardDeselected { battle_id, card_id } => {
            if let Some(battle) = battle_mut(state, battle_id) {
                battle.selected_card_ids.retain(|id| id != card_id);
            }
        }
        GameEvent::FleetCommitted {
            battle_id,
            card_ids,
        } => {
            if let Some(battle) = battle_mut(state, battle_id) {
                battle.selected_card_ids = card_ids.clone();
                battle.committed = true;
            }
        }
        GameEvent::CardPositioned {
            battle_id,
            card_id,
            position,
            previous_position,
            displaced_card_id,
        } => {
            if let Some(battle) = battle_mut(state, battle_id) {
                if *position < battle.positions.len() {
                    if let Some(previous) = previous_position.filter(|p| *p < BATTLEFIELD_SLOTS) {
                        battle.positions[previous] = displaced_card_id.clone();
                    }
                    battle.positions[*position] = Some(card_id.clone());
                }
            }
        }
        GameEvent::OrdersLocked {
            battle_id,
            positions,
        } => {
            if let Some(battle) = battle_mut(state, battle_id) {
                for (slot, card_id) in battle.positions.iter_mut().zip(positions.iter()) {
                    *slot = Some(card_id.clone());
                }
                battle.orders_locked = true;
            }
        }
        GameEvent::OpponentFleetGenerated { battle_id, fleet } => {
            if let Some(battle) = battle_mut(state, battle_id) {
                battle.opponent_fleet = fleet.clone();
            }
        }
        GameEvent::RoundResolved { battle_id, result } => {
            if let Some(battle) = battle_mut(state, battle_id) {
                battle.rounds.push(result.clone());
            }
        }
        GameEvent::BattleResolved {
            battle_id,
            outcome,
            player_wins,
            opponent_wins,
            draws,
        } => {
            let Some(battle) = battle_mut(state, battle_id) else {
                return;
            };
            battle.outcome = Some(*outcome);
            battle.player_wins = *player_wins;
            battle.opponent_wins = *opponent_wins;
            battle.draws = *draws;
            state.stats.record_battle(*outcome);
        }
        GameEvent::OutcomeAcknowledged { battle_id, .. } => {
            if let Some(battle) = battle_mut(state, battle_id) {
                battle.acknowledged = true;
            }
        }
        GameEvent::TacticalBattleStarted {
            battle_id,
            quest_id,
            round_limit,
            move_cost,
            player,
            opponent,
        } => {
            state.current_battle = None;
            state.current_tactical_battle = Some(TacticalBattleState {
                battle_id: battle_id.clone(),
                quest_id: quest_id.clone(),
                turn_number: 0,
                active_player: Side::Player,
                round_limit: *round_limit,
                move_cost: *move_cost,
                player: player.clone(),
                opponent: opponent.clone(),
                outcome: None,
            });
        }
        GameEvent::TacticalBattleEnded { battle_id, .. } => {
            if let Some(battle) = state
                .current_tactical_battle
                .as_mut()
                .filter(|battle| &battle.battle_id == battle_id && !battle.is_finished())
            {
                apply_tactical_event(battle, event);
                if let Some(outcome) = battle.outcome {
                    state.stats.record_battle(outcome.battle_outcome());
                }
            }
        }
        GameEvent::TurnStarted { .. }
        | GameEvent::ShipDeployed { .. }
        | GameEvent::ShipMoved { .. }
        | GameEvent::ShipAttacked { .. }
        | GameEvent::AbilityActivated { .. }
        | GameEvent::DamageApplied { .. }
        | GameEvent::HullRepaired { .. }
        | GameEvent::EnergyGained { .. }
        | GameEvent::ShipDestroyed { .. }
        | GameEvent::TurnEnded { .. } => {
            if let Some(battle) = state.current_tactical_battle.as_mut() {
                apply_tactical_event(battle, event);
            }
        }
    }
}

fn set_hull(battle: &mut TacticalBattleState, side: Side, target: TargetRef, hull: i32) {
    let combatant = battle.combatant_mut(side);
    match target {
        TargetRef::Flagship => combatant.flagship_hull = hull,
        TargetRef::Ship { slot } => {
            if let Some(ship) = combatant.ship_mut(slot) {
                ship.hull = hull;
            }
        }
    }
}

/// 战术战斗内部事件的折叠，同时被模拟器复用以保证决策与回放一致。
pub fn apply_tactical_event(battle: &mut TacticalBattleState, event: &GameEvent) {
    match event {
        GameEvent::TurnStarted {
            side,
            turn_number,
            energy_regenerated,
            drawn_card,
        } => {
            battle.turn_number = *turn_number;
            battle.active_player = *side;
            let combatant = battle.combatant_mut(*side);
            combatant.energy.gain(*energy_regenerated);
            for ship in combatant.battlefield.iter_mut().flatten() {
                ship.exhausted = false;
                ship.ability_used = false;
            }
            if let Some(card) = drawn_card {
                if let Some(index) = combatant
                    .deck
                    .iter()
                    .position(|candidate| candidate.card_id == card.card_id)
                {
                    combatant.deck.remove(index);
                }
                combatant.hand.push(card.clone());
            }
        }
        GameEvent::ShipDeployed {
            side,
            card,
            slot,
            energy_spent,
        } => {
            let combatant = battle.combatant_mut(*side);
            combatant.energy.spend(*energy_spent);
            if let Some(index) = combatant.hand_index(&card.card_id) {
                combatant.hand.remove(index);
            }
            if let Some(cell) = combatant.battlefield.get_mut(*slot) {
                *cell = Some(ShipState::deployed(card));
            }
        }
        GameEvent::ShipMoved {
            side,
            from_slot,
            to_slot,
            energy_spent,
        } => {
            let combatant = battle.combatant_mut(*side);
            combatant.energy.spend(*energy_spent);
            if *from_slot < BATTLEFIELD_SLOTS && *to_slot < BATTLEFIELD_SLOTS {
                combatant.battlefield.swap(*from_slot, *to_slot);
            }
        }
        GameEvent::ShipAttacked {
            side,
            attacker_slot,
            ..
        } => {
            if let Some(ship) = battle.combatant_mut(*side).ship_mut(*attacker_slot) {
                ship.exhausted = true;
            }
        }
        GameEvent::AbilityActivated {
            side,
            slot,
            energy_spent,
            ..
        } => {
            let combatant = battle.combatant_mut(*side);
            combatant.energy.spend(*energy_spent);
            if let Some(ship) = combatant.ship_mut(*slot) {
                ship.ability_used = true;
            }
        }
        GameEvent::DamageApplied {
            side,
            target,
            remaining_hull,
            ..
        }
        | GameEvent::HullRepaired {
            side,
            target,
            remaining_hull,
            ..
        } => set_hull(battle, *side, *target, *remaining_hull),
        GameEvent::EnergyGained { side, amount } => {
            battle.combatant_mut(*side).energy.gain(*amount);
        }
        GameEvent::ShipDestroyed { side, slot, .. } => {
            if let Some(cell) = battle.combatant_mut(*side).battlefield.get_mut(*slot) {
                *cell = None;
            }
        }
        GameEvent::TacticalBattleEnded {
            winner,
            victory_condition,
            player_flagship_hull,
            opponent_flagship_hull,
            ..
        } => {
            battle.player.flagship_hull = *player_flagship_hull;
            battle.opponent.flagship_hull = *opponent_flagship_hull;
            battle.outcome = Some(TacticalOutcome {
                winner: *winner,
                victory_condition: *victory_condition,
            });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::BattleOutcome;
    use crate::game::reputation::FactionId;
    use crate::game::state::{CardSource, GamePhase, OwnedCard};

    fn owned(id: &str) -> OwnedCard {
        OwnedCard {
            id: id.to_string(),
            name: id.to_string(),
            attack: 2,
            armor: 2,
            agility: 2,
            hull: 5,
            energy_cost: 1,
            abilities: Vec::new(),
            source: CardSource::Starter,
            is_locked: false,
        }
    }

    fn opening() -> Vec<GameEvent> {
        vec![
            GameEvent::GameStarted {
                player_id: "p1".into(),
                started_at: 10,
            },
            GameEvent::CardGained {
                card: owned("starter_scout"),
            },
            GameEvent::QuestsGenerated {
                quest_ids: vec!["quest_salvage_claim".into()],
            },
            GameEvent::PhaseChanged {
                from: GamePhase::NotStarted,
                to: GamePhase::QuestHub,
            },
        ]
    }

    #[test]
    fn rebuild_is_deterministic() {
        let events = opening();
        assert_eq!(rebuild_state(&events), rebuild_state(&events));
        let state = rebuild_state(&events);
        assert_eq!(state.game_status, GameStatus::InProgress);
        assert_eq!(state.current_phase, GamePhase::QuestHub);
        assert_eq!(state.owned_cards.len(), 1);
    }

    #[test]
    fn card_gained_is_unique_by_id() {
        let mut events = opening();
        events.push(GameEvent::CardGained {
            card: owned("starter_scout"),
        });
        assert_eq!(rebuild_state(&events).owned_cards.len(), 1);
    }

    #[test]
    fn battle_events_without_a_battle_are_ignored() {
        let mut events = opening();
        events.push(GameEvent::BattleResolved {
            battle_id: "missing".into(),
            outcome: BattleOutcome::Victory,
            player_wins: 3,
            opponent_wins: 1,
            draws: 1,
        });
        events.push(GameEvent::ShipDestroyed {
            side: crate::game::state::Side::Opponent,
            slot: 0,
            card_id: "x".into(),
        });
        let state = rebuild_state(&events);
        assert_eq!(state.stats.battles_won, 0);
        assert_eq!(state, rebuild_state(&opening()));
    }

    #[test]
    fn quest_completion_clears_quest_and_battle() {
        let mut events = opening();
        events.extend([
            GameEvent::QuestAccepted {
                quest_id: "quest_salvage_claim".into(),
                faction_id: FactionId::Meridian,
                initial_bounty: 500,
                accepted_at: 11,
            },
            GameEvent::BattleStarted {
                battle_id: "quest_salvage_claim-battle-1".into(),
                quest_id: "quest_salvage_claim".into(),
                opponent_faction: FactionId::Ashfall,
            },
        ]);
        let mid = rebuild_state(&events);
        assert_eq!(mid.bounty, 500);
        assert!(mid.current_battle.is_some());

        events.push(GameEvent::QuestCompleted {
            quest_id: "quest_salvage_claim".into(),
            outcome: QuestOutcome::Compromise,
        });
        let state = rebuild_state(&events);
        assert!(state.active_quest.is_none());
        assert!(!state.has_active_battle());
        assert_eq!(state.completed_quests, vec!["quest_salvage_claim".to_string()]);
        assert_eq!(state.stats.compromises, 1);
    }

    #[test]
    fn card_positioned_swaps_previous_slot() {
        let mut battle = BattleState::new("b".into(), "q".into(), FactionId::Ashfall);
        battle.positions[0] = Some("a".into());
        battle.positions[1] = Some("b".into());
        let mut state = GameState::new();
        state.current_battle = Some(battle);

        apply_event(
            &mut state,
            &GameEvent::CardPositioned {
                battle_id: "b".into(),
                card_id: "a".into(),
                position: 1,
                previous_position: Some(0),
                displaced_card_id: Some("b".into()),
            },
        );
        let battle = state.current_battle.expect("battle should remain");
        assert_eq!(battle.positions[0].as_deref(), Some("b"));
        assert_eq!(battle.positions[1].as_deref(), Some("a"));
    }

    #[test]
    fn chunked_fold_matches_full_fold() {
        let events = opening();
        let full = rebuild_state(&events);
        let (head, tail) = events.split_at(2);
        let chunked = fold_events(fold_events(initial_state(), head), tail);
        assert_eq!(full, chunked);
    }
}
