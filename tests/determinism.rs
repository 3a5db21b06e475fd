use fleet_rules::game::combat::{resolve_battle, BattleCard, CombatRng};
use fleet_rules::game::projection::{fold_events, initial_state, rebuild_state};
use fleet_rules::game::reputation::FactionId;
use fleet_rules::game::state::{
    CombatantState, EnergyPool, Side, TacticalBattleState, VictoryCondition,
};
use fleet_rules::game::tactical::evaluate_round_limit;
use fleet_rules::{GameCommand, GameEvent, RuleEngine};
use proptest::prelude::*;

fn command_pool() -> Vec<GameCommand> {
    vec![
        GameCommand::StartGame {
            player_id: "p1".into(),
        },
        GameCommand::AcceptQuest {
            quest_id: "quest_salvage_claim".into(),
        },
        GameCommand::AcceptQuest {
            quest_id: "quest_sanctuary_run".into(),
        },
        GameCommand::MakeChoice {
            choice_id: "choice_hail_first".into(),
            dilemma_id: None,
        },
        GameCommand::MakeChoice {
            choice_id: "choice_board_derelict".into(),
            dilemma_id: None,
        },
        GameCommand::MakeChoice {
            choice_id: "choice_call_allies".into(),
            dilemma_id: None,
        },
        GameCommand::MakeChoice {
            choice_id: "choice_propose_talks".into(),
            dilemma_id: None,
        },
        GameCommand::MakeChoice {
            choice_id: "choice_run_blockade".into(),
            dilemma_id: None,
        },
        GameCommand::FormAlliance {
            faction_id: FactionId::Meridian,
        },
        GameCommand::FormAlliance {
            faction_id: FactionId::VoidWardens,
        },
        GameCommand::FinalizeAlliances {},
        GameCommand::DeclineAllAlliances {},
        GameCommand::LeanTowardFaction {
            faction_id: FactionId::Meridian,
        },
        GameCommand::AcceptCompromise {},
        GameCommand::EndTurn {},
        GameCommand::Retreat {},
        GameCommand::AcknowledgeOutcome {},
        GameCommand::AbandonQuest {},
        GameCommand::Continue {},
    ]
}

/// 按索引序列驱动引擎，只保留被接受的命令产生的事件。
fn play(indices: &[usize], seed: u64) -> Vec<GameEvent> {
    let pool = command_pool();
    let mut engine = RuleEngine::new().with_seed(seed);
    let mut state = initial_state();
    let mut log = Vec::new();
    for index in indices {
        let command = &pool[index % pool.len()];
        if let Ok(events) = engine.decide(command, &state, 1_000) {
            state = fold_events(state, &events);
            log.extend(events);
        }
    }
    log
}

fn fleet(prefix: &str) -> Vec<BattleCard> {
    (0..5)
        .map(|index| BattleCard {
            card_id: format!("{prefix}-{index}"),
            name: format!("{prefix} {index}"),
            attack: 2 + index,
            armor: 1 + index % 3,
            agility: 5 - index,
        })
        .collect()
}

fn combatant(flagship_hull: i32) -> CombatantState {
    CombatantState {
        flagship_hull,
        flagship_max_hull: 30,
        battlefield: Default::default(),
        hand: Vec::new(),
        deck: Vec::new(),
        energy: EnergyPool {
            current: 3,
            maximum: 10,
            regeneration: 2,
        },
    }
}

fn tactical_at(turn_number: u32) -> TacticalBattleState {
    TacticalBattleState {
        battle_id: "b".into(),
        quest_id: "q".into(),
        turn_number,
        active_player: if turn_number % 2 == 0 {
            Side::Player
        } else {
            Side::Opponent
        },
        round_limit: 5,
        move_cost: 1,
        player: combatant(30),
        opponent: combatant(20),
        outcome: None,
    }
}

proptest! {
    #[test]
    fn rebuilding_is_deterministic(indices in prop::collection::vec(0usize..64, 0..40), seed in any::<u64>()) {
        let events = play(&indices, seed);
        prop_assert_eq!(rebuild_state(&events), rebuild_state(&events));
        prop_assert_eq!(play(&indices, seed), events);
    }

    #[test]
    fn folding_in_chunks_matches_full_fold(
        indices in prop::collection::vec(0usize..64, 1..40),
        chunk in 1usize..8,
    ) {
        let events = play(&indices, 99);
        let whole = rebuild_state(&events);
        let chunked = events
            .chunks(chunk)
            .fold(initial_state(), |state, batch| fold_events(state, batch));
        prop_assert_eq!(chunked, whole);
    }

    #[test]
    fn seeded_battles_repeat(seed in any::<u64>()) {
        let player = fleet("p");
        let opponent = fleet("o");
        let first = resolve_battle(&player, &opponent, &mut CombatRng::seeded(seed));
        let second = resolve_battle(&player, &opponent, &mut CombatRng::seeded(seed));
        prop_assert_eq!(first.outcome, second.outcome);
        prop_assert_eq!(first.player_wins, second.player_wins);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn reseeding_the_engine_rng_repeats_rolls() {
    let mut rng = CombatRng::seeded(1);
    rng.set_seed(Some(12345));
    let first = resolve_battle(&fleet("p"), &fleet("o"), &mut rng);
    rng.set_seed(Some(12345));
    let second = resolve_battle(&fleet("p"), &fleet("o"), &mut rng);
    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.player_wins, second.player_wins);
}

#[test]
fn round_limit_resolves_at_turn_nine_only() {
    assert_eq!(evaluate_round_limit(&tactical_at(7)), None);
    let outcome = evaluate_round_limit(&tactical_at(9)).expect("turn 9 should time out");
    assert_eq!(outcome.victory_condition, VictoryCondition::Timeout);
    assert_eq!(outcome.winner, Some(Side::Player));
}
