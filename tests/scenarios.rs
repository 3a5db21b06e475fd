use fleet_rules::game::reputation::FactionId;
use fleet_rules::game::state::{GamePhase, GameState};
use fleet_rules::store::{EventStore, GameSession, InMemoryEventStore, SessionError};
use fleet_rules::{GameCommand, GameEvent, RuleEngine, RuleError, RuleResolution};

const STREAM: &str = "player-1";

fn session() -> GameSession<InMemoryEventStore> {
    GameSession::new(InMemoryEventStore::new(), RuleEngine::new().with_seed(12345))
}

fn command(json: &str) -> GameCommand {
    GameCommand::from_json(json).expect("command json should parse")
}

fn send(session: &mut GameSession<InMemoryEventStore>, json: &str) -> RuleResolution {
    session
        .handle(STREAM, &command(json), 1_000)
        .unwrap_or_else(|error| panic!("{json} should succeed: {error}"))
}

fn reject(session: &mut GameSession<InMemoryEventStore>, json: &str) -> RuleError {
    let before = session.store().read_all(STREAM);
    let error = match session.handle(STREAM, &command(json), 1_000) {
        Err(SessionError::Rejected(error)) => error,
        other => panic!("{json} should be rejected, got {other:?}"),
    };
    assert_eq!(session.store().read_all(STREAM), before, "{json} appended events");
    error
}

fn started() -> GameSession<InMemoryEventStore> {
    let mut session = session();
    send(&mut session, r#"{"type":"START_GAME","data":{"player_id":"p1"}}"#);
    session
}

fn state(session: &GameSession<InMemoryEventStore>) -> GameState {
    session.state(STREAM)
}

fn owned_ids(state: &GameState) -> Vec<String> {
    state.owned_cards.iter().map(|card| card.id.clone()).collect()
}

#[test]
fn start_game_grants_three_starters() {
    let session = started();
    let state = state(&session);
    let ids = owned_ids(&state);
    assert_eq!(ids.len(), 3);
    for starter in ["starter_scout", "starter_freighter", "starter_corvette"] {
        assert!(ids.iter().any(|id| id == starter), "missing {starter}");
    }
    assert_eq!(state.bounty, 0);
    for faction in FactionId::ALL {
        assert_eq!(state.reputation_of(faction), 0);
    }
}

#[test]
fn accept_quest_and_first_choice() {
    let mut session = started();
    send(
        &mut session,
        r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_salvage_claim"}}"#,
    );
    let accepted = state(&session);
    let quest = accepted.active_quest.as_ref().expect("quest should be active");
    assert_eq!(quest.quest_id, "quest_salvage_claim");
    assert_eq!(accepted.bounty, 500);
    assert_eq!(accepted.current_phase, GamePhase::Narrative);

    send(
        &mut session,
        r#"{"type":"MAKE_CHOICE","data":{"choice_id":"choice_hail_first"}}"#,
    );
    assert_eq!(state(&session).reputation_of(FactionId::Meridian), 5);
}

#[test]
fn violated_preconditions_append_nothing() {
    let mut session = session();
    assert_eq!(
        reject(&mut session, r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_salvage_claim"}}"#),
        RuleError::GameNotInProgress
    );

    send(&mut session, r#"{"type":"START_GAME","data":{"player_id":"p1"}}"#);
    assert_eq!(
        reject(&mut session, r#"{"type":"START_GAME","data":{"player_id":"p1"}}"#),
        RuleError::GameAlreadyStarted
    );
    assert!(matches!(
        reject(&mut session, r#"{"type":"MAKE_CHOICE","data":{"choice_id":"choice_hail_first"}}"#),
        RuleError::InvalidPhase { .. }
    ));
    assert!(matches!(
        reject(&mut session, r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_nowhere"}}"#),
        RuleError::UnknownQuest { .. }
    ));

    send(
        &mut session,
        r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_salvage_claim"}}"#,
    );
    assert!(matches!(
        reject(&mut session, r#"{"type":"MAKE_CHOICE","data":{"choice_id":"choice_unknown"}}"#),
        RuleError::UnknownChoice { .. }
    ));
    assert_eq!(
        reject(&mut session, r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_sanctuary_run"}}"#),
        RuleError::QuestAlreadyActive
    );
}

#[test]
fn friendly_alliance_scenario() {
    let mut session = started();
    for json in [
        r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_salvage_claim"}}"#,
        r#"{"type":"MAKE_CHOICE","data":{"choice_id":"choice_hail_first"}}"#,
        r#"{"type":"MAKE_CHOICE","data":{"choice_id":"choice_call_allies"}}"#,
    ] {
        send(&mut session, json);
    }

    // 直接在状态上设定声望，再用引擎决策
    let mut current = state(&session);
    current.set_reputation(FactionId::Meridian, 30);
    let mut engine = RuleEngine::new().with_seed(1);
    let events = engine
        .decide(
            &command(r#"{"type":"FORM_ALLIANCE","data":{"faction_id":"meridian"}}"#),
            &current,
            1_000,
        )
        .expect("alliance should form");
    let share = events.iter().find_map(|event| match event {
        GameEvent::AllianceFormed { bounty_share, .. } => Some(*bounty_share),
        _ => None,
    });
    assert_eq!(share, Some(0.25));
    let gained = events
        .iter()
        .filter(|event| matches!(event, GameEvent::CardGained { .. }))
        .count();
    assert_eq!(gained, 2);
}

#[test]
fn classic_battle_runs_to_consequence() {
    let mut session = started();
    for json in [
        r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_salvage_claim"}}"#,
        r#"{"type":"MAKE_CHOICE","data":{"choice_id":"choice_board_derelict"}}"#,
        r#"{"type":"MAKE_CHOICE","data":{"choice_id":"choice_call_allies"}}"#,
        r#"{"type":"DECLINE_ALL_ALLIANCES","data":{}}"#,
    ] {
        send(&mut session, json);
    }
    assert_eq!(state(&session).current_phase, GamePhase::CardSelection);

    let fleet = owned_ids(&state(&session));
    assert_eq!(fleet.len(), 5);
    for card_id in &fleet {
        send(
            &mut session,
            &format!(r#"{{"type":"SELECT_CARD","data":{{"card_id":"{card_id}"}}}}"#),
        );
    }
    let commit = serde_json::json!({ "type": "COMMIT_FLEET", "data": { "card_ids": fleet } });
    send(&mut session, &commit.to_string());
    for (position, card_id) in fleet.iter().enumerate() {
        send(
            &mut session,
            &format!(
                r#"{{"type":"SET_CARD_POSITION","data":{{"card_id":"{card_id}","position":{position}}}}}"#
            ),
        );
    }

    // UI 附带的多余字段被忽略
    let resolution = send(
        &mut session,
        r#"{"type":"LOCK_ORDERS","data":{"battle_id":"ignored"}}"#,
    );
    let rounds = resolution
        .events
        .iter()
        .filter(|event| matches!(event, GameEvent::RoundResolved { .. }))
        .count();
    assert_eq!(rounds, 5);
    assert_eq!(resolution.state.current_phase, GamePhase::Battle);

    send(
        &mut session,
        r#"{"type":"ACKNOWLEDGE_OUTCOME","data":{"outcome":"victory"}}"#,
    );
    let after = state(&session);
    assert_eq!(after.current_phase, GamePhase::Consequence);
    assert!(after.active_quest.is_none());
    assert!(after.is_quest_resolved("quest_salvage_claim"));
    assert_eq!(after.stats.battles_fought(), 1);

    send(&mut session, r#"{"type":"CONTINUE","data":{}}"#);
    assert_eq!(state(&session).current_phase, GamePhase::QuestHub);
}

#[test]
fn tactical_battle_ends_within_round_limit() {
    let mut session = started();
    for json in [
        r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_sanctuary_run"}}"#,
        r#"{"type":"MAKE_CHOICE","data":{"choice_id":"choice_run_blockade"}}"#,
        r#"{"type":"FORM_ALLIANCE","data":{"faction_id":"void_wardens"}}"#,
        r#"{"type":"FINALIZE_ALLIANCES","data":{}}"#,
    ] {
        send(&mut session, json);
    }
    let fleet: Vec<String> = owned_ids(&state(&session)).into_iter().take(5).collect();
    let commit = serde_json::json!({ "type": "COMMIT_FLEET", "data": { "card_ids": fleet } });
    send(&mut session, &commit.to_string());
    assert_eq!(state(&session).current_phase, GamePhase::TacticalBattle);

    let mut turns = 0;
    while state(&session).current_phase == GamePhase::TacticalBattle {
        send(&mut session, r#"{"type":"END_TURN","data":{}}"#);
        turns += 1;
        assert!(turns <= 5, "battle should end by the round limit");
    }

    let ended = state(&session);
    assert_eq!(ended.current_phase, GamePhase::PostBattle);
    let battle = ended
        .current_tactical_battle
        .as_ref()
        .expect("battle stays until acknowledged");
    assert!(battle.outcome.is_some());
    assert!(battle.turn_number <= 9);

    send(&mut session, r#"{"type":"ACKNOWLEDGE_OUTCOME","data":{}}"#);
    let after = state(&session);
    assert_eq!(after.current_phase, GamePhase::Consequence);
    assert!(after.current_tactical_battle.is_none());
    assert!(after.is_quest_resolved("quest_sanctuary_run"));
}

#[test]
fn abandoning_costs_quest_faction_reputation() {
    let mut session = started();
    send(
        &mut session,
        r#"{"type":"ACCEPT_QUEST","data":{"quest_id":"quest_salvage_claim"}}"#,
    );
    send(&mut session, r#"{"type":"ABANDON_QUEST","data":{}}"#);
    let after = state(&session);
    assert_eq!(after.reputation_of(FactionId::Meridian), -10);
    assert_eq!(after.failed_quests, vec!["quest_salvage_claim".to_string()]);
    assert_eq!(after.current_phase, GamePhase::Consequence);
}
