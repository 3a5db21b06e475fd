//! 事件目录：已经发生的事实，携带折叠所需的全部数据。

use serde::{Deserialize, Serialize};

use super::combat::{BattleCard, BattleOutcome, RoundResult};
use super::reputation::{FactionId, ReputationStatus};
use super::state::{
    BattleId, CardId, ChoiceId, CombatantState, DilemmaId, GamePhase, OwnedCard, QuestId,
    QuestOutcome, ShipAbility, Side, TacticalCard, TargetRef, Timestamp, VictoryCondition,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    GameStarted {
        player_id: String,
        started_at: Timestamp,
    },
    QuestsGenerated {
        quest_ids: Vec<QuestId>,
    },
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
    GameEnded {
        ending_id: String,
        ended_at: Timestamp,
    },
    CardGained {
        card: OwnedCard,
    },
    CardLost {
        card_id: CardId,
        reason: String,
    },
    ReputationChanged {
        faction_id: FactionId,
        delta: i32,
        new_value: i32,
    },
    BountyModified {
        amount: i32,
        new_total: u32,
        reason: String,
    },
    BountyShared {
        faction_id: FactionId,
        amount: u32,
        new_total: u32,
    },
    FlagSet {
        flag: String,
        value: bool,
    },
    QuestAccepted {
        quest_id: QuestId,
        faction_id: FactionId,
        initial_bounty: u32,
        accepted_at: Timestamp,
    },
    DilemmaPresented {
        quest_id: QuestId,
        dilemma_id: DilemmaId,
    },
    ChoiceMade {
        quest_id: QuestId,
        dilemma_id: DilemmaId,
        choice_id: ChoiceId,
        made_at: Timestamp,
    },
    QuestCompleted {
        quest_id: QuestId,
        outcome: QuestOutcome,
    },
    QuestFailed {
        quest_id: QuestId,
        outcome: QuestOutcome,
        reason: String,
    },
    AllianceFormed {
        quest_id: QuestId,
        faction_id: FactionId,
        bounty_share: f64,
        reputation_status: ReputationStatus,
    },
    AlliancesFinalized {
        quest_id: QuestId,
        faction_ids: Vec<FactionId>,
    },
    AlliancesDeclined {
        quest_id: QuestId,
    },
    MediationStarted {
        quest_id: QuestId,
        parties: Vec<FactionId>,
    },
    MediationLeaned {
        quest_id: QuestId,
        faction_id: FactionId,
    },
    MediationRefused {
        quest_id: QuestId,
    },
    CompromiseAccepted {
        quest_id: QuestId,
        faction_id: FactionId,
        bounty_cost: u32,
    },
    BattleStarted {
        battle_id: BattleId,
        quest_id: QuestId,
        opponent_faction: FactionId,
    },
    CardSelected {
        battle_id: BattleId,
        card_id: CardId,
    },
    CardDeselected {
        battle_id: BattleId,
        card_id: CardId,
    },
    FleetCommitted {
        battle_id: BattleId,
        card_ids: Vec<CardId>,
    },
    CardPositioned {
        battle_id: BattleId,
        card_id: CardId,
        position: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_position: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        displaced_card_id: Option<CardId>,
    },
    OrdersLocked {
        battle_id: BattleId,
        positions: Vec<CardId>,
    },
    OpponentFleetGenerated {
        battle_id: BattleId,
        fleet: Vec<BattleCard>,
    },
    RoundResolved {
        battle_id: BattleId,
        result: RoundResult,
    },
    BattleResolved {
        battle_id: BattleId,
        outcome: BattleOutcome,
        player_wins: u32,
        opponent_wins: u32,
        draws: u32,
    },
    OutcomeAcknowledged {
        battle_id: BattleId,
        outcome: BattleOutcome,
    },
    TacticalBattleStarted {
        battle_id: BattleId,
        quest_id: QuestId,
        round_limit: u32,
        move_cost: u32,
        player: CombatantState,
        opponent: CombatantState,
    },
    TurnStarted {
        side: Side,
        turn_number: u32,
        energy_regenerated: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        drawn_card: Option<TacticalCard>,
    },
    ShipDeployed {
        side: Side,
        card: TacticalCard,
        slot: usize,
        energy_spent: u32,
    },
    ShipMoved {
        side: Side,
        from_slot: usize,
        to_slot: usize,
        energy_spent: u32,
    },
    ShipAttacked {
        side: Side,
        attacker_slot: usize,
        target: TargetRef,
    },
    AbilityActivated {
        side: Side,
        slot: usize,
        ability: ShipAbility,
        energy_spent: u32,
    },
    /// `side` 是承受伤害的一方。
    DamageApplied {
        side: Side,
        target: TargetRef,
        amount: i32,
        remaining_hull: i32,
    },
    HullRepaired {
        side: Side,
        target: TargetRef,
        amount: i32,
        remaining_hull: i32,
    },
    EnergyGained {
        side: Side,
        amount: u32,
    },
    ShipDestroyed {
        side: Side,
        slot: usize,
        card_id: CardId,
    },
    TurnEnded {
        side: Side,
        turn_number: u32,
    },
    TacticalBattleEnded {
        battle_id: BattleId,
        #[serde(default)]
        winner: Option<Side>,
        victory_condition: VictoryCondition,
        player_flagship_hull: i32,
        opponent_flagship_hull: i32,
    },
}

/// 所有已知的事件标签，回放时用来区分"未知类型"和"数据损坏"。
pub const EVENT_TYPES: &[&str] = &[
    "GAME_STARTED",
    "QUESTS_GENERATED",
    "PHASE_CHANGED",
    "GAME_ENDED",
    "CARD_GAINED",
    "CARD_LOST",
    "REPUTATION_CHANGED",
    "BOUNTY_MODIFIED",
    "BOUNTY_SHARED",
    "FLAG_SET",
    "QUEST_ACCEPTED",
    "DILEMMA_PRESENTED",
    "CHOICE_MADE",
    "QUEST_COMPLETED",
    "QUEST_FAILED",
    "ALLIANCE_FORMED",
    "ALLIANCES_FINALIZED",
    "ALLIANCES_DECLINED",
    "MEDIATION_STARTED",
    "MEDIATION_LEANED",
    "MEDIATION_REFUSED",
    "COMPROMISE_ACCEPTED",
    "BATTLE_STARTED",
    "CARD_SELECTED",
    "CARD_DESELECTED",
    "FLEET_COMMITTED",
    "CARD_POSITIONED",
    "ORDERS_LOCKED",
    "OPPONENT_FLEET_GENERATED",
    "ROUND_RESOLVED",
    "BATTLE_RESOLVED",
    "OUTCOME_ACKNOWLEDGED",
    "TACTICAL_BATTLE_STARTED",
    "TURN_STARTED",
    "SHIP_DEPLOYED",
    "SHIP_MOVED",
    "SHIP_ATTACKED",
    "ABILITY_ACTIVATED",
    "DAMAGE_APPLIED",
    "HULL_REPAIRED",
    "ENERGY_GAINED",
    "SHIP_DESTROYED",
    "TURN_ENDED",
    "TACTICAL_BATTLE_ENDED",
];

impl GameEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::GameStarted { .. } => "GAME_STARTED",
            GameEvent::QuestsGenerated { .. } => "QUESTS_GENERATED",
            GameEvent::PhaseChanged { .. } => "PHASE_CHANGED",
            GameEvent::GameEnded { .. } => "GAME_ENDED",
            GameEvent::CardGained { .. } => "CARD_GAINED",
            GameEvent::CardLost { .. } => "CARD_LOST",
            GameEvent::ReputationChanged { .. } => "REPUTATION_CHANGED",
            GameEvent::BountyModified { .. } => "BOUNTY_MODIFIED",
            GameEvent::BountyShared { .. } => "BOUNTY_SHARED",
            GameEvent::FlagSet { .. } => "FLAG_SET",
            GameEvent::QuestAccepted { .. } => "QUEST_ACCEPTED",
            GameEvent::DilemmaPresented { .. } => "DILEMMA_PRESENTED",
            GameEvent::ChoiceMade { .. } => "CHOICE_MADE",
            GameEvent::QuestCompleted { .. } => "QUEST_COMPLETED",
            GameEvent::QuestFailed { .. } => "QUEST_FAILED",
            GameEvent::AllianceFormed { .. } => "ALLIANCE_FORMED",
            GameEvent::AlliancesFinalized { .. } => "ALLIANCES_FINALIZED",
            GameEvent::AlliancesDeclined { .. } => "ALLIANCES_DECLINED",
            GameEvent::MediationStarted { .. } => "MEDIATION_STARTED",
            GameEvent::MediationLeaned { .. } => "MEDIATION_LEANED",
            GameEvent::MediationRefused { .. } => "MEDIATION_REFUSED",
            GameEvent::CompromiseAccepted { .. } => "COMPROMISE_ACCEPTED",
            GameEvent::BattleStarted { .. } => "BATTLE_STARTED",
            GameEvent::CardSelected { .. } => "CARD_SELECTED",
            GameEvent::CardDeselected { .. } => "CARD_DESELECTED",
            GameEvent::FleetCommitted { .. } => "FLEET_COMMITTED",
            GameEvent::CardPositioned { .. } => "CARD_POSITIONED",
            GameEvent::OrdersLocked { .. } => "ORDERS_LOCKED",
            GameEvent::OpponentFleetGenerated { .. } => "OPPONENT_FLEET_GENERATED",
            GameEvent::RoundResolved { .. } => "ROUND_RESOLVED",
            GameEvent::BattleResolved { .. } => "BATTLE_RESOLVED",
            GameEvent::OutcomeAcknowledged { .. } => "OUTCOME_ACKNOWLEDGED",
            GameEvent::TacticalBattleStarted { .. } => "TACTICAL_BATTLE_STARTED",
            GameEvent::TurnStarted { .. } => "TURN_STARTED",
            GameEvent::ShipDeployed { .. } => "SHIP_DEPLOYED",
            GameEvent::ShipMoved { .. } => "SHIP_MOVED",
            GameEvent::ShipAttacked { .. } => "SHIP_ATTACKED",
            GameEvent::AbilityActivated { .. } => "ABILITY_ACTIVATED",
            GameEvent::DamageApplied { .. } => "DAMAGE_APPLIED",
            GameEvent::HullRepaired { .. } => "HULL_REPAIRED",
            GameEvent::EnergyGained { .. } => "ENERGY_GAINED",
            GameEvent::ShipDestroyed { .. } => "SHIP_DESTROYED",
            GameEvent::TurnEnded { .. } => "TURN_ENDED",
            GameEvent::TacticalBattleEnded { .. } => "TACTICAL_BATTLE_ENDED",
        }
    }

    pub fn is_known_type(tag: &str) -> bool {
        EVENT_TYPES.contains(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape_is_type_and_data() {
        let event = GameEvent::QuestAccepted {
            quest_id: "quest_salvage_claim".into(),
            faction_id: FactionId::Meridian,
            initial_bounty: 500,
            accepted_at: 1,
        };
        let value = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(value["type"], "QUEST_ACCEPTED");
        assert_eq!(value["data"]["quest_id"], "quest_salvage_claim");
        assert_eq!(value["data"]["faction_id"], "meridian");
        assert_eq!(value["type"], event.event_type());
    }

    #[test]
    fn known_tags_parse_and_unknown_tags_fail() {
        let parsed: GameEvent = serde_json::from_value(json!({
            "type": "FLAG_SET",
            "data": { "flag": "boarded_derelict", "value": true }
        }))
        .expect("known event should parse");
        assert_eq!(parsed.event_type(), "FLAG_SET");

        let unknown = serde_json::from_value::<GameEvent>(json!({
            "type": "SOMETHING_NEW",
            "data": {}
        }));
        assert!(unknown.is_err());
        assert!(!GameEvent::is_known_type("SOMETHING_NEW"));
    }

    #[test]
    fn event_type_list_has_no_duplicates() {
        let mut tags = EVENT_TYPES.to_vec();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), EVENT_TYPES.len());
    }
}
