//! 命令决策：校验命令并产生事件，要么全部成功要么一个事件都不产生。
//!
//! 各流程的规则分在子模块中，全部挂在 [`RuleEngine`] 上。

mod alliance;
mod fleet;
mod lifecycle;
mod mediation;
mod outcome;
mod quest;
mod tactical;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::combat::CombatRng;
use super::commands::GameCommand;
use super::content::{builtin, Catalog, ContentCatalog, QuestDefinition};
use super::events::GameEvent;
use super::reputation::{clamp_reputation, FactionId};
use super::state::{
    ActiveQuest, CardId, CardSource, DilemmaId, GamePhase, GameState, QuestId, QuestOutcome,
    Timestamp, MIN_CARDS_FOR_BATTLE,
};
use crate::config::EngineConfig;

fn phase_list(phases: &[GamePhase]) -> String {
    phases
        .iter()
        .map(|phase| phase.as_str())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// 命令被拒绝的原因。这是核心唯一对外暴露的可恢复错误。
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("the game has already started")]
    GameAlreadyStarted,
    #[error("no game is in progress")]
    GameNotInProgress,
    #[error("command not allowed during {actual}; expected {}", phase_list(.expected))]
    InvalidPhase {
        expected: Vec<GamePhase>,
        actual: GamePhase,
    },
    #[error("a quest is already active")]
    QuestAlreadyActive,
    #[error("no quest is active")]
    NoActiveQuest,
    #[error("unknown quest {quest_id}")]
    UnknownQuest { quest_id: QuestId },
    #[error("quest {quest_id} has already been resolved")]
    QuestAlreadyResolved { quest_id: QuestId },
    #[error("reputation with {faction_id} is {actual}, quest requires at least {required}")]
    ReputationTooLow {
        faction_id: FactionId,
        required: i32,
        actual: i32,
    },
    #[error("unknown dilemma {dilemma_id}")]
    UnknownDilemma { dilemma_id: DilemmaId },
    #[error("dilemma {requested} is not the one being presented")]
    DilemmaMismatch { requested: DilemmaId },
    #[error("unknown choice {choice_id}")]
    UnknownChoice { choice_id: String },
    #[error("at least {required} cards are required, {available} would remain")]
    InsufficientCards { required: usize, available: usize },
    #[error("{faction_id} is hostile and will not ally")]
    FactionHostile { faction_id: FactionId },
    #[error("already allied with {faction_id}")]
    AllianceAlreadyFormed { faction_id: FactionId },
    #[error("alliances were formed; finalize them instead of declining")]
    AlliancesAlreadyFormed,
    #[error("already leaned toward a faction")]
    AlreadyLeaned,
    #[error("{faction_id} is not a party to this mediation")]
    NotMediationParty { faction_id: FactionId },
    #[error("lean toward a faction before accepting a compromise")]
    LeanRequired,
    #[error("no mediation is in progress")]
    NoMediation,
    #[error("no battle is in progress")]
    NoActiveBattle,
    #[error("card {card_id} is not owned")]
    CardNotOwned { card_id: CardId },
    #[error("card {card_id} is locked")]
    CardLocked { card_id: CardId },
    #[error("card {card_id} is already selected")]
    CardAlreadySelected { card_id: CardId },
    #[error("card {card_id} is not selected")]
    CardNotSelected { card_id: CardId },
    #[error("the fleet already has the maximum number of cards")]
    FleetFull,
    #[error("a fleet needs exactly {required} cards, got {actual}")]
    FleetSizeMismatch { required: usize, actual: usize },
    #[error("card {card_id} appears more than once")]
    DuplicateCard { card_id: CardId },
    #[error("card {card_id} is not part of the committed fleet")]
    CardNotInFleet { card_id: CardId },
    #[error("position {position} is out of range")]
    InvalidPosition { position: usize },
    #[error("only {filled} of 5 positions are filled")]
    PositionsIncomplete { filled: usize },
    #[error("the battle has already been resolved")]
    BattleAlreadyResolved,
    #[error("the battle has not been resolved yet")]
    BattleNotResolved,
    #[error("it is not your turn")]
    NotPlayerTurn,
    #[error("card {card_id} is not in hand")]
    CardNotInHand { card_id: CardId },
    #[error("slot {slot} is occupied")]
    SlotOccupied { slot: usize },
    #[error("slot {slot} is empty")]
    EmptySlot { slot: usize },
    #[error("{required} energy required, {available} available")]
    InsufficientEnergy { required: u32, available: u32 },
    #[error("ship in slot {slot} is exhausted")]
    ShipExhausted { slot: usize },
    #[error("ship in slot {slot} has no attack")]
    ZeroAttackShip { slot: usize },
    #[error("the flagship is screened by ships")]
    FlagshipScreened,
    #[error("ship in slot {slot} already used its ability this turn")]
    AbilityUsed { slot: usize },
    #[error("ship in slot {slot} has no ability {ability_index}")]
    UnknownAbility { slot: usize, ability_index: usize },
    #[error("content not found: {what}")]
    ContentMissing { what: String },
}

impl RuleError {
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// 单次决策内累计声望变化，保证同一阵营多次变化时 `new_value` 连续且被截断。
pub(crate) struct ReputationLedger {
    values: BTreeMap<FactionId, i32>,
}

impl ReputationLedger {
    pub(crate) fn new(state: &GameState) -> Self {
        Self {
            values: state.reputation.clone(),
        }
    }

    pub(crate) fn change(&mut self, faction_id: FactionId, delta: i32) -> GameEvent {
        let current = self.values.get(&faction_id).copied().unwrap_or(0);
        let new_value = clamp_reputation(current + delta);
        self.values.insert(faction_id, new_value);
        GameEvent::ReputationChanged {
            faction_id,
            delta,
            new_value,
        }
    }
}

pub(crate) fn phase_changed(state: &GameState, to: GamePhase) -> GameEvent {
    GameEvent::PhaseChanged {
        from: state.current_phase,
        to,
    }
}

fn ensure_in_progress(state: &GameState) -> Result<(), RuleError> {
    if !state.is_in_progress() {
        return Err(RuleError::GameNotInProgress);
    }
    Ok(())
}

fn ensure_phase(state: &GameState, expected: &[GamePhase]) -> Result<(), RuleError> {
    ensure_in_progress(state)?;
    if !expected.contains(&state.current_phase) {
        return Err(RuleError::InvalidPhase {
            expected: expected.to_vec(),
            actual: state.current_phase,
        });
    }
    Ok(())
}

fn active_quest(state: &GameState) -> Result<&ActiveQuest, RuleError> {
    state.active_quest.as_ref().ok_or(RuleError::NoActiveQuest)
}

fn ensure_battle_roster(state: &GameState) -> Result<(), RuleError> {
    let available = state.owned_cards.len();
    if available < MIN_CARDS_FOR_BATTLE {
        return Err(RuleError::InsufficientCards {
            required: MIN_CARDS_FOR_BATTLE,
            available,
        });
    }
    Ok(())
}

fn content_missing(what: impl Into<String>) -> RuleError {
    RuleError::ContentMissing { what: what.into() }
}

pub struct RuleEngine<C = &'static Catalog> {
    content: C,
    rng: CombatRng,
    config: EngineConfig,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::with_content(builtin())
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ContentCatalog> RuleEngine<C> {
    pub fn with_content(content: C) -> Self {
        Self {
            content,
            rng: CombatRng::default(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = CombatRng::seeded(seed);
        self
    }

    /// `None` 恢复非确定的随机源。
    pub fn set_rng_seed(&mut self, seed: Option<u64>) {
        self.rng.set_seed(seed);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn decide(
        &mut self,
        command: &GameCommand,
        state: &GameState,
        timestamp: Timestamp,
    ) -> Result<Vec<GameEvent>, RuleError> {
        let result = match command {
            GameCommand::StartGame { player_id } => self.start_game(state, player_id, timestamp),
            GameCommand::AcceptQuest { quest_id } => self.accept_quest(state, quest_id, timestamp),
            GameCommand::MakeChoice {
                choice_id,
                dilemma_id,
            } => self.make_choice(state, choice_id, dilemma_id.as_deref(), timestamp),
            GameCommand::FormAlliance { faction_id } => self.form_alliance(state, *faction_id),
            GameCommand::FinalizeAlliances {} => self.finalize_alliances(state),
            GameCommand::DeclineAllAlliances {} => self.decline_all_alliances(state),
            GameCommand::LeanTowardFaction { faction_id } => self.lean_toward_faction(state, *faction_id),
            GameCommand::RefuseToLean {} => self.refuse_to_lean(state),
            GameCommand::AcceptCompromise {} => self.accept_compromise(state),
            GameCommand::SelectCard { card_id } => self.select_card(state, card_id),
            GameCommand::DeselectCard { card_id } => self.deselect_card(state, card_id),
            GameCommand::CommitFleet { card_ids } => self.commit_fleet(state, card_ids),
            GameCommand::SetCardPosition { card_id, position } => {
                self.set_card_position(state, card_id, *position)
            }
            GameCommand::LockOrders {} => self.lock_orders(state),
            GameCommand::DeployShip { card_id, slot } => self.deploy_ship(state, card_id, *slot),
            GameCommand::MoveShip { from_slot, to_slot } => self.move_ship(state, *from_slot, *to_slot),
            GameCommand::Attack {
                attacker_slot,
                target,
            } => self.attack(state, *attacker_slot, *target),
            GameCommand::ActivateAbility {
                slot,
                ability_index,
            } => self.activate_ability(state, *slot, *ability_index),
            GameCommand::EndTurn {} => self.end_turn(state),
            GameCommand::Retreat {} => self.retreat(state),
            GameCommand::AcknowledgeOutcome {} => self.acknowledge_outcome(state),
            GameCommand::AbandonQuest {} => self.abandon_quest(state),
            GameCommand::Continue {} => self.continue_game(state, timestamp),
        };

        match &result {
            Ok(events) => log::debug!(
                "{} accepted with {} event(s)",
                command.command_type(),
                events.len()
            ),
            Err(error) => log::debug!("{} rejected: {}", command.command_type(), error),
        }
        result
    }

    fn quest_definition(&self, quest_id: &str) -> Result<&QuestDefinition, RuleError> {
        self.content
            .get_quest_by_id(quest_id)
            .ok_or_else(|| RuleError::UnknownQuest {
                quest_id: quest_id.to_string(),
            })
    }

    /// 未拥有的卡才产生 `CARD_GAINED`。
    fn card_gained(
        &self,
        state: &GameState,
        card_id: &str,
        source: CardSource,
    ) -> Result<Option<GameEvent>, RuleError> {
        if state.owns_card(card_id) {
            return Ok(None);
        }
        let definition = self
            .content
            .get_card_by_id(card_id)
            .ok_or_else(|| content_missing(format!("card {card_id}")))?;
        Ok(Some(GameEvent::CardGained {
            card: definition.to_owned_card(source),
        }))
    }

    /// 开始经典对决：`BATTLE_STARTED` 并进入选牌阶段。
    fn start_battle(&self, state: &GameState, quest: &ActiveQuest) -> Result<Vec<GameEvent>, RuleError> {
        ensure_battle_roster(state)?;
        let definition = self.quest_definition(&quest.quest_id)?;
        let battle_id = format!(
            "{}-battle-{}",
            quest.quest_id,
            state.stats.battles_fought() + 1
        );
        Ok(vec![
            GameEvent::BattleStarted {
                battle_id,
                quest_id: quest.quest_id.clone(),
                opponent_faction: definition.opponent_faction,
            },
            phase_changed(state, GamePhase::CardSelection),
        ])
    }

    fn complete_quest(state: &GameState, quest_id: &str, outcome: QuestOutcome, to: GamePhase) -> Vec<GameEvent> {
        vec![
            GameEvent::QuestCompleted {
                quest_id: quest_id.to_string(),
                outcome,
            },
            phase_changed(state, to),
        ]
    }
}

/// 决策结果与应用后的状态，供 UI 一次取回。
#[derive(Debug, Clone, Serialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        Self { state, events }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::game::projection::{apply_event, initial_state};

    pub(crate) fn engine() -> RuleEngine {
        RuleEngine::new().with_seed(12345)
    }

    /// 决策并立即折叠，返回产生的事件。
    pub(crate) fn run(
        engine: &mut RuleEngine,
        state: &mut GameState,
        command: GameCommand,
    ) -> Result<Vec<GameEvent>, RuleError> {
        let events = engine.decide(&command, state, 1_000)?;
        for event in &events {
            apply_event(state, event);
        }
        Ok(events)
    }

    pub(crate) fn started() -> (RuleEngine, GameState) {
        let mut engine = engine();
        let mut state = initial_state();
        run(
            &mut engine,
            &mut state,
            GameCommand::StartGame {
                player_id: "p1".into(),
            },
        )
        .expect("start should succeed");
        (engine, state)
    }

    #[test]
    fn rejection_reason_is_readable() {
        let error = RuleError::InvalidPhase {
            expected: vec![GamePhase::Narrative, GamePhase::Alliance],
            actual: GamePhase::QuestHub,
        };
        assert_eq!(
            error.reason(),
            "command not allowed during quest_hub; expected narrative or alliance"
        );
    }

    #[test]
    fn ledger_clamps_running_value() {
        let mut state = initial_state();
        state.set_reputation(FactionId::Ashfall, 95);
        let mut ledger = ReputationLedger::new(&state);
        let first = ledger.change(FactionId::Ashfall, 10);
        let second = ledger.change(FactionId::Ashfall, -20);
        assert!(matches!(first, GameEvent::ReputationChanged { new_value: 100, .. }));
        assert!(matches!(second, GameEvent::ReputationChanged { new_value: 80, .. }));
    }
}
