use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::combat::{BattleCard, BattleOutcome, RoundResult};
use super::reputation::{clamp_reputation, FactionId, ReputationStatus};

/// 卡牌标识（内容表中的字符串 id）。
pub type CardId = String;
pub type QuestId = String;
pub type DilemmaId = String;
pub type ChoiceId = String;
pub type BattleId = String;
/// 毫秒时间戳，由调用方提供。
pub type Timestamp = u64;

pub const BATTLEFIELD_SLOTS: usize = 5;
pub const FLEET_SIZE: usize = 5;
pub const MIN_CARDS_FOR_BATTLE: usize = 5;
pub const MAX_HAND_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    NotStarted,
    InProgress,
    Ended,
}

/// 游戏阶段。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    NotStarted,
    QuestHub,
    Narrative,
    ChoiceConsequence,
    Alliance,
    Mediation,
    CardSelection,
    Deployment,
    Battle,
    TacticalBattle,
    PostBattle,
    Consequence,
    Ending,
}

impl GamePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::NotStarted => "not_started",
            GamePhase::QuestHub => "quest_hub",
            GamePhase::Narrative => "narrative",
            GamePhase::ChoiceConsequence => "choice_consequence",
            GamePhase::Alliance => "alliance",
            GamePhase::Mediation => "mediation",
            GamePhase::CardSelection => "card_selection",
            GamePhase::Deployment => "deployment",
            GamePhase::Battle => "battle",
            GamePhase::TacticalBattle => "tactical_battle",
            GamePhase::PostBattle => "post_battle",
            GamePhase::Consequence => "consequence",
            GamePhase::Ending => "ending",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardSource {
    Starter,
    Quest,
    Alliance,
    Choice,
    Unlock,
}

/// 战术战斗中舰船可主动触发的能力。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShipAbility {
    Repair { amount: i32, energy_cost: u32 },
    Barrage { damage: i32, energy_cost: u32 },
    Overcharge { energy: u32, energy_cost: u32 },
}

impl ShipAbility {
    pub fn energy_cost(&self) -> u32 {
        match self {
            ShipAbility::Repair { energy_cost, .. }
            | ShipAbility::Barrage { energy_cost, .. }
            | ShipAbility::Overcharge { energy_cost, .. } => *energy_cost,
        }
    }
}

/// 玩家拥有的舰船卡。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnedCard {
    pub id: CardId,
    pub name: String,
    pub attack: i32,
    pub armor: i32,
    pub agility: i32,
    pub hull: i32,
    pub energy_cost: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<ShipAbility>,
    pub source: CardSource,
    #[serde(default)]
    pub is_locked: bool,
}

impl OwnedCard {
    pub fn to_battle_card(&self) -> BattleCard {
        BattleCard {
            card_id: self.id.clone(),
            name: self.name.clone(),
            attack: self.attack,
            armor: self.armor,
            agility: self.agility,
        }
    }

    pub fn to_tactical_card(&self) -> TacticalCard {
        TacticalCard {
            card_id: self.id.clone(),
            name: self.name.clone(),
            attack: self.attack,
            armor: self.armor,
            hull: self.hull,
            energy_cost: self.energy_cost,
            abilities: self.abilities.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alliance {
    pub faction_id: FactionId,
    pub bounty_share: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediationState {
    pub parties: Vec<FactionId>,
    #[serde(default)]
    pub leaned_toward: Option<FactionId>,
    #[serde(default)]
    pub refused: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestOutcome {
    Victory,
    Defeat,
    Draw,
    Compromise,
    Peaceful,
    Abandoned,
}

/// 当前进行中的任务。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveQuest {
    pub quest_id: QuestId,
    pub faction_id: FactionId,
    #[serde(default)]
    pub current_dilemma_id: Option<DilemmaId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dilemmas_completed: Vec<DilemmaId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices_made: Vec<ChoiceId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alliances: Vec<Alliance>,
    #[serde(default)]
    pub alliances_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mediation: Option<MediationState>,
}

impl ActiveQuest {
    pub fn new(quest_id: QuestId, faction_id: FactionId) -> Self {
        Self {
            quest_id,
            faction_id,
            current_dilemma_id: None,
            dilemmas_completed: Vec::new(),
            choices_made: Vec::new(),
            alliances: Vec::new(),
            alliances_closed: false,
            mediation: None,
        }
    }

    pub fn is_allied_with(&self, faction_id: FactionId) -> bool {
        self.alliances
            .iter()
            .any(|alliance| alliance.faction_id == faction_id)
    }
}

/// 经典对决的进行状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleState {
    pub battle_id: BattleId,
    pub quest_id: QuestId,
    pub opponent_faction: FactionId,
    #[serde(default)]
    pub selected_card_ids: Vec<CardId>,
    #[serde(default)]
    pub committed: bool,
    #[serde(default)]
    pub positions: [Option<CardId>; FLEET_SIZE],
    #[serde(default)]
    pub orders_locked: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opponent_fleet: Vec<BattleCard>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rounds: Vec<RoundResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<BattleOutcome>,
    #[serde(default)]
    pub player_wins: u32,
    #[serde(default)]
    pub opponent_wins: u32,
    #[serde(default)]
    pub draws: u32,
    #[serde(default)]
    pub acknowledged: bool,
}

impl BattleState {
    pub fn new(battle_id: BattleId, quest_id: QuestId, opponent_faction: FactionId) -> Self {
        Self {
            battle_id,
            quest_id,
            opponent_faction,
            selected_card_ids: Vec::new(),
            committed: false,
            positions: Default::default(),
            orders_locked: false,
            opponent_fleet: Vec::new(),
            rounds: Vec::new(),
            outcome: None,
            player_wins: 0,
            opponent_wins: 0,
            draws: 0,
            acknowledged: false,
        }
    }

    pub fn position_of(&self, card_id: &str) -> Option<usize> {
        self.positions
            .iter()
            .position(|slot| slot.as_deref() == Some(card_id))
    }

    pub fn positions_filled(&self) -> usize {
        self.positions.iter().filter(|slot| slot.is_some()).count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetRef {
    Ship { slot: usize },
    Flagship,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VictoryCondition {
    FlagshipDestroyed,
    FleetEliminated,
    Timeout,
    Retreat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TacticalOutcome {
    pub winner: Option<Side>,
    pub victory_condition: VictoryCondition,
}

impl TacticalOutcome {
    pub fn battle_outcome(&self) -> BattleOutcome {
        match self.winner {
            Some(Side::Player) => BattleOutcome::Victory,
            Some(Side::Opponent) => BattleOutcome::Defeat,
            None => BattleOutcome::Draw,
        }
    }
}

/// 手牌或牌库中的战术卡。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TacticalCard {
    pub card_id: CardId,
    pub name: String,
    pub attack: i32,
    pub armor: i32,
    pub hull: i32,
    pub energy_cost: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<ShipAbility>,
}

/// 部署在战场上的舰船。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShipState {
    pub card_id: CardId,
    pub name: String,
    pub attack: i32,
    pub armor: i32,
    pub hull: i32,
    pub max_hull: i32,
    #[serde(default)]
    pub exhausted: bool,
    #[serde(default)]
    pub ability_used: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<ShipAbility>,
}

impl ShipState {
    /// 新部署的舰船本回合不能行动。
    pub fn deployed(card: &TacticalCard) -> Self {
        Self {
            card_id: card.card_id.clone(),
            name: card.name.clone(),
            attack: card.attack,
            armor: card.armor,
            hull: card.hull,
            max_hull: card.hull,
            exhausted: true,
            ability_used: false,
            abilities: card.abilities.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnergyPool {
    pub current: u32,
    pub maximum: u32,
    pub regeneration: u32,
}

impl EnergyPool {
    /// 回合开始时实际可恢复的能量（不超过上限）。
    pub fn pending_regeneration(&self) -> u32 {
        self.regeneration
            .min(self.maximum.saturating_sub(self.current))
    }

    pub fn gain(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.maximum);
    }

    pub fn spend(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }
}

/// 战术战斗中一方的全部资源。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CombatantState {
    pub flagship_hull: i32,
    pub flagship_max_hull: i32,
    #[serde(default)]
    pub battlefield: [Option<ShipState>; BATTLEFIELD_SLOTS],
    #[serde(default)]
    pub hand: Vec<TacticalCard>,
    #[serde(default)]
    pub deck: Vec<TacticalCard>,
    pub energy: EnergyPool,
}

impl CombatantState {
    pub fn ship(&self, slot: usize) -> Option<&ShipState> {
        self.battlefield.get(slot).and_then(Option::as_ref)
    }

    pub fn ship_mut(&mut self, slot: usize) -> Option<&mut ShipState> {
        self.battlefield.get_mut(slot).and_then(Option::as_mut)
    }

    pub fn ships(&self) -> impl Iterator<Item = (usize, &ShipState)> {
        self.battlefield
            .iter()
            .enumerate()
            .filter_map(|(slot, ship)| ship.as_ref().map(|ship| (slot, ship)))
    }

    pub fn has_ships(&self) -> bool {
        self.battlefield.iter().any(Option::is_some)
    }

    pub fn total_ship_hull(&self) -> i32 {
        self.ships().map(|(_, ship)| ship.hull).sum()
    }

    /// 战场、手牌、牌库全部耗尽。
    pub fn is_eliminated(&self) -> bool {
        !self.has_ships() && self.hand.is_empty() && self.deck.is_empty()
    }

    pub fn flagship_destroyed(&self) -> bool {
        self.flagship_hull <= 0
    }

    pub fn hand_index(&self, card_id: &str) -> Option<usize> {
        self.hand.iter().position(|card| card.card_id == card_id)
    }
}

/// 回合制战术战斗。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TacticalBattleState {
    pub battle_id: BattleId,
    pub quest_id: QuestId,
    pub turn_number: u32,
    pub active_player: Side,
    pub round_limit: u32,
    pub move_cost: u32,
    pub player: CombatantState,
    pub opponent: CombatantState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TacticalOutcome>,
}

impl TacticalBattleState {
    pub fn combatant(&self, side: Side) -> &CombatantState {
        match side {
            Side::Player => &self.player,
            Side::Opponent => &self.opponent,
        }
    }

    pub fn combatant_mut(&mut self, side: Side) -> &mut CombatantState {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.opponent,
        }
    }

    /// 一轮 = 玩家与对手各行动一次：`ceil((turn + 1) / 2)`。
    pub fn round(&self) -> u32 {
        round_for_turn(self.turn_number)
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

pub fn round_for_turn(turn_number: u32) -> u32 {
    (turn_number + 2) / 2
}

/// 结局评估所需的累计统计。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GameStats {
    pub quests_completed: u32,
    pub quests_failed: u32,
    pub battles_won: u32,
    pub battles_lost: u32,
    pub battles_drawn: u32,
    pub alliances_formed: u32,
    pub choices_made: u32,
    pub cards_lost: u32,
    pub compromises: u32,
    pub bounty_earned: u32,
}

impl GameStats {
    pub fn battles_fought(&self) -> u32 {
        self.battles_won + self.battles_lost + self.battles_drawn
    }

    pub fn record_battle(&mut self, outcome: BattleOutcome) {
        match outcome {
            BattleOutcome::Victory => self.battles_won += 1,
            BattleOutcome::Defeat => self.battles_lost += 1,
            BattleOutcome::Draw => self.battles_drawn += 1,
        }
    }
}

/// 游戏整体状态，只能通过折叠事件得到。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub game_status: GameStatus,
    pub current_phase: GamePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    pub reputation: BTreeMap<FactionId, i32>,
    #[serde(default)]
    pub owned_cards: Vec<OwnedCard>,
    #[serde(default)]
    pub available_quests: Vec<QuestId>,
    #[serde(default)]
    pub completed_quests: Vec<QuestId>,
    #[serde(default)]
    pub failed_quests: Vec<QuestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_quest: Option<ActiveQuest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_battle: Option<BattleState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_tactical_battle: Option<TacticalBattleState>,
    #[serde(default)]
    pub bounty: u32,
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    #[serde(default)]
    pub stats: GameStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<Timestamp>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            game_status: GameStatus::NotStarted,
            current_phase: GamePhase::NotStarted,
            player_id: None,
            reputation: FactionId::ALL
                .iter()
                .map(|faction| (*faction, 0))
                .collect(),
            owned_cards: Vec::new(),
            available_quests: Vec::new(),
            completed_quests: Vec::new(),
            failed_quests: Vec::new(),
            active_quest: None,
            current_battle: None,
            current_tactical_battle: None,
            bounty: 0,
            flags: BTreeMap::new(),
            stats: GameStats::default(),
            ending: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.game_status == GameStatus::InProgress
    }

    pub fn owned_card(&self, card_id: &str) -> Option<&OwnedCard> {
        self.owned_cards.iter().find(|card| card.id == card_id)
    }

    pub fn owns_card(&self, card_id: &str) -> bool {
        self.owned_card(card_id).is_some()
    }

    pub fn reputation_of(&self, faction_id: FactionId) -> i32 {
        self.reputation.get(&faction_id).copied().unwrap_or(0)
    }

    pub fn reputation_status(&self, faction_id: FactionId) -> ReputationStatus {
        ReputationStatus::from_value(self.reputation_of(faction_id))
    }

    pub fn set_reputation(&mut self, faction_id: FactionId, value: i32) {
        self.reputation.insert(faction_id, clamp_reputation(value));
    }

    pub fn is_quest_resolved(&self, quest_id: &str) -> bool {
        self.completed_quests.iter().any(|id| id == quest_id)
            || self.failed_quests.iter().any(|id| id == quest_id)
    }

    pub fn has_active_battle(&self) -> bool {
        self.current_battle.is_some() || self.current_tactical_battle.is_some()
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
