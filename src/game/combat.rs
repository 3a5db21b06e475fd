//! 经典对决：五回合掷骰结算。

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::state::CardId;

pub const ROUNDS_PER_BATTLE: usize = 5;
pub const DIE_SIDES: u32 = 20;
pub const BASE_DEFENSE: i32 = 10;

/// 可设种子的战斗随机源，通过参数传递而不是全局状态。
#[derive(Debug, Clone)]
pub struct CombatRng {
    rng: SmallRng,
}

impl CombatRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// `Some(seed)` 重新播种；`None` 回到非确定的熵源。
    pub fn set_seed(&mut self, seed: Option<u64>) {
        *self = match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        };
    }

    pub fn roll_d20(&mut self) -> u32 {
        self.rng.gen_range(1..=DIE_SIDES)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

impl Default for CombatRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// 参与经典对决的舰船数据。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleCard {
    pub card_id: CardId,
    pub name: String,
    pub attack: i32,
    pub armor: i32,
    pub agility: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Initiative {
    Player,
    Opponent,
    Simultaneous,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoundWinner {
    Player,
    Opponent,
    Draw,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Draw,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrikeRoll {
    pub natural: u32,
    pub total: i32,
    pub target: i32,
    pub hit: bool,
}

impl StrikeRoll {
    fn margin(&self) -> i32 {
        self.total - self.target
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundResult {
    pub round: u32,
    pub player_card_id: CardId,
    pub opponent_card_id: CardId,
    pub initiative: Initiative,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_strike: Option<StrikeRoll>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_strike: Option<StrikeRoll>,
    pub winner: RoundWinner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleResult {
    pub rounds: Vec<RoundResult>,
    pub outcome: BattleOutcome,
    pub player_wins: u32,
    pub opponent_wins: u32,
    pub draws: u32,
}

fn strike(attacker: &BattleCard, defender: &BattleCard, rng: &mut CombatRng) -> StrikeRoll {
    let natural = rng.roll_d20();
    let total = natural as i32 + attacker.attack;
    let target = BASE_DEFENSE + defender.armor;
    StrikeRoll {
        natural,
        total,
        target,
        hit: total >= target,
    }
}

pub fn resolve_round(
    round: u32,
    player: &BattleCard,
    opponent: &BattleCard,
    rng: &mut CombatRng,
) -> RoundResult {
    let initiative = match player.agility.cmp(&opponent.agility) {
        std::cmp::Ordering::Greater => Initiative::Player,
        std::cmp::Ordering::Less => Initiative::Opponent,
        std::cmp::Ordering::Equal => Initiative::Simultaneous,
    };

    let (player_strike, opponent_strike, winner) = match initiative {
        Initiative::Player => {
            let first = strike(player, opponent, rng);
            if first.hit {
                (Some(first), None, RoundWinner::Player)
            } else {
                let answer = strike(opponent, player, rng);
                let winner = if answer.hit {
                    RoundWinner::Opponent
                } else {
                    RoundWinner::Draw
                };
                (Some(first), Some(answer), winner)
            }
        }
        Initiative::Opponent => {
            let first = strike(opponent, player, rng);
            if first.hit {
                (None, Some(first), RoundWinner::Opponent)
            } else {
                let answer = strike(player, opponent, rng);
                let winner = if answer.hit {
                    RoundWinner::Player
                } else {
                    RoundWinner::Draw
                };
                (Some(answer), Some(first), winner)
            }
        }
        Initiative::Simultaneous => {
            let ours = strike(player, opponent, rng);
            let theirs = strike(opponent, player, rng);
            let winner = match (ours.hit, theirs.hit) {
                (true, false) => RoundWinner::Player,
                (false, true) => RoundWinner::Opponent,
                (false, false) => RoundWinner::Draw,
                (true, true) => match ours.margin().cmp(&theirs.margin()) {
                    std::cmp::Ordering::Greater => RoundWinner::Player,
                    std::cmp::Ordering::Less => RoundWinner::Opponent,
                    std::cmp::Ordering::Equal => RoundWinner::Draw,
                },
            };
            (Some(ours), Some(theirs), winner)
        }
    };

    RoundResult {
        round,
        player_card_id: player.card_id.clone(),
        opponent_card_id: opponent.card_id.clone(),
        initiative,
        player_strike,
        opponent_strike,
        winner,
    }
}

/// 按位置两两配对结算五回合，多数胜出者赢得战斗。未配对的位置不参与结算。
pub fn resolve_battle(
    player_fleet: &[BattleCard],
    opponent_fleet: &[BattleCard],
    rng: &mut CombatRng,
) -> BattleResult {
    let rounds: Vec<RoundResult> = player_fleet
        .iter()
        .zip(opponent_fleet.iter())
        .take(ROUNDS_PER_BATTLE)
        .enumerate()
        .map(|(index, (player, opponent))| resolve_round(index as u32 + 1, player, opponent, rng))
        .collect();

    let (player_wins, opponent_wins, draws) = tally_rounds(&rounds);
    BattleResult {
        rounds,
        outcome: outcome_from_tally(player_wins, opponent_wins),
        player_wins,
        opponent_wins,
        draws,
    }
}

pub fn tally_rounds(rounds: &[RoundResult]) -> (u32, u32, u32) {
    rounds
        .iter()
        .fold((0, 0, 0), |(wins, losses, draws), round| match round.winner {
            RoundWinner::Player => (wins + 1, losses, draws),
            RoundWinner::Opponent => (wins, losses + 1, draws),
            RoundWinner::Draw => (wins, losses, draws + 1),
        })
}

pub fn outcome_from_tally(player_wins: u32, opponent_wins: u32) -> BattleOutcome {
    match player_wins.cmp(&opponent_wins) {
        std::cmp::Ordering::Greater => BattleOutcome::Victory,
        std::cmp::Ordering::Less => BattleOutcome::Defeat,
        std::cmp::Ordering::Equal => BattleOutcome::Draw,
    }
}
