//! 对手 AI：确定性的规则式策略，以及对手舰队生成。

pub mod fleet;
pub mod opponent;

pub use fleet::{generate_opponent_fleet, opponent_combatant, player_combatant};
pub use opponent::{choose_target, end_player_turn, next_action, take_turn, OpponentAction, DEPLOY_PREFERENCE};
