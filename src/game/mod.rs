//! 游戏核心逻辑模块（命令决策、事件投影、战斗结算等）。

pub mod combat;
pub mod commands;
pub mod content;
pub mod endings;
pub mod events;
pub mod projection;
pub mod reputation;
pub mod rules;
pub mod state;
pub mod tactical;

pub use combat::{resolve_battle, BattleCard, BattleOutcome, BattleResult, CombatRng, RoundResult};
pub use commands::GameCommand;
pub use content::{builtin, Catalog, ContentCatalog};
pub use endings::{evaluate_ending, Ending};
pub use events::GameEvent;
pub use projection::{evolve, fold_events, initial_state, rebuild_state};
pub use reputation::{FactionId, ReputationStatus};
pub use rules::{RuleEngine, RuleError, RuleResolution};
pub use state::{CardId, GamePhase, GameState, GameStatus, Side, TargetRef, Timestamp};
pub use tactical::TacticalSim;
