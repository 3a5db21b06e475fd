pub mod ai;
pub mod config;
pub mod game;
pub mod logging;
pub mod store;

use gloo_timers::future::TimeoutFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::{Date, Promise};

pub use config::{EngineConfig, TacticalConfig};
pub use game::{
    evolve, rebuild_state, resolve_battle, BattleCard, CombatRng, GameCommand, GameEvent, GamePhase,
    GameState, RuleEngine, RuleError, RuleResolution,
};
pub use store::{EventStore, GameSession, InMemoryEventStore, SessionError, StoredEvent};

use game::state::Timestamp;
use game::TacticalSim;

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    logging::init(level);
}

/// 拒绝原因在 JS 侧的形状：`{ "type": ..., "reason": ..., ...字段 }`。
#[derive(Serialize)]
struct Rejection<'a> {
    #[serde(flatten)]
    error: &'a RuleError,
    reason: String,
}

/// 统一用 JSON 兼容的序列化，BTreeMap 变成普通对象而不是 `Map`。
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    from_value(value).map_err(JsValue::from)
}

fn to_js_error(error: &RuleError) -> JsValue {
    let rejection = Rejection {
        error,
        reason: error.reason(),
    };
    to_js(&rejection).unwrap_or_else(|_| JsValue::from_str(&error.reason()))
}

fn session_to_js_error(error: SessionError) -> JsValue {
    match error {
        SessionError::Rejected(error) => to_js_error(&error),
        SessionError::Store(error) => serde_to_js_error(error),
    }
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn now() -> Timestamp {
    Date::now() as Timestamp
}

fn engine_with_seed(seed: Option<u32>) -> RuleEngine {
    let mut engine = RuleEngine::new();
    engine.set_rng_seed(seed.map(u64::from));
    engine
}

/// 浏览器侧的单人会话：内存事件流 + 规则引擎。
#[wasm_bindgen]
pub struct GameEngine {
    session: GameSession<InMemoryEventStore>,
    stream_id: String,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(stream_id: Option<String>, config_json: Option<String>) -> Result<GameEngine, JsValue> {
        let config = match config_json {
            Some(json) => EngineConfig::from_json(&json).map_err(serde_to_js_error)?,
            None => EngineConfig::default(),
        };
        let engine = RuleEngine::new().with_config(config);
        Ok(GameEngine {
            session: GameSession::new(InMemoryEventStore::new(), engine),
            stream_id: stream_id.unwrap_or_else(|| "local".to_string()),
        })
    }

    /// 执行一条命令，返回 `{ state, events }`。
    pub fn dispatch_json(&mut self, command_json: &str) -> Result<String, JsValue> {
        let command = GameCommand::from_json(command_json).map_err(serde_to_js_error)?;
        let resolution = self
            .session
            .handle(&self.stream_id, &command, now())
            .map_err(session_to_js_error)?;
        serde_json::to_string(&resolution).map_err(serde_to_js_error)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.state(&self.stream_id)).map_err(serde_to_js_error)
    }

    pub fn events_json(&self) -> Result<String, JsValue> {
        let records = self.session.store().read_all(&self.stream_id);
        serde_json::to_string(&records).map_err(serde_to_js_error)
    }

    /// 导入宿主保存的历史记录，返回重放后的状态。
    pub fn import_events_json(&mut self, records_json: &str) -> Result<String, JsValue> {
        let records: Vec<StoredEvent> = serde_json::from_str(records_json).map_err(serde_to_js_error)?;
        for record in records {
            self.session
                .store_mut()
                .push_raw(&self.stream_id, record)
                .map_err(serde_to_js_error)?;
        }
        self.state_json()
    }

    /// 传入种子使掷骰可复现；不传恢复随机。
    pub fn set_rng_seed(&mut self, seed: Option<u32>) {
        self.session.engine_mut().set_rng_seed(seed.map(u64::from));
    }

    /// 在副本上推演玩家结束回合后对手的动作，不写入事件流。用于 UI 播放对手动作。
    pub fn preview_opponent_turn(&self, delay_ms: Option<u32>) -> Promise {
        let battle = self.session.state(&self.stream_id).current_tactical_battle;
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let battle = battle.ok_or_else(|| to_js_error(&RuleError::NoActiveBattle))?;
            let mut sim = TacticalSim::new(battle);
            ai::end_player_turn(&mut sim).map_err(|error| to_js_error(&error))?;
            let json = serde_json::to_string(sim.events()).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 纯函数形式的决策：返回 `{ state, events }`，被拒绝时抛出 `{ type, reason }`。
#[wasm_bindgen(js_name = "decideCommand")]
pub fn decide_command(state: JsValue, command: JsValue, seed: Option<u32>) -> Result<JsValue, JsValue> {
    let state: GameState = from_js(state)?;
    let command: GameCommand = from_js(command)?;
    let mut engine = engine_with_seed(seed);
    match engine.decide(&command, &state, now()) {
        Ok(events) => {
            let next = game::fold_events(state, &events);
            to_js(&RuleResolution::new(next, events))
        }
        Err(error) => Err(to_js_error(&error)),
    }
}

#[wasm_bindgen(js_name = "rebuildState")]
pub fn rebuild_state_js(events: JsValue) -> Result<JsValue, JsValue> {
    let events: Vec<GameEvent> = from_js(events)?;
    to_js(&rebuild_state(&events))
}

#[wasm_bindgen(js_name = "evolveState")]
pub fn evolve_state(state: JsValue, event: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_js(state)?;
    let event: GameEvent = from_js(event)?;
    to_js(&evolve(state, &event))
}

/// 单独结算一场经典对决，便于 UI 预览或调试。
#[wasm_bindgen(js_name = "resolveClassicBattle")]
pub fn resolve_classic_battle(
    player_fleet: JsValue,
    opponent_fleet: JsValue,
    seed: Option<u32>,
) -> Result<JsValue, JsValue> {
    let player_fleet: Vec<BattleCard> = from_js(player_fleet)?;
    let opponent_fleet: Vec<BattleCard> = from_js(opponent_fleet)?;
    let mut rng = match seed {
        Some(seed) => CombatRng::seeded(u64::from(seed)),
        None => CombatRng::from_entropy(),
    };
    to_js(&resolve_battle(&player_fleet, &opponent_fleet, &mut rng))
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
