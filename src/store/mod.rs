//! 事件流的持久化约定：按流追加事件、读取、快照。
//!
//! 存储只保存 JSON 形式的记录；回放时无法识别或损坏的记录会被跳过。

mod memory;
mod session;

pub use memory::InMemoryEventStore;
pub use session::{GameSession, SessionError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::game::events::GameEvent;
use crate::game::projection::{apply_event, initial_state};
use crate::game::state::{GameState, Timestamp};

/// 快照中状态结构的版本，不一致时整条流重放。
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 50;

/// 自上次快照以来追加的事件数达到间隔时保存新快照；间隔为 0 时不保存。
pub fn should_create_snapshot(events_since_snapshot: u64, interval: u64) -> bool {
    interval > 0 && events_since_snapshot >= interval
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stream {stream_id} expected sequence {expected}, found {actual}")]
    SequenceConflict {
        stream_id: String,
        expected: u64,
        actual: u64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventMetadata {
    pub timestamp: Timestamp,
}

/// 流中的一条记录。`sequence` 从 1 开始连续递增。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredEvent {
    pub sequence: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
    pub metadata: EventMetadata,
}

impl StoredEvent {
    pub fn from_event(sequence: u64, event: &GameEvent, timestamp: Timestamp) -> Result<Self, StoreError> {
        let mut encoded = serde_json::to_value(event)?;
        let data = encoded
            .get_mut("data")
            .map(Value::take)
            .unwrap_or_else(|| Value::Object(Default::default()));
        Ok(Self {
            sequence,
            event_type: event.event_type().to_string(),
            data,
            metadata: EventMetadata { timestamp },
        })
    }

    /// 还原为领域事件。
    pub fn decode(&self) -> Result<GameEvent, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "type": self.event_type,
            "data": self.data,
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub stream_id: String,
    pub sequence: u64,
    pub schema_version: u32,
    pub state: Value,
}

impl Snapshot {
    pub fn capture(stream_id: &str, sequence: u64, state: &GameState) -> Result<Self, StoreError> {
        Ok(Self {
            stream_id: stream_id.to_string(),
            sequence,
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            state: serde_json::to_value(state)?,
        })
    }

    /// 版本不符或内容无法解析时返回 `None`。
    pub fn restore(&self) -> Option<GameState> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            log::debug!(
                "snapshot of {} has schema {}, expected {}",
                self.stream_id,
                self.schema_version,
                SNAPSHOT_SCHEMA_VERSION
            );
            return None;
        }
        match serde_json::from_value(self.state.clone()) {
            Ok(state) => Some(state),
            Err(error) => {
                log::warn!("snapshot of {} is unreadable: {error}", self.stream_id);
                None
            }
        }
    }
}

pub trait EventStore {
    /// 追加一批事件，返回最后一条的序号。
    fn append(&mut self, stream_id: &str, events: &[GameEvent], timestamp: Timestamp) -> Result<u64, StoreError>;

    fn read_all(&self, stream_id: &str) -> Vec<StoredEvent>;

    /// 序号大于 `after` 的记录。
    fn read_from(&self, stream_id: &str, after: u64) -> Vec<StoredEvent> {
        self.read_all(stream_id)
            .into_iter()
            .filter(|record| record.sequence > after)
            .collect()
    }

    fn last_sequence(&self, stream_id: &str) -> u64 {
        self.read_all(stream_id)
            .last()
            .map(|record| record.sequence)
            .unwrap_or(0)
    }
}

pub trait SnapshotStore {
    fn load_snapshot(&self, stream_id: &str) -> Option<Snapshot>;

    fn save_snapshot(&mut self, snapshot: Snapshot);
}

/// 逐条解码并折叠；未知类型记 debug，损坏记录记 warn，均跳过。
pub fn replay(state: GameState, records: &[StoredEvent]) -> GameState {
    records.iter().fold(state, |mut state, record| {
        if !GameEvent::is_known_type(&record.event_type) {
            log::debug!(
                "skipping unknown event type {} at sequence {}",
                record.event_type,
                record.sequence
            );
            return state;
        }
        match record.decode() {
            Ok(event) => apply_event(&mut state, &event),
            Err(error) => log::warn!(
                "skipping malformed {} at sequence {}: {error}",
                record.event_type,
                record.sequence
            ),
        }
        state
    })
}

/// 从最近的可用快照开始重放；没有快照或快照失效时从头重放。
/// 返回状态与流的最新序号。
pub fn load_state<S>(store: &S, stream_id: &str) -> (GameState, u64)
where
    S: EventStore + SnapshotStore,
{
    let restored = store
        .load_snapshot(stream_id)
        .and_then(|snapshot| snapshot.restore().map(|state| (state, snapshot.sequence)));
    let (base, after) = match restored {
        Some((state, sequence)) => {
            log::debug!("restoring {stream_id} from snapshot at {sequence}");
            (state, sequence)
        }
        None => (initial_state(), 0),
    };

    let records = store.read_from(stream_id, after);
    let sequence = records.last().map(|record| record.sequence).unwrap_or(after);
    (replay(base, &records), sequence)
}
