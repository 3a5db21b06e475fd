use std::collections::BTreeMap;

use super::{EventStore, Snapshot, SnapshotStore, StoreError, StoredEvent};
use crate::game::events::GameEvent;
use crate::game::state::Timestamp;

/// 进程内的事件存储，供宿主（浏览器）和测试使用。
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    streams: BTreeMap<String, Vec<StoredEvent>>,
    snapshots: BTreeMap<String, Snapshot>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 原样写入一条记录（例如从宿主导入的历史流），序号必须紧接当前末尾。
    pub fn push_raw(&mut self, stream_id: &str, record: StoredEvent) -> Result<(), StoreError> {
        let stream = self.streams.entry(stream_id.to_string()).or_default();
        let expected = stream.last().map(|last| last.sequence).unwrap_or(0) + 1;
        if record.sequence != expected {
            return Err(StoreError::SequenceConflict {
                stream_id: stream_id.to_string(),
                expected,
                actual: record.sequence,
            });
        }
        stream.push(record);
        Ok(())
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&mut self, stream_id: &str, events: &[GameEvent], timestamp: Timestamp) -> Result<u64, StoreError> {
        let mut sequence = self.last_sequence(stream_id);
        // 先全部编码，任何一条失败都不写入
        let records = events
            .iter()
            .map(|event| {
                sequence += 1;
                StoredEvent::from_event(sequence, event, timestamp)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.streams
            .entry(stream_id.to_string())
            .or_default()
            .extend(records);
        Ok(sequence)
    }

    fn read_all(&self, stream_id: &str) -> Vec<StoredEvent> {
        self.streams.get(stream_id).cloned().unwrap_or_default()
    }

    fn read_from(&self, stream_id: &str, after: u64) -> Vec<StoredEvent> {
        self.streams
            .get(stream_id)
            .map(|stream| {
                stream
                    .iter()
                    .filter(|record| record.sequence > after)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn last_sequence(&self, stream_id: &str) -> u64 {
        self.streams
            .get(stream_id)
            .and_then(|stream| stream.last())
            .map(|record| record.sequence)
            .unwrap_or(0)
    }
}

impl SnapshotStore for InMemoryEventStore {
    fn load_snapshot(&self, stream_id: &str) -> Option<Snapshot> {
        self.snapshots.get(stream_id).cloned()
    }

    fn save_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.insert(snapshot.stream_id.clone(), snapshot);
    }
}
