use thiserror::Error;

use super::{load_state, should_create_snapshot, EventStore, Snapshot, SnapshotStore, StoreError};
use crate::game::commands::GameCommand;
use crate::game::content::{Catalog, ContentCatalog};
use crate::game::projection::fold_events;
use crate::game::rules::{RuleEngine, RuleError, RuleResolution};
use crate::game::state::{GameState, Timestamp};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("command rejected: {0}")]
    Rejected(#[from] RuleError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 读状态、决策、追加事件。`handle` 需要 `&mut self`，同一条流同一时间只有一个写者。
pub struct GameSession<S, C = &'static Catalog> {
    store: S,
    engine: RuleEngine<C>,
}

impl<S, C> GameSession<S, C>
where
    S: EventStore + SnapshotStore,
    C: ContentCatalog,
{
    pub fn new(store: S, engine: RuleEngine<C>) -> Self {
        Self { store, engine }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn engine(&self) -> &RuleEngine<C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RuleEngine<C> {
        &mut self.engine
    }

    pub fn state(&self, stream_id: &str) -> GameState {
        load_state(&self.store, stream_id).0
    }

    /// 被拒绝的命令不会写入任何事件。
    pub fn handle(
        &mut self,
        stream_id: &str,
        command: &GameCommand,
        timestamp: Timestamp,
    ) -> Result<RuleResolution, SessionError> {
        let (state, _) = load_state(&self.store, stream_id);
        let events = self.engine.decide(command, &state, timestamp)?;
        let next = fold_events(state, &events);
        if events.is_empty() {
            return Ok(RuleResolution::new(next, events));
        }

        let sequence = self.store.append(stream_id, &events, timestamp)?;
        let interval = self.engine.config().snapshot_interval;
        let since_snapshot = sequence.saturating_sub(
            self.store
                .load_snapshot(stream_id)
                .map(|snapshot| snapshot.sequence)
                .unwrap_or(0),
        );
        if should_create_snapshot(since_snapshot, interval) {
            log::debug!("saving snapshot of {stream_id} at {sequence}");
            self.store
                .save_snapshot(Snapshot::capture(stream_id, sequence, &next)?);
        }
        Ok(RuleResolution::new(next, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::store::InMemoryEventStore;

    fn session(snapshot_interval: u64) -> GameSession<InMemoryEventStore> {
        let config = EngineConfig {
            snapshot_interval,
            ..EngineConfig::default()
        };
        GameSession::new(
            InMemoryEventStore::new(),
            RuleEngine::new().with_seed(7).with_config(config),
        )
    }

    fn start() -> GameCommand {
        GameCommand::StartGame {
            player_id: "p1".into(),
        }
    }

    #[test]
    fn rejected_command_appends_nothing() {
        let mut session = session(0);
        session.handle("s", &start(), 1).expect("start should succeed");
        let before = session.store().read_all("s");

        let result = session.handle("s", &start(), 2);
        assert!(matches!(
            result,
            Err(SessionError::Rejected(RuleError::GameAlreadyStarted))
        ));
        assert_eq!(session.store().read_all("s"), before);
    }

    #[test]
    fn snapshots_follow_interval() {
        let mut session = session(3);
        let resolution = session.handle("s", &start(), 1).expect("start should succeed");
        let snapshot = session
            .store()
            .load_snapshot("s")
            .expect("start emits enough events for a snapshot");
        assert_eq!(snapshot.sequence, resolution.events.len() as u64);
        assert_eq!(session.state("s"), resolution.state);
    }

    #[test]
    fn streams_are_independent() {
        let mut session = session(0);
        session.handle("a", &start(), 1).expect("start should succeed");
        assert!(session.state("a").is_in_progress());
        assert!(!session.state("b").is_in_progress());
    }
}
