//! Graceful shutdown.
//!
//! The coordinator moves forward through `Running -> Draining -> Stopped`:
//!
//! - `Running`: requests are accepted.
//! - `Draining`: shutdown was triggered (signal or operator). The server stops
//!   accepting connections, handlers reject new work, in-flight requests finish.
//! - `Stopped`: the final flush was attempted, the process can exit.
//!
//! The final flush is attempted at most once and never retried.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    error::{IngestorError, Result},
    flusher::{FlushResult, Flusher},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownState {
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Clone)]
pub struct ShutdownCoordinator {
    state: Arc<watch::Sender<ShutdownState>>,
    final_flush_started: Arc<AtomicBool>,
    ct: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a coordinator that starts draining when `ct` is cancelled.
    pub fn new(ct: CancellationToken) -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        Self {
            state: Arc::new(state),
            final_flush_started: Arc::new(AtomicBool::new(false)),
            ct,
        }
    }

    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    /// Whether new requests should be served.
    ///
    /// Only `Running` accepts work. Cancellation of the token counts as draining
    /// even before `draining` observed it.
    pub fn is_accepting(&self) -> bool {
        self.state() == ShutdownState::Running && !self.ct.is_cancelled()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.ct
    }

    /// Operator-initiated stop.
    pub fn trigger(&self) {
        self.advance(ShutdownState::Draining);
        self.ct.cancel();
    }

    /// Resolves when shutdown is triggered, after switching to `Draining`.
    ///
    /// Meant as the graceful shutdown signal of the HTTP server.
    pub async fn draining(self) {
        self.ct.cancelled().await;
        if self.advance(ShutdownState::Draining) {
            info!("shutdown triggered, no longer accepting requests");
        }
    }

    /// Run the final flush and move to `Stopped`.
    ///
    /// Call once the server no longer accepts requests. Only the first call
    /// flushes; later calls return an empty result. A failed flush is returned
    /// as [`IngestorError::ShutdownFlush`]: the events are lost.
    pub async fn finish(&self, flusher: &Flusher) -> Result<FlushResult> {
        self.trigger();

        if self.final_flush_started.swap(true, Ordering::AcqRel) {
            return Ok(FlushResult::empty());
        }

        let result = if flusher.buffer().is_empty() {
            Ok(FlushResult::empty())
        } else {
            info!(
                count = flusher.buffer().size(),
                "flushing buffered events before exit"
            );
            flusher.flush().await.map_err(|err| match err {
                IngestorError::Persistence { key, count, source } => {
                    warn!(count, key = %key, "final flush failed, events will be lost");
                    IngestorError::ShutdownFlush { key, count, source }
                }
                other => other,
            })
        };

        self.advance(ShutdownState::Stopped);
        result
    }

    fn advance(&self, next: ShutdownState) -> bool {
        self.state.send_if_modified(|state| {
            if *state < next {
                *state = next;
                true
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        buffer::BatchBuffer,
        test_utils::{RecordingBlobStore, record},
    };

    fn flusher_with(store: &Arc<RecordingBlobStore>) -> Flusher {
        Flusher::new_timestamped(BatchBuffer::new(), store.clone())
    }

    #[test]
    fn test_states_are_ordered() {
        assert!(ShutdownState::Running < ShutdownState::Draining);
        assert!(ShutdownState::Draining < ShutdownState::Stopped);
        assert_eq!(ShutdownState::Draining.to_string(), "draining");
    }

    #[tokio::test]
    async fn test_trigger_moves_to_draining() {
        let coordinator = ShutdownCoordinator::new(CancellationToken::new());
        assert!(coordinator.is_accepting());

        coordinator.trigger();

        assert_eq!(coordinator.state(), ShutdownState::Draining);
        assert!(!coordinator.is_accepting());
        assert!(coordinator.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_draining_resolves_on_cancellation() {
        let ct = CancellationToken::new();
        let coordinator = ShutdownCoordinator::new(ct.clone());
        let mut states = coordinator.subscribe();

        let draining = tokio::spawn(coordinator.clone().draining());
        ct.cancel();
        draining.await.unwrap();

        assert_eq!(coordinator.state(), ShutdownState::Draining);
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ShutdownState::Draining);
    }

    #[tokio::test]
    async fn test_finish_flushes_buffered_events_once() {
        let store = Arc::new(RecordingBlobStore::new());
        let flusher = flusher_with(&store);
        flusher.buffer().append(record("a"));
        flusher.buffer().append(record("b"));
        let coordinator = ShutdownCoordinator::new(CancellationToken::new());

        let result = coordinator.finish(&flusher).await.unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(coordinator.state(), ShutdownState::Stopped);

        flusher.buffer().append(record("late"));
        let result = coordinator.finish(&flusher).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(store.attempts(), 1);
    }

    #[tokio::test]
    async fn test_finish_with_empty_buffer_skips_store() {
        let store = Arc::new(RecordingBlobStore::new());
        let flusher = flusher_with(&store);
        let coordinator = ShutdownCoordinator::new(CancellationToken::new());

        let result = coordinator.finish(&flusher).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(store.attempts(), 0);
        assert_eq!(coordinator.state(), ShutdownState::Stopped);
    }

    #[tokio::test]
    async fn test_failed_final_flush_is_not_retried() {
        let store = Arc::new(RecordingBlobStore::new());
        store.set_failing(true);
        store.set_delay(Some(Duration::from_millis(10)));
        let flusher = flusher_with(&store);
        flusher.buffer().append(record("a"));
        let coordinator = ShutdownCoordinator::new(CancellationToken::new());

        let err = coordinator.finish(&flusher).await.unwrap_err();

        assert!(matches!(err, IngestorError::ShutdownFlush { count: 1, .. }));
        assert_eq!(store.attempts(), 1);
        assert_eq!(coordinator.state(), ShutdownState::Stopped);
    }
}
