use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use super::{SessionBackend, SessionStore};

/// Periodic background eviction of expired sessions.
pub struct SessionSweeper;

impl SessionSweeper {
    /// Spawn the sweep loop on the current tokio runtime.
    ///
    /// The first sweep runs immediately, then once per `interval`. Ticks
    /// missed while a sweep was running are skipped, not replayed.
    pub fn spawn<B>(store: Arc<SessionStore<B>>, interval: Duration) -> SweeperHandle
    where
        B: SessionBackend + 'static,
    {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();

        let join = tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "session sweeper started");

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = signal.notified() => {
                        info!("session sweeper received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        store.purge_expired();
                    }
                }
            }
        });

        SweeperHandle { shutdown, join }
    }
}

/// Handle to a running sweeper.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: Arc<Notify>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.join.await;
    }
}
