use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use super::{shutdown_requested, FeedStore};

/// Handle to the periodic refresh loop. Dropping it stops the loop.
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the loop to exit after a store shutdown.
    pub async fn join(mut self) {
        let _ = (&mut self.handle).await;
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl FeedStore {
    /// Refresh now, then on every poll interval until shutdown.
    pub fn start_polling(&self) -> Poller {
        let store = self.clone();
        let period = self.settings().poll_interval();
        let shutdown = self.shutdown_signal();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let stop = shutdown_requested(shutdown);
            tokio::pin!(stop);

            info!(interval_secs = period.as_secs(), "Polling started");
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop => break,
                    _ = async {
                        ticker.tick().await;
                        let _ = store.refresh().await;
                    } => {}
                }
            }
            info!("Polling stopped");
        });

        Poller { handle }
    }
}
