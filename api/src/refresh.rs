use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::AppState;

/// Periodic playback refresh, so the cache stays warm between client polls.
///
/// Owns the timer task; `stop` tears it down.
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn spawn(state: AppState, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_title: Option<String> = None;

            loop {
                ticker.tick().await;

                let spotify = state.spotify.clone();
                let status = state
                    .playback_cache
                    .get_or_refresh(|| async move { spotify.playback_status().await })
                    .await;

                if let Some(status) = status {
                    if status.title != last_title {
                        tracing::info!(
                            "playback changed: {}",
                            status.title.as_deref().unwrap_or("(nothing)")
                        );
                        last_title = status.title;
                    }
                }
            }
        });

        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}
