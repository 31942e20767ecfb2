//! Background job: refetch page 1 of the notification list on a fixed interval.
//!
//! Spawned by `NotificationStore::start_polling` after the immediate first
//! fetch, so the first tick here fires one full period later. The job holds a
//! weak reference and exits on its own once the store is dropped. A 401/403
//! ends polling: the token is not going to start working again.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::models::AuthToken;
use crate::store::WeakStore;

pub(crate) fn spawn(store: WeakStore, token: AuthToken, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;

            let Some(store) = store.upgrade() else {
                debug!("poll job: store dropped, exiting");
                break;
            };

            if let Err(e) = store.try_fetch_page(&token, 1).await {
                if e.is_unauthorized() {
                    warn!(error = %e, "poll job: credential rejected, stopping");
                    store.stop_polling();
                    break;
                }
            }

            let evicted = store.query_cache().evict_expired();
            if evicted > 0 {
                debug!(evicted, "poll job: evicted expired cache entries");
            }
        }
    })
}
