//! Client-side notification store.
//!
//! One `NotificationStore` per signed-in session. It owns the retained
//! notification set, derives the unread count from it, runs the polling job
//! and applies mutations locally once the API has accepted them.
//!
//! No operation returns an error. Failures land in the snapshot's error slot
//! and on the event channel (`subscribe()`), which is what consumers react to.
//!
//! Stale results are discarded with two counters kept in the state:
//! - `session` is bumped by `stop_polling`, `dispose` and a successful
//!   delete-all; any fetch issued under an older session is dropped on arrival.
//! - `page_one_ticket` identifies the newest page-1 request; an older page-1
//!   response that resolves later is dropped, so the last *issued* poll wins.
//!
//! A delete-all only invalidates results. Whether the poll timer should run is
//! tracked separately by `polling_epoch`, which only `stop_polling` bumps.

pub mod events;
pub mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::NotificationApi;
use crate::cache::QueryCache;
use crate::config::{Config, DEFAULT_CACHE_TTL_SECS, DEFAULT_PAGE_SIZE, DEFAULT_POLL_INTERVAL_SECS};
use crate::errors::ApiError;
use crate::models::{AuthToken, CreateNotification, Notification, NotificationPage};

pub use events::{StoreAction, StoreEvent};
pub use state::{NotificationSet, NotificationSnapshot};
use state::StoreState;

/// Cache keys for notification queries all start with this.
pub const CACHE_PREFIX: &str = "notifications";

const EVENT_CAPACITY: usize = 64;

pub fn page_cache_key(page: u32) -> String {
    format!("{}:page:{}", CACHE_PREFIX, page)
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub page_size: u32,
    pub poll_interval: Duration,
    pub cache_ttl: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            page_size: cfg.page_size,
            poll_interval: cfg.poll_interval(),
            cache_ttl: cfg.cache_ttl(),
        }
    }
}

struct Inner {
    api: Arc<dyn NotificationApi>,
    options: StoreOptions,
    state: Mutex<StoreState>,
    poller: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<StoreEvent>,
    cache: QueryCache,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let handle = self
            .poller
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Shared, cheaply-cloneable notification store.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<Inner>,
}

/// Non-owning handle held by the poll job so it never keeps a store alive.
#[derive(Clone)]
pub(crate) struct WeakStore(Weak<Inner>);

impl WeakStore {
    pub(crate) fn upgrade(&self) -> Option<NotificationStore> {
        self.0.upgrade().map(|inner| NotificationStore { inner })
    }
}

impl NotificationStore {
    pub fn new(api: Arc<dyn NotificationApi>, options: StoreOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let cache = QueryCache::new(options.cache_ttl);
        Self {
            inner: Arc::new(Inner {
                api,
                options,
                state: Mutex::new(StoreState::default()),
                poller: Mutex::new(None),
                events,
                cache,
            }),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    pub fn query_cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.state().snapshot()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.to_vec()
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.state().notifications.get(id).cloned()
    }

    pub fn unread_count(&self) -> usize {
        self.state().unread_count
    }

    pub fn is_polling(&self) -> bool {
        self.state().polling
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Last fetched copy of `page`, as served to detail views.
    pub fn cached_page(&self, page: u32) -> Option<NotificationPage> {
        self.inner.cache.get(&page_cache_key(page))
    }

    pub(crate) fn downgrade(&self) -> WeakStore {
        WeakStore(Arc::downgrade(&self.inner))
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn poller(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    fn record_failure(&self, action: StoreAction, err: &ApiError) {
        let message = err.to_string();
        warn!(action = ?action, error = %message, "notification request failed");
        self.state().error = Some(message.clone());
        self.emit(StoreEvent::Failed { action, message });
    }

    fn record_success(&self, action: StoreAction) {
        self.inner.cache.invalidate_prefix(CACHE_PREFIX);
        self.emit(StoreEvent::Succeeded { action });
    }

    // ── Fetching ──────────────────────────────────────────────

    /// Fetch one page. Page 1 replaces the retained set, later pages merge into it.
    pub async fn fetch_page(&self, token: &AuthToken, page: u32) {
        let _ = self.try_fetch_page(token, page).await;
    }

    /// Fetch the page after the last one loaded, if the server indicated there is one.
    pub async fn load_more(&self, token: &AuthToken) {
        let (current, has_more) = {
            let st = self.state();
            (st.current_page, st.has_more)
        };
        if current == 0 {
            self.fetch_page(token, 1).await;
        } else if has_more {
            self.fetch_page(token, current + 1).await;
        } else {
            debug!(page = current, "load_more: no further pages");
        }
    }

    /// Same as `fetch_page`, but hands the failure back to the poll job.
    pub(crate) async fn try_fetch_page(&self, token: &AuthToken, page: u32) -> Result<(), ApiError> {
        let page = page.max(1);
        let page_size = self.inner.options.page_size;
        let action = StoreAction::FetchPage { page };

        let (session, ticket) = {
            let mut st = self.state();
            if page == 1 {
                st.page_one_ticket += 1;
                // polling refreshes must not flicker a loading indicator
                if !st.polling {
                    st.loading = true;
                }
            }
            (st.session, st.page_one_ticket)
        };

        let result = self
            .inner
            .api
            .get_notifications(page, page_size, token)
            .await;

        let mut st = self.state();
        let superseded = page == 1 && st.page_one_ticket != ticket;
        if st.session != session || superseded {
            if page == 1 && !superseded {
                st.loading = false;
            }
            drop(st);
            debug!(page, "dropping stale notification page");
            self.emit(StoreEvent::Discarded { action });
            return Ok(());
        }

        match result {
            Ok(fetched) => {
                if let Err(e) = self.inner.cache.set(&page_cache_key(page), &fetched) {
                    debug!(error = %e, "could not cache notification page");
                }
                let count = fetched.items.len();
                st.has_more = count == page_size as usize;
                st.total = Some(fetched.total);
                if page == 1 {
                    st.notifications = NotificationSet::from_items(fetched.items);
                    st.loading = false;
                } else {
                    st.notifications.extend(fetched.items);
                }
                st.current_page = page;
                st.error = None;
                st.recount();
                let unread = st.unread_count;
                drop(st);

                debug!(page, count, unread, "notifications fetched");
                self.emit(StoreEvent::Succeeded { action });
                Ok(())
            }
            Err(e) => {
                if page == 1 {
                    st.loading = false;
                }
                drop(st);
                self.record_failure(action, &e);
                Err(e)
            }
        }
    }

    // ── Polling ───────────────────────────────────────────────

    /// Fetch page 1 now, then every poll interval until `stop_polling`.
    /// Calling it again restarts the cycle with the new token.
    pub async fn start_polling(&self, token: AuthToken) {
        self.stop_polling();

        let epoch = {
            let mut st = self.state();
            st.polling = true;
            st.polling_epoch
        };
        info!(
            interval_secs = self.inner.options.poll_interval.as_secs(),
            "notification polling started"
        );
        self.emit(StoreEvent::PollingStarted);

        self.fetch_page(&token, 1).await;

        // stopped (or restarted) while the first fetch was in flight
        if self.state().polling_epoch != epoch {
            return;
        }

        let handle = crate::jobs::poll::spawn(
            self.downgrade(),
            token,
            self.inner.options.poll_interval,
        );
        if let Some(previous) = self.poller().replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the poll timer. In-flight fetches are allowed to finish but their
    /// results are discarded. Safe to call when not polling.
    pub fn stop_polling(&self) {
        let handle = self.poller().take();
        let was_polling = {
            let mut st = self.state();
            st.session += 1;
            st.polling_epoch += 1;
            std::mem::replace(&mut st.polling, false)
        };

        if let Some(handle) = &handle {
            handle.abort();
        }
        if was_polling || handle.is_some() {
            info!("notification polling stopped");
            self.emit(StoreEvent::PollingStopped);
        }
    }

    /// Stop polling and forget everything fetched in this session.
    pub fn dispose(&self) {
        self.stop_polling();
        {
            let mut st = self.state();
            st.notifications.clear();
            st.unread_count = 0;
            st.loading = false;
            st.error = None;
            st.current_page = 0;
            st.has_more = false;
            st.total = None;
        }
        self.inner.cache.clear();
        debug!("notification store disposed");
    }

    // ── Mutations ─────────────────────────────────────────────

    pub async fn mark_as_read(&self, token: &AuthToken, id: &str) {
        let action = StoreAction::MarkAsRead { id: id.to_string() };
        match self.inner.api.mark_as_read(id, token).await {
            Ok(_) => {
                {
                    let mut st = self.state();
                    match st.notifications.get_mut(id) {
                        Some(n) => n.mark_read(chrono::Utc::now()),
                        None => debug!(notification_id = id, "marked read but not held locally"),
                    }
                    st.error = None;
                    st.recount();
                }
                self.record_success(action);
            }
            Err(e) => self.record_failure(action, &e),
        }
    }

    pub async fn delete_notification(&self, token: &AuthToken, id: &str) {
        let action = StoreAction::Delete { id: id.to_string() };
        match self.inner.api.delete_notification(id, token).await {
            Ok(()) => {
                {
                    let mut st = self.state();
                    if st.notifications.remove(id).is_some() {
                        if let Some(total) = st.total.as_mut() {
                            *total = total.saturating_sub(1);
                        }
                    }
                    st.error = None;
                    st.recount();
                }
                self.record_success(action);
            }
            Err(e) => self.record_failure(action, &e),
        }
    }

    pub async fn delete_all_notifications(&self, token: &AuthToken) {
        let action = StoreAction::DeleteAll;
        match self.inner.api.delete_all_notifications(token).await {
            Ok(()) => {
                {
                    let mut st = self.state();
                    // anything fetched before the wipe must not come back
                    st.session += 1;
                    st.notifications.clear();
                    st.unread_count = 0;
                    st.loading = false;
                    st.has_more = false;
                    st.total = Some(0);
                    st.error = None;
                }
                self.record_success(action);
            }
            Err(e) => self.record_failure(action, &e),
        }
    }

    pub async fn create_notification(&self, token: &AuthToken, input: &CreateNotification) {
        let action = StoreAction::Create;
        match self.inner.api.create_notification(input, token).await {
            Ok(created) => {
                {
                    let mut st = self.state();
                    let is_new = st.notifications.get(&created.id).is_none();
                    st.notifications.prepend(created);
                    if is_new {
                        if let Some(total) = st.total.as_mut() {
                            *total += 1;
                        }
                    }
                    st.error = None;
                    st.recount();
                }
                self.record_success(action);
            }
            Err(e) => self.record_failure(action, &e),
        }
    }
}
