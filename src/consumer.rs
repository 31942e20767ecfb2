//! Binding between a view and the notification store.
//!
//! A view creates one `NotificationConsumer`, calls `mount()` when it appears
//! and `unmount()` (or drops the consumer) when it goes away. Polling runs only
//! while the consumer is mounted *and* both a credential and a user are known.
//!
//! Mutation wrappers need a credential; without one they log and return
//! without touching the store or the network. After every wrapper call the
//! store's pending events are turned into toasts, so the toast a user sees is
//! always derived from what the store recorded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::models::{AuthToken, CreateNotification, Notification, User};
use crate::notification::{Toast, Toaster};
use crate::store::{NotificationSnapshot, NotificationStore, StoreEvent};

#[derive(Default)]
struct Session {
    token: Option<AuthToken>,
    user: Option<User>,
    mounted: bool,
}

impl Session {
    fn polling_credential(&self) -> Option<AuthToken> {
        match (&self.token, &self.user, self.mounted) {
            (Some(token), Some(_), true) => Some(token.clone()),
            _ => None,
        }
    }
}

pub struct NotificationConsumer {
    store: NotificationStore,
    toaster: Arc<dyn Toaster>,
    events: Mutex<broadcast::Receiver<StoreEvent>>,
    session: Mutex<Session>,
}

impl NotificationConsumer {
    pub fn new(store: NotificationStore, toaster: Arc<dyn Toaster>) -> Self {
        let events = Mutex::new(store.subscribe());
        Self {
            store,
            toaster,
            events,
            session: Mutex::new(Session::default()),
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Update the credential and signed-in user. Polling is (re)started or
    /// stopped to match.
    pub async fn set_session(&self, token: Option<AuthToken>, user: Option<User>) {
        let changed = {
            let mut session = self.session();
            let changed = session.token != token || session.user != user;
            session.token = token;
            session.user = user;
            changed
        };
        if changed {
            self.sync_polling().await;
        }
    }

    pub async fn mount(&self) {
        self.session().mounted = true;
        self.sync_polling().await;
    }

    pub fn unmount(&self) {
        self.session().mounted = false;
        self.store.stop_polling();
    }

    async fn sync_polling(&self) {
        let credential = self.session().polling_credential();
        match credential {
            Some(token) => self.store.start_polling(token).await,
            None => {
                if self.store.is_polling() {
                    debug!("consumer: credential or user gone, stopping polling");
                }
                self.store.stop_polling();
            }
        }
        self.flush_toasts();
    }

    fn credential(&self, operation: &str) -> Option<AuthToken> {
        let token = self.session().token.clone();
        if token.is_none() {
            warn!(operation, "no credential, skipping notification request");
        }
        token
    }

    // ── Actions ───────────────────────────────────────────────

    pub async fn refresh(&self) {
        let Some(token) = self.credential("refresh") else {
            return;
        };
        self.store.fetch_page(&token, 1).await;
        self.flush_toasts();
    }

    pub async fn load_more(&self) {
        let Some(token) = self.credential("load_more") else {
            return;
        };
        self.store.load_more(&token).await;
        self.flush_toasts();
    }

    pub async fn mark_as_read(&self, id: &str) {
        let Some(token) = self.credential("mark_as_read") else {
            return;
        };
        self.store.mark_as_read(&token, id).await;
        self.flush_toasts();
    }

    pub async fn delete_notification(&self, id: &str) {
        let Some(token) = self.credential("delete_notification") else {
            return;
        };
        self.store.delete_notification(&token, id).await;
        self.flush_toasts();
    }

    pub async fn delete_all_notifications(&self) {
        let Some(token) = self.credential("delete_all_notifications") else {
            return;
        };
        self.store.delete_all_notifications(&token).await;
        self.flush_toasts();
    }

    pub async fn create_notification(&self, input: &CreateNotification) {
        let Some(token) = self.credential("create_notification") else {
            return;
        };
        self.store.create_notification(&token, input).await;
        self.flush_toasts();
    }

    /// Turn every pending store event into a toast where one applies.
    /// Returns the number of toasts shown.
    pub fn flush_toasts(&self) -> usize {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let mut shown = 0;
        loop {
            match events.try_recv() {
                Ok(event) => {
                    if let Some(toast) = Toast::for_event(&event) {
                        self.toaster.show(&toast);
                        shown += 1;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "consumer: skipped old store events");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        shown
    }

    // ── Reads ─────────────────────────────────────────────────

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.store.snapshot()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.store.notifications()
    }

    pub fn unread_count(&self) -> usize {
        self.store.unread_count()
    }

    pub fn is_polling(&self) -> bool {
        self.store.is_polling()
    }

    pub fn error(&self) -> Option<String> {
        self.store.error()
    }
}

impl Drop for NotificationConsumer {
    fn drop(&mut self) {
        if self.session().mounted {
            self.store.stop_polling();
        }
    }
}
