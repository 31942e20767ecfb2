//! Shared fixtures: an in-process `NotificationApi` that serves canned pages
//! and records every call.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use tokio::sync::Notify;

use market_notify::models::{
    AuthToken, CreateNotification, Notification, NotificationPage, NotificationType,
};
use market_notify::{ApiError, NotificationApi, NotificationStore, StoreOptions};

pub fn token() -> AuthToken {
    AuthToken::new("test-token").unwrap()
}

pub fn notification(id: &str, read: bool) -> Notification {
    Notification {
        id: id.to_string(),
        user_id: "user-1".into(),
        content: format!("notification {}", id),
        notification_type: NotificationType::Comment,
        metadata: Default::default(),
        read,
        read_at: if read {
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap())
        } else {
            None
        },
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap(),
        updated_at: None,
    }
}

/// `count` unread notifications with ids `{prefix}-0 .. {prefix}-{count-1}`.
pub fn batch(prefix: &str, count: usize) -> Vec<Notification> {
    (0..count)
        .map(|i| notification(&format!("{}-{}", prefix, i), false))
        .collect()
}

#[derive(Default)]
pub struct FakeApi {
    pages: Mutex<HashMap<u32, Vec<Notification>>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashMap<&'static str, StatusCode>>,
    gate_next_get: AtomicBool,
    gate: Notify,
    created: AtomicU64,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_page(self: Arc<Self>, page: u32, items: Vec<Notification>) -> Arc<Self> {
        self.set_page(page, items);
        self
    }

    pub fn set_page(&self, page: u32, items: Vec<Notification>) {
        self.pages.lock().unwrap().insert(page, items);
    }

    /// Make every call of `op` ("get", "create", "read", "delete", "delete_all") fail.
    pub fn fail(&self, op: &'static str, status: StatusCode) {
        self.failing.lock().unwrap().insert(op, status);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    /// The next `get_notifications` call captures its response, then waits
    /// for `release()` before returning it.
    pub fn hold_next_get(&self) {
        self.gate_next_get.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: &'static str) -> Result<(), ApiError> {
        match self.failing.lock().unwrap().get(op) {
            Some(status) => Err(ApiError::Status {
                status: *status,
                body: format!("{} failed", op),
            }),
            None => Ok(()),
        }
    }

    fn total(&self) -> u64 {
        self.pages
            .lock()
            .unwrap()
            .values()
            .map(|items| items.len() as u64)
            .sum()
    }
}

#[async_trait]
impl NotificationApi for FakeApi {
    async fn get_notifications(
        &self,
        page: u32,
        page_size: u32,
        _token: &AuthToken,
    ) -> Result<NotificationPage, ApiError> {
        self.record(format!("get:{}", page));
        let result = self.check("get").map(|()| NotificationPage {
            page,
            page_size,
            total: self.total(),
            items: self
                .pages
                .lock()
                .unwrap()
                .get(&page)
                .cloned()
                .unwrap_or_default(),
        });
        if self.gate_next_get.swap(false, Ordering::SeqCst) {
            self.gate.notified().await;
        }
        result
    }

    async fn create_notification(
        &self,
        input: &CreateNotification,
        _token: &AuthToken,
    ) -> Result<Notification, ApiError> {
        self.record("create".to_string());
        self.check("create")?;
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Notification {
            id: format!("created-{}", n),
            user_id: input.user_id.clone(),
            content: input.content.clone(),
            notification_type: input.notification_type,
            metadata: input.metadata.clone().unwrap_or_default(),
            read: false,
            read_at: None,
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    async fn mark_as_read(&self, id: &str, _token: &AuthToken) -> Result<Notification, ApiError> {
        self.record(format!("read:{}", id));
        self.check("read")?;
        let mut n = notification(id, true);
        n.read_at = Some(Utc::now());
        Ok(n)
    }

    async fn delete_notification(&self, id: &str, _token: &AuthToken) -> Result<(), ApiError> {
        self.record(format!("delete:{}", id));
        self.check("delete")
    }

    async fn delete_all_notifications(&self, _token: &AuthToken) -> Result<(), ApiError> {
        self.record("delete_all".to_string());
        self.check("delete_all")
    }
}

pub fn store_with(api: Arc<FakeApi>) -> NotificationStore {
    NotificationStore::new(
        api,
        StoreOptions {
            page_size: 20,
            poll_interval: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(60),
        },
    )
}

/// Yield to spawned tasks until `cond` holds. Panics after a generous number of rounds.
pub async fn settle<F: Fn() -> bool>(cond: F) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub fn ids(items: &[Notification]) -> HashSet<String> {
    items.iter().map(|n| n.id.clone()).collect()
}
