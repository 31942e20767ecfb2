//! market-notify: client-side notification cache for the marketplace API.
//!
//! The store keeps one user's notifications in sync with the backend by
//! polling, applies mark-read / delete / create locally once the API accepts
//! them, and reports every outcome on a single event channel.

pub mod api;
pub mod cache;
pub mod config;
pub mod consumer;
pub mod errors;
pub(crate) mod jobs;
pub mod models;
pub mod notification;
pub mod store;

pub use api::{HttpNotificationApi, NotificationApi};
pub use consumer::NotificationConsumer;
pub use errors::ApiError;
pub use store::{NotificationSnapshot, NotificationStore, StoreEvent, StoreOptions};
