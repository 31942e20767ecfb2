pub mod client;
pub mod schema;

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::models::{AuthToken, CreateNotification, Notification, NotificationPage};

pub use client::HttpNotificationApi;

/// Access layer over the notifications REST API.
/// One request per call: no retries, no caching, no batching.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// `GET /notifications?page=&page_size=`
    async fn get_notifications(
        &self,
        page: u32,
        page_size: u32,
        token: &AuthToken,
    ) -> Result<NotificationPage, ApiError>;

    /// `POST /notifications`
    async fn create_notification(
        &self,
        input: &CreateNotification,
        token: &AuthToken,
    ) -> Result<Notification, ApiError>;

    /// `POST /notifications/{id}/read`
    async fn mark_as_read(&self, id: &str, token: &AuthToken) -> Result<Notification, ApiError>;

    /// `DELETE /notifications/{id}`
    async fn delete_notification(&self, id: &str, token: &AuthToken) -> Result<(), ApiError>;

    /// `DELETE /notifications`: everything owned by the token's user.
    async fn delete_all_notifications(&self, token: &AuthToken) -> Result<(), ApiError>;
}
