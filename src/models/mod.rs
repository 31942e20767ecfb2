pub mod auth;
pub mod notification;

pub use auth::{AuthToken, User};
pub use notification::{CreateNotification, Metadata, Notification, NotificationPage, NotificationType};
