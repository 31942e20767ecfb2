use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open key-value metadata attached to a notification.
/// Its shape depends on the notification type and is owned by the backend.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Comment,
    Like,
    Message,
    Post,
    NewApplication,
    ApplicationStatusUpdate,
    System,
}

impl NotificationType {
    pub const ALL: [NotificationType; 7] = [
        NotificationType::Comment,
        NotificationType::Like,
        NotificationType::Message,
        NotificationType::Post,
        NotificationType::NewApplication,
        NotificationType::ApplicationStatusUpdate,
        NotificationType::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Comment => "comment",
            NotificationType::Like => "like",
            NotificationType::Message => "message",
            NotificationType::Post => "post",
            NotificationType::NewApplication => "new_application",
            NotificationType::ApplicationStatusUpdate => "application_status_update",
            NotificationType::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown notification type '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub notification_type: NotificationType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
    pub read: bool,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Apply a local read patch.
    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        self.read = true;
        self.read_at = Some(at);
    }

    pub fn is_unread(&self) -> bool {
        !self.read
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of notifications as returned by `GET /notifications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPage {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub items: Vec<Notification>,
}

/// Body of `POST /notifications`. The create endpoint takes camelCase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotification {
    pub user_id: String,
    pub content: String,
    pub notification_type: NotificationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}
