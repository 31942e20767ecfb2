use serde::Serialize;

/// Operation a [`StoreEvent`] reports on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StoreAction {
    FetchPage { page: u32 },
    MarkAsRead { id: String },
    Delete { id: String },
    DeleteAll,
    Create,
}

impl StoreAction {
    /// Actions the user triggered directly. Fetches are background work.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, StoreAction::FetchPage { .. })
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            StoreAction::FetchPage { .. } => "Notifications updated",
            StoreAction::MarkAsRead { .. } => "Notification marked as read",
            StoreAction::Delete { .. } => "Notification deleted",
            StoreAction::DeleteAll => "All notifications deleted",
            StoreAction::Create => "Notification created",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            StoreAction::FetchPage { .. } => "Failed to load notifications",
            StoreAction::MarkAsRead { .. } => "Failed to mark notification as read",
            StoreAction::Delete { .. } => "Failed to delete notification",
            StoreAction::DeleteAll => "Failed to delete notifications",
            StoreAction::Create => "Failed to create notification",
        }
    }
}

/// Published on the store's broadcast channel after every operation.
/// This is the only place failures are reported; the error slot in the
/// snapshot and any toast shown to the user both derive from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreEvent {
    Succeeded { action: StoreAction },
    Failed { action: StoreAction, message: String },
    /// A fetch finished after a stop, dispose or delete-all and was thrown away.
    Discarded { action: StoreAction },
    PollingStarted,
    PollingStopped,
}

impl StoreEvent {
    pub fn action(&self) -> Option<&StoreAction> {
        match self {
            StoreEvent::Succeeded { action }
            | StoreEvent::Failed { action, .. }
            | StoreEvent::Discarded { action } => Some(action),
            StoreEvent::PollingStarted | StoreEvent::PollingStopped => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_is_not_mutation() {
        assert!(!StoreAction::FetchPage { page: 1 }.is_mutation());
        assert!(StoreAction::DeleteAll.is_mutation());
        assert!(StoreAction::MarkAsRead { id: "n1".into() }.is_mutation());
    }

    #[test]
    fn test_event_serializes_tagged() {
        let event = StoreEvent::Failed {
            action: StoreAction::Delete { id: "n1".into() },
            message: "boom".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "failed");
        assert_eq!(json["action"]["action"], "delete");
        assert_eq!(json["action"]["id"], "n1");
    }
}
