use std::collections::HashMap;

use serde::Serialize;

use crate::models::Notification;

/// Order-preserving set of notifications keyed by id.
///
/// `order` holds every id exactly once; `items` holds the notification for each id.
#[derive(Debug, Default, Clone)]
pub struct NotificationSet {
    order: Vec<String>,
    items: HashMap<String, Notification>,
}

impl NotificationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a server page, keeping the first occurrence of a repeated id
    /// in position and the last occurrence's contents.
    pub fn from_items(items: Vec<Notification>) -> Self {
        let mut set = Self::new();
        set.extend(items);
        set
    }

    /// Insert at the end, or update in place if the id is already present.
    pub fn upsert(&mut self, item: Notification) {
        if !self.items.contains_key(&item.id) {
            self.order.push(item.id.clone());
        }
        self.items.insert(item.id.clone(), item);
    }

    /// Insert at the front, moving the id there if it already exists.
    pub fn prepend(&mut self, item: Notification) {
        if self.items.contains_key(&item.id) {
            self.order.retain(|id| id != &item.id);
        }
        self.order.insert(0, item.id.clone());
        self.items.insert(item.id.clone(), item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = Notification>) {
        for item in items {
            self.upsert(item);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Notification> {
        let removed = self.items.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Notification> {
        self.items.get_mut(id)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn unread_count(&self) -> usize {
        self.items.values().filter(|n| n.is_unread()).count()
    }

    pub fn to_vec(&self) -> Vec<Notification> {
        self.iter().cloned().collect()
    }
}

/// Mutable state behind a [`NotificationStore`](super::NotificationStore).
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) notifications: NotificationSet,
    pub(crate) unread_count: usize,
    pub(crate) loading: bool,
    pub(crate) polling: bool,
    pub(crate) error: Option<String>,
    pub(crate) current_page: u32,
    pub(crate) has_more: bool,
    pub(crate) total: Option<u64>,
    /// Bumped by stop/dispose/delete-all; results issued under an older session are dropped.
    pub(crate) session: u64,
    /// Id of the most recently issued page-1 request.
    pub(crate) page_one_ticket: u64,
    /// Bumped only by `stop_polling`; a `start_polling` that sees it change was cancelled.
    pub(crate) polling_epoch: u64,
}

impl StoreState {
    pub(crate) fn recount(&mut self) {
        self.unread_count = self.notifications.unread_count();
    }

    pub(crate) fn snapshot(&self) -> NotificationSnapshot {
        NotificationSnapshot {
            notifications: self.notifications.to_vec(),
            unread_count: self.unread_count,
            loading: self.loading,
            polling: self.polling,
            error: self.error.clone(),
            current_page: self.current_page,
            has_more: self.has_more,
            total: self.total,
        }
    }
}

/// Read-only copy of the store state handed to consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub loading: bool,
    pub polling: bool,
    pub error: Option<String>,
    pub current_page: u32,
    pub has_more: bool,
    pub total: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationType;

    fn item(id: &str, read: bool) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: "u1".into(),
            content: format!("content {}", id),
            notification_type: NotificationType::Message,
            metadata: Default::default(),
            read,
            read_at: None,
            created_at: chrono::Utc::now(),
            updated_at: None,
        }
    }

    fn ids(set: &NotificationSet) -> Vec<String> {
        set.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn test_upsert_keeps_position_and_updates_contents() {
        let mut set = NotificationSet::from_items(vec![item("a", false), item("b", false)]);
        set.upsert(item("a", true));
        set.upsert(item("c", false));
        assert_eq!(ids(&set), vec!["a", "b", "c"]);
        assert!(set.get("a").unwrap().read);
        assert_eq!(set.unread_count(), 2);
    }

    #[test]
    fn test_duplicate_ids_in_page_collapse() {
        let set = NotificationSet::from_items(vec![item("a", false), item("a", false)]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_prepend_moves_existing_to_front() {
        let mut set = NotificationSet::from_items(vec![item("a", false), item("b", false)]);
        set.prepend(item("b", false));
        set.prepend(item("z", false));
        assert_eq!(ids(&set), vec!["z", "b", "a"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut set = NotificationSet::from_items(vec![item("a", false), item("b", true)]);
        assert!(set.remove("a").is_some());
        assert!(set.remove("a").is_none());
        assert_eq!(ids(&set), vec!["b"]);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.unread_count(), 0);
    }
}
