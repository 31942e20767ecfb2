use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

use crate::store::StoreEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    /// Toast for a store event, if the event warrants one.
    /// Only mutations are surfaced; background fetches stay silent.
    pub fn for_event(event: &StoreEvent) -> Option<Toast> {
        match event {
            StoreEvent::Succeeded { action } if action.is_mutation() => Some(Toast {
                level: ToastLevel::Success,
                message: action.success_message().to_string(),
            }),
            StoreEvent::Failed { action, message } if action.is_mutation() => Some(Toast {
                level: ToastLevel::Error,
                message: format!("{}: {}", action.failure_message(), message),
            }),
            _ => None,
        }
    }
}

/// Sink for toasts. The UI layer implements this; the CLI logs them.
pub trait Toaster: Send + Sync {
    fn show(&self, toast: &Toast);
}

/// Writes toasts to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingToaster;

impl Toaster for TracingToaster {
    fn show(&self, toast: &Toast) {
        match toast.level {
            ToastLevel::Success => info!(toast = %toast.message, "notification toast"),
            ToastLevel::Error => warn!(toast = %toast.message, "notification toast"),
        }
    }
}

/// Collects toasts in memory, newest last.
#[derive(Debug, Default)]
pub struct MemoryToaster {
    shown: Mutex<Vec<Toast>>,
}

impl MemoryToaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.shown.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Toaster for MemoryToaster {
    fn show(&self, toast: &Toast) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast.clone());
    }
}
