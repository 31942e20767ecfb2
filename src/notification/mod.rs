//! User-facing banners ("toasts") raised in reaction to store events.

pub mod toast;

pub use toast::{MemoryToaster, Toast, ToastLevel, Toaster, TracingToaster};
