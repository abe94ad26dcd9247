//! Transient notifications ("toasts") for givers.
//!
//! [`ToastService`] keeps an ordered, bounded list of visible messages. Each
//! message with a positive duration owns one expiry timer from the injected
//! [`Scheduler`]; the timer and the message are dropped together. Observers
//! are told whenever the visible set changes.
//!
//! Use [`TokioScheduler`] in a running application and [`ManualScheduler`]
//! to drive expiry from a virtual clock in tests.

pub mod message;
pub mod scheduler;
pub mod service;

pub use {
    message::{Severity, ToastMessage, ToastOptions},
    scheduler::{Clock, ManualScheduler, Scheduler, TimerHandle, TimerTask, TokioScheduler},
    service::{ChangeFn, SubscriptionId, ToastService},
};
