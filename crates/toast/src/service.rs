//! The toast registry.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};

use {
    givers_config::ToastConfig,
    tokio::sync::watch,
    tracing::{debug, trace},
};

use crate::{
    message::{Severity, ToastMessage, ToastOptions},
    scheduler::{Clock, Scheduler, TimerHandle},
};

/// Observer callback, invoked after every change to the visible set.
pub type ChangeFn = Arc<dyn Fn() + Send + Sync>;

/// Token returned by [`ToastService::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    toasts: Vec<ToastMessage>,
    timers: HashMap<String, TimerHandle>,
    last_created_at_ms: u64,
}

impl Registry {
    /// Remove a toast and cancel its timer. Returns `false` if absent.
    fn remove(&mut self, id: &str) -> bool {
        let Some(pos) = self.toasts.iter().position(|t| t.id == id) else {
            return false;
        };
        self.toasts.remove(pos);
        if let Some(timer) = self.timers.remove(id) {
            timer.cancel();
        }
        true
    }

    fn clear(&mut self) {
        self.toasts.clear();
        for (_, timer) in self.timers.drain() {
            timer.cancel();
        }
    }
}

#[derive(Default)]
struct Observers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, ChangeFn)>,
}

struct Shared {
    scheduler: Arc<dyn Scheduler>,
    max_visible: usize,
    default_duration_ms: i64,
    registry: Mutex<Registry>,
    observers: Mutex<Observers>,
    generation: watch::Sender<u64>,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dismiss(&self, id: &str) {
        let removed = self.registry().remove(id);
        if removed {
            debug!(toast_id = id, "toast dismissed");
            self.notify();
        } else {
            trace!(toast_id = id, "dismiss of unknown toast ignored");
        }
    }

    /// Bump the generation and run observers. Never called with a lock held.
    fn notify(&self) {
        self.generation.send_modify(|g| *g += 1);
        let callbacks: Vec<ChangeFn> = {
            let observers = self.observers.lock().unwrap_or_else(|e| e.into_inner());
            observers.callbacks.iter().map(|(_, f)| Arc::clone(f)).collect()
        };
        for callback in callbacks {
            callback();
        }
    }
}

/// Ordered, bounded set of visible toasts for one UI session.
///
/// The oldest toast is evicted when a new one would exceed `max_visible`.
/// Toasts with a positive duration are dismissed by their own timer; every
/// removal path cancels that timer. Dropping the service cancels all
/// outstanding timers.
pub struct ToastService {
    shared: Arc<Shared>,
}

impl ToastService {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_config(scheduler, &ToastConfig::default())
    }

    pub fn with_config(scheduler: Arc<dyn Scheduler>, config: &ToastConfig) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                scheduler,
                max_visible: config.max_visible.max(1),
                default_duration_ms: config.default_duration_ms,
                registry: Mutex::new(Registry::default()),
                observers: Mutex::new(Observers::default()),
                generation,
            }),
        }
    }

    /// Show a toast and return its id.
    pub fn show(&self, severity: Severity, options: ToastOptions) -> String {
        let shared = &self.shared;
        let duration_ms = options.duration_ms.unwrap_or(shared.default_duration_ms);
        let id = uuid::Uuid::new_v4().to_string();

        let evicted = {
            let mut registry = shared.registry();

            let mut evicted = Vec::new();
            while registry.toasts.len() >= shared.max_visible {
                let oldest = registry.toasts[0].id.clone();
                registry.remove(&oldest);
                evicted.push(oldest);
            }

            let created_at_ms = shared.scheduler.now_ms().max(registry.last_created_at_ms);
            registry.last_created_at_ms = created_at_ms;
            let message = ToastMessage {
                id: id.clone(),
                title: options.title,
                description: options.description,
                severity,
                created_at_ms,
                duration_ms,
            };
            let expires_at_ms = message.expires_at_ms();
            registry.toasts.push(message);

            if let Some(expires_at_ms) = expires_at_ms {
                let weak: Weak<Shared> = Arc::downgrade(shared);
                let toast_id = id.clone();
                let timer = shared.scheduler.schedule(
                    Duration::from_millis(expires_at_ms - created_at_ms),
                    Box::new(move || {
                        if let Some(shared) = weak.upgrade() {
                            debug!(toast_id = %toast_id, "toast expired");
                            shared.dismiss(&toast_id);
                        }
                    }),
                );
                registry.timers.insert(id.clone(), timer);
            }
            evicted
        };

        for oldest in &evicted {
            debug!(toast_id = %oldest, "toast evicted to make room");
            shared.notify();
        }
        debug!(toast_id = %id, %severity, duration_ms, "toast shown");
        shared.notify();
        id
    }

    pub fn show_default(&self, options: ToastOptions) -> String {
        self.show(Severity::Default, options)
    }

    pub fn show_success(&self, options: ToastOptions) -> String {
        self.show(Severity::Success, options)
    }

    pub fn show_warning(&self, options: ToastOptions) -> String {
        self.show(Severity::Warning, options)
    }

    pub fn show_error(&self, options: ToastOptions) -> String {
        self.show(Severity::Error, options)
    }

    /// Remove a toast by id. Unknown ids are ignored.
    pub fn dismiss(&self, id: &str) {
        self.shared.dismiss(id);
    }

    /// Remove every toast and cancel every timer, notifying once.
    pub fn dismiss_all(&self) {
        self.shared.registry().clear();
        debug!("all toasts dismissed");
        self.shared.notify();
    }

    /// Snapshot of the visible toasts, oldest first.
    pub fn toasts(&self) -> Vec<ToastMessage> {
        self.shared.registry().toasts.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.registry().toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of expiry timers still owned by visible toasts.
    pub fn pending_timers(&self) -> usize {
        self.shared.registry().timers.len()
    }

    pub fn max_visible(&self) -> usize {
        self.shared.max_visible
    }

    /// Register an observer for changes to the visible set.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let mut observers = self
            .shared
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let id = SubscriptionId(observers.next_id);
        observers.next_id += 1;
        observers.callbacks.push((id, Arc::new(callback)));
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self
            .shared
            .observers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let before = observers.callbacks.len();
        observers.callbacks.retain(|(sid, _)| *sid != id);
        observers.callbacks.len() != before
    }

    /// Change counter for async renderers; bumps after every mutation.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.generation.subscribe()
    }

    /// Cancel every timer and clear the registry without notifying.
    pub fn shutdown(&self) {
        let mut registry = self.shared.registry();
        let outstanding = registry.timers.len();
        registry.clear();
        debug!(outstanding, "toast service shut down");
    }
}

impl Drop for ToastService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
