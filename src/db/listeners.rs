//! Listener bookkeeping shared by the store adapters.
//!
//! Deliveries are serialized: a listener never sees an older value after a
//! newer one, whether the change came from this process or from a poll.

use super::{ChangeFn, ErrorFn, paths_overlap};
use crate::errors::{AppError, AppResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{trace, warn};

struct Listener {
    path: String,
    on_change: ChangeFn,
    on_error: ErrorFn,
    /// Last value handed to `on_change`.
    last: Option<Value>,
}

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, Listener>>,
    delivery: Mutex<()>,
}

impl ListenerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add a listener and hand it the current value of `path` from `read`.
    pub fn register(
        self: &Arc<Self>,
        path: &str,
        on_change: ChangeFn,
        on_error: ErrorFn,
        read: impl FnOnce(&str) -> AppResult<Option<Value>>,
    ) -> AppResult<Subscription> {
        let _delivery = self.delivery.lock();
        let current = read(path)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(
            id,
            Listener {
                path: path.to_string(),
                on_change: Arc::clone(&on_change),
                on_error,
                last: current.clone(),
            },
        );
        trace!(listener = id, path, "listener registered");
        on_change(current);

        Ok(Subscription {
            id,
            path: path.to_string(),
            registry: Arc::downgrade(self),
        })
    }

    fn remove(&self, id: u64) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn targets(&self, filter: impl Fn(&Listener) -> bool) -> Vec<(u64, String, ChangeFn, Option<Value>)> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, l)| filter(l))
            .map(|(id, l)| (*id, l.path.clone(), Arc::clone(&l.on_change), l.last.clone()))
            .collect()
    }

    fn remember(&self, id: u64, value: &Option<Value>) {
        if let Some(l) = self.entries.lock().get_mut(&id) {
            l.last = value.clone();
        }
    }

    /// Deliver fresh values to every listener related to `changed`.
    /// `read` is called once per listener path, outside the registry lock.
    pub fn notify(&self, changed: &str, read: impl Fn(&str) -> Option<Value>) {
        let _delivery = self.delivery.lock();
        for (id, path, on_change, _) in self.targets(|l| paths_overlap(&l.path, changed)) {
            let value = read(&path);
            self.remember(id, &value);
            on_change(value);
        }
    }

    /// Re-read every listener path and deliver the ones whose value differs
    /// from what the listener last received. Returns the number delivered.
    pub fn refresh(&self, read: impl Fn(&str) -> AppResult<Option<Value>>) -> usize {
        let _delivery = self.delivery.lock();
        let mut delivered = 0;
        for (id, path, on_change, last) in self.targets(|_| true) {
            let value = match read(&path) {
                Ok(v) => v,
                Err(e) => {
                    warn!(path = %path, error = %e, "refresh read failed");
                    continue;
                }
            };
            if value == last {
                continue;
            }
            self.remember(id, &value);
            on_change(value);
            delivered += 1;
        }
        delivered
    }

    /// Report `err` to every listener.
    pub fn fail_all(&self, err: &AppError) {
        let targets: Vec<ErrorFn> = self
            .entries
            .lock()
            .values()
            .map(|l| Arc::clone(&l.on_error))
            .collect();

        for on_error in targets {
            on_error(err);
        }
    }
}

/// Handle for an active listener. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    path: String,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade()
            && registry.remove(self.id)
        {
            trace!(listener = self.id, path = %self.path, "listener removed");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}
