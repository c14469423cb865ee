//! In-process push store.
//!
//! Holds the whole tree in memory and notifies listeners synchronously.
//! Failure switches make it possible to exercise the error paths of the
//! bay store without a real backend.

use super::listeners::ListenerRegistry;
use super::{
    ChangeFn, ErrorFn, RealtimeStore, Subscription, assemble, is_below, merge_fields, new_key,
    paths_overlap,
};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

pub struct MemoryStore {
    nodes: RwLock<BTreeMap<String, Value>>,
    listeners: Arc<ListenerRegistry>,
    offline: AtomicBool,
    denied: AtomicBool,
    failing: Mutex<Vec<String>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
            listeners: ListenerRegistry::new(),
            offline: AtomicBool::new(false),
            denied: AtomicBool::new(false),
            failing: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `BackendUnavailable`. Active listeners are
    /// told through their error callback.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        if offline {
            self.listeners
                .fail_all(&AppError::BackendUnavailable("connection lost".into()));
        }
    }

    /// Make every call fail with `PermissionDenied`.
    pub fn set_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    /// Fail writes, updates and deletes touching `path`.
    pub fn fail_writes_to(&self, path: &str) {
        self.failing.lock().push(path.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
        self.offline.store(false, Ordering::SeqCst);
        self.denied.store(false, Ordering::SeqCst);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn check_access(&self, path: &str) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::BackendUnavailable(format!("{path}: offline")));
        }
        if self.denied.load(Ordering::SeqCst) {
            return Err(AppError::PermissionDenied(path.to_string()));
        }
        Ok(())
    }

    fn check_write(&self, path: &str) -> AppResult<()> {
        self.check_access(path)?;
        if self
            .failing
            .lock()
            .iter()
            .any(|p| paths_overlap(p, path))
        {
            return Err(AppError::BackendUnavailable(format!(
                "{path}: write rejected"
            )));
        }
        Ok(())
    }

    fn read(&self, path: &str) -> Option<Value> {
        assemble(&self.nodes.read(), path)
    }

    fn remove_subtree(nodes: &mut BTreeMap<String, Value>, path: &str) {
        nodes.retain(|k, _| k != path && !is_below(k, path));
    }

    fn changed(&self, path: &str) {
        self.listeners.notify(path, |p| self.read(p));
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn subscribe(
        &self,
        path: &str,
        on_change: ChangeFn,
        on_error: ErrorFn,
    ) -> AppResult<Subscription> {
        self.check_access(path)?;
        self.listeners
            .register(path, on_change, on_error, |p| Ok(self.read(p)))
    }

    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        self.check_access(path)?;
        Ok(self.read(path))
    }

    async fn write(&self, path: &str, value: Value) -> AppResult<()> {
        self.check_write(path)?;
        {
            let mut nodes = self.nodes.write();
            Self::remove_subtree(&mut nodes, path);
            nodes.insert(path.to_string(), value);
        }
        debug!(path, "memory write");
        self.changed(path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.check_write(path)?;
        Self::remove_subtree(&mut self.nodes.write(), path);
        debug!(path, "memory delete");
        self.changed(path);
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> AppResult<()> {
        self.check_write(path)?;
        {
            let mut nodes = self.nodes.write();
            let merged = merge_fields(assemble(&nodes, path), fields);
            Self::remove_subtree(&mut nodes, path);
            nodes.insert(path.to_string(), merged);
        }
        debug!(path, "memory update");
        self.changed(path);
        Ok(())
    }

    async fn generate_id(&self, path: &str) -> AppResult<String> {
        self.check_access(path)?;
        Ok(new_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;
    use serde_json::json;

    fn recorder() -> (Arc<PlMutex<Vec<Option<Value>>>>, ChangeFn) {
        let seen = Arc::new(PlMutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let cb: ChangeFn = Arc::new(move |v: Option<Value>| s.lock().push(v));
        (seen, cb)
    }

    fn ignore_errors() -> ErrorFn {
        Arc::new(|_: &AppError| {})
    }

    #[tokio::test]
    async fn subscribe_delivers_current_value_then_changes() {
        let store = MemoryStore::new();
        store.write("truck-loading/bay1", json!({"truck": "A"})).await.unwrap();

        let (seen, cb) = recorder();
        let _sub = store
            .subscribe("truck-loading/bay1", cb, ignore_errors())
            .await
            .unwrap();

        store.delete("truck-loading/bay1").await.unwrap();
        store.write("truck-loading/bay2", json!({"truck": "B"})).await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Some(json!({"truck": "A"})));
        assert_eq!(seen[1], None);
    }

    #[tokio::test]
    async fn parent_delete_clears_children() {
        let store = MemoryStore::new();
        store.write("clocked-times/a", json!(1)).await.unwrap();
        store.write("clocked-times/b", json!(2)).await.unwrap();
        assert_eq!(
            store.get("clocked-times").await.unwrap(),
            Some(json!({"a": 1, "b": 2}))
        );

        store.delete("clocked-times").await.unwrap();
        assert_eq!(store.get("clocked-times").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = MemoryStore::new();
        store
            .write("truck-loading/bay3", json!({"truck": "Z", "startedAt": 9}))
            .await
            .unwrap();
        let mut fields = Map::new();
        fields.insert("clockedTimes".into(), json!([]));
        store.update("truck-loading/bay3", fields).await.unwrap();

        assert_eq!(
            store.get("truck-loading/bay3").await.unwrap(),
            Some(json!({"truck": "Z", "startedAt": 9, "clockedTimes": []}))
        );
    }

    #[tokio::test]
    async fn failure_switches() {
        let store = MemoryStore::new();
        store.fail_writes_to("truck-loading/bay2");
        assert!(store.write("truck-loading/bay1", json!(1)).await.is_ok());
        assert!(matches!(
            store.delete("truck-loading/bay2").await,
            Err(AppError::BackendUnavailable(_))
        ));

        store.set_denied(true);
        assert!(matches!(
            store.get("clocked-times").await,
            Err(AppError::PermissionDenied(_))
        ));

        store.clear_failures();
        assert!(store.delete("truck-loading/bay2").await.is_ok());
    }

    #[tokio::test]
    async fn going_offline_reports_to_listeners() {
        let store = MemoryStore::new();
        let errors = Arc::new(PlMutex::new(0usize));
        let e = Arc::clone(&errors);
        let (_, cb) = recorder();
        let _sub = store
            .subscribe(
                "truck-loading/bay1",
                cb,
                Arc::new(move |_: &AppError| *e.lock() += 1),
            )
            .await
            .unwrap();

        store.set_offline(true);
        assert_eq!(*errors.lock(), 1);
        assert!(store.get("truck-loading/bay1").await.is_err());
    }
}
