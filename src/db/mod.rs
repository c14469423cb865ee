//! Backend collaborator: an opaque key-value tree that pushes changes.
//!
//! Paths are `/`-separated (`truck-loading/bay3`, `clocked-times/<id>`).
//! The value of a path is the node stored there or, when nothing is stored
//! at that exact path, an object made of its direct children.

pub mod listeners;
pub mod memory;
pub mod sqlite;

use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub use listeners::Subscription;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub const BAYS_ROOT: &str = "truck-loading";
pub const CLOCKED_TIMES_ROOT: &str = "clocked-times";

pub fn bay_path(bay: impl std::fmt::Display) -> String {
    format!("{BAYS_ROOT}/{bay}")
}

pub fn clocked_time_path(id: &str) -> String {
    format!("{CLOCKED_TIMES_ROOT}/{id}")
}

/// Called with the current value of a watched path (`None` = nothing there).
pub type ChangeFn = Arc<dyn Fn(Option<Value>) + Send + Sync>;
/// Called when a watched path can no longer be delivered.
pub type ErrorFn = Arc<dyn Fn(&AppError) + Send + Sync>;

#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Watch `path`. The current value is delivered before this returns,
    /// then again after every change touching the path, one of its
    /// ancestors or one of its descendants.
    async fn subscribe(
        &self,
        path: &str,
        on_change: ChangeFn,
        on_error: ErrorFn,
    ) -> AppResult<Subscription>;

    /// One-shot read.
    async fn get(&self, path: &str) -> AppResult<Option<Value>>;

    /// Replace the node at `path`, dropping anything stored below it.
    async fn write(&self, path: &str, value: Value) -> AppResult<()>;

    /// Remove `path` and everything below it.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Merge `fields` into the object at `path`, creating it when absent.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> AppResult<()>;

    /// Fresh child key under `path`. Nothing is written.
    async fn generate_id(&self, path: &str) -> AppResult<String>;
}

/// Time-ordered unique key for new children.
pub fn new_key() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Two paths are related when one equals or contains the other.
pub(crate) fn paths_overlap(a: &str, b: &str) -> bool {
    a == b || is_below(a, b) || is_below(b, a)
}

/// `child` lies strictly below `parent`.
pub(crate) fn is_below(child: &str, parent: &str) -> bool {
    child.len() > parent.len()
        && child.starts_with(parent)
        && child.as_bytes()[parent.len()] == b'/'
}

/// Value of `path` within a flat `path -> node` table: the exact node, or an
/// object of its direct children (recursively assembled).
pub(crate) fn assemble(nodes: &BTreeMap<String, Value>, path: &str) -> Option<Value> {
    if let Some(v) = nodes.get(path) {
        return Some(v.clone());
    }

    let prefix = format!("{path}/");
    let children: BTreeSet<&str> = nodes
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&prefix))
        .filter_map(|(k, _)| k[prefix.len()..].split('/').next())
        .collect();

    if children.is_empty() {
        return None;
    }

    let mut obj = Map::new();
    for child in children {
        if let Some(v) = assemble(nodes, &format!("{prefix}{child}")) {
            obj.insert(child.to_string(), v);
        }
    }
    Some(Value::Object(obj))
}

/// Merge `fields` into `current`, turning non-objects into objects.
pub(crate) fn merge_fields(current: Option<Value>, fields: Map<String, Value>) -> Value {
    let mut obj = match current {
        Some(Value::Object(m)) => m,
        _ => Map::new(),
    };
    for (k, v) in fields {
        obj.insert(k, v);
    }
    Value::Object(obj)
}
