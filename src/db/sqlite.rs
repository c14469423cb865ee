//! SQLite-backed push store.
//!
//! Every node of the tree is one row of `nodes(path, value)`, with the value
//! kept as JSON text. Changes made through this handle are pushed to its
//! listeners right away. Commits from other connections to the same file
//! (another process, or another handle) are picked up by polling
//! `PRAGMA data_version` while at least one listener is registered.

use super::listeners::ListenerRegistry;
use super::{
    ChangeFn, ErrorFn, RealtimeStore, Subscription, assemble, merge_fields, new_key,
};
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, TransactionBehavior, params};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS nodes (
    path       TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
";

/// How long a statement waits for another connection's lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default period of the external-change poll.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Create the schema if it does not exist yet.
pub fn init_db(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    listeners: Arc<ListenerRegistry>,
    poll_every: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl SqliteStore {
    pub fn open(path: &str) -> AppResult<Self> {
        let conn = Connection::open(Path::new(path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            listeners: ListenerRegistry::new(),
            poll_every: POLL_INTERVAL,
            poller: Mutex::new(None),
        })
    }

    /// Period for noticing commits made by other connections.
    pub fn with_poll_interval(mut self, every: Duration) -> Self {
        self.poll_every = every;
        self
    }

    /// Rows at `path` and below it.
    fn load_subtree(conn: &Connection, path: &str) -> rusqlite::Result<BTreeMap<String, Value>> {
        let mut stmt = conn.prepare_cached(
            "SELECT path, value FROM nodes
             WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'",
        )?;
        let rows = stmt.query_map([path], |row| {
            let p: String = row.get(0)?;
            let raw: String = row.get(1)?;
            Ok((p, raw))
        })?;

        let mut out = BTreeMap::new();
        for r in rows {
            let (p, raw) = r?;
            match serde_json::from_str(&raw) {
                Ok(v) => {
                    out.insert(p, v);
                }
                Err(e) => warn!(path = %p, error = %e, "skipping undecodable node"),
            }
        }
        Ok(out)
    }

    fn remove_subtree(conn: &Connection, path: &str) -> rusqlite::Result<usize> {
        conn.execute(
            "DELETE FROM nodes
             WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'",
            params![path],
        )
    }

    fn insert(conn: &Connection, path: &str, value: &Value) -> AppResult<()> {
        conn.execute(
            "INSERT INTO nodes (path, value) VALUES (?1, ?2)",
            params![path, value.to_string()],
        )
        .map_err(AppError::backend)?;
        Ok(())
    }

    fn read(&self, path: &str) -> AppResult<Option<Value>> {
        read_node(&self.conn, path)
    }

    fn changed(&self, path: &str) {
        self.listeners.notify(path, |p| match self.read(p) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = p, error = %e, "re-read after change failed");
                None
            }
        });
    }

    /// Replace the subtree at `path` with whatever `next` builds from the
    /// current value. Read and write share one write-locked transaction, so
    /// no other connection can commit in between.
    fn rewrite(
        &self,
        path: &str,
        next: impl FnOnce(Option<Value>) -> Value,
    ) -> AppResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(AppError::backend)?;
        let current = assemble(&Self::load_subtree(&tx, path).map_err(AppError::backend)?, path);
        let value = next(current);
        Self::remove_subtree(&tx, path).map_err(AppError::backend)?;
        Self::insert(&tx, path, &value)?;
        tx.commit().map_err(AppError::backend)?;
        Ok(())
    }

    /// Start the external-change poll unless it is already running.
    fn ensure_poller(&self) {
        let mut poller = self.poller.lock();
        if poller.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                *poller = Some(rt.spawn(poll_external_commits(
                    Arc::downgrade(&self.conn),
                    Arc::downgrade(&self.listeners),
                    self.poll_every,
                )));
                debug!(every_ms = self.poll_every.as_millis() as u64, "sqlite poller started");
            }
            Err(_) => warn!("no async runtime, commits from other connections will not be pushed"),
        }
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.lock().take() {
            handle.abort();
        }
    }
}

fn read_node(conn: &Mutex<Connection>, path: &str) -> AppResult<Option<Value>> {
    let conn = conn.lock();
    let nodes = SqliteStore::load_subtree(&conn, path).map_err(AppError::backend)?;
    Ok(assemble(&nodes, path))
}

/// Changes whenever another connection commits to the database file.
fn data_version(conn: &Mutex<Connection>) -> AppResult<i64> {
    conn.lock()
        .query_row("PRAGMA data_version", [], |row| row.get(0))
        .map_err(AppError::backend)
}

async fn poll_external_commits(
    db: Weak<Mutex<Connection>>,
    registry: Weak<ListenerRegistry>,
    every: Duration,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut seen: Option<i64> = None;

    loop {
        interval.tick().await;
        let (Some(conn), Some(listeners)) = (db.upgrade(), registry.upgrade()) else {
            break;
        };
        if listeners.is_empty() {
            continue;
        }

        let version = match data_version(&conn) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "data_version poll failed");
                continue;
            }
        };
        if seen.replace(version) == Some(version) {
            continue;
        }

        let delivered = listeners.refresh(|p| read_node(&conn, p));
        if delivered > 0 {
            debug!(delivered, version, "external changes pushed");
        }
    }
    trace!("sqlite poller stopped");
}

#[async_trait]
impl RealtimeStore for SqliteStore {
    async fn subscribe(
        &self,
        path: &str,
        on_change: ChangeFn,
        on_error: ErrorFn,
    ) -> AppResult<Subscription> {
        let sub = self
            .listeners
            .register(path, on_change, on_error, |p| self.read(p))?;
        self.ensure_poller();
        Ok(sub)
    }

    async fn get(&self, path: &str) -> AppResult<Option<Value>> {
        self.read(path)
    }

    async fn write(&self, path: &str, value: Value) -> AppResult<()> {
        self.rewrite(path, |_| value)?;
        debug!(path, "sqlite write");
        self.changed(path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let removed = {
            let conn = self.conn.lock();
            Self::remove_subtree(&conn, path).map_err(AppError::backend)?
        };
        debug!(path, removed, "sqlite delete");
        self.changed(path);
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> AppResult<()> {
        self.rewrite(path, |current| merge_fields(current, fields))?;
        debug!(path, "sqlite update");
        self.changed(path);
        Ok(())
    }

    async fn generate_id(&self, _path: &str) -> AppResult<String> {
        Ok(new_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<Option<Value>>>>, ChangeFn) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let cb: ChangeFn = Arc::new(move |v: Option<Value>| s.lock().push(v));
        (seen, cb)
    }

    fn ignore_errors() -> ErrorFn {
        Arc::new(|_: &AppError| {})
    }

    #[tokio::test]
    async fn write_read_delete_round() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .write("truck-loading/bay1", json!({"truck": "T", "startedAt": 1}))
            .await
            .unwrap();
        store.write("clocked-times/k1", json!({"totalSeconds": 5})).await.unwrap();

        assert_eq!(
            store.get("truck-loading").await.unwrap(),
            Some(json!({"bay1": {"truck": "T", "startedAt": 1}}))
        );

        store.delete("truck-loading/bay1").await.unwrap();
        assert_eq!(store.get("truck-loading/bay1").await.unwrap(), None);
        assert!(store.get("clocked-times/k1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sibling_prefixes_are_not_touched() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.write("truck-loading/bay1", json!(1)).await.unwrap();
        store.write("truck-loading/bay10", json!(10)).await.unwrap();

        store.delete("truck-loading/bay1").await.unwrap();
        assert_eq!(store.get("truck-loading/bay10").await.unwrap(), Some(json!(10)));
    }

    #[tokio::test]
    async fn update_then_notify() {
        let store = SqliteStore::open_in_memory().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let _sub = store
            .subscribe(
                "truck-loading/bay2",
                Arc::new(move |_: Option<Value>| {
                    h.fetch_add(1, Ordering::SeqCst);
                }),
                Arc::new(|_: &AppError| {}),
            )
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("truck".into(), json!("NEW"));
        store.update("truck-loading/bay2", fields).await.unwrap();

        // initial delivery + update
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(
            store.get("truck-loading/bay2").await.unwrap(),
            Some(json!({"truck": "NEW"}))
        );
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bays.sqlite");
        let file = file.to_str().unwrap();

        SqliteStore::open(file)
            .unwrap()
            .write("truck-loading/bay5", json!({"truck": "P"}))
            .await
            .unwrap();

        let reopened = SqliteStore::open(file).unwrap();
        assert_eq!(
            reopened.get("truck-loading/bay5").await.unwrap(),
            Some(json!({"truck": "P"}))
        );
    }

    #[tokio::test]
    async fn commits_from_another_handle_are_pushed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("shared.sqlite");
        let file = file.to_str().unwrap();

        let watcher = SqliteStore::open(file)
            .unwrap()
            .with_poll_interval(Duration::from_millis(20));
        let other = SqliteStore::open(file).unwrap();

        let (seen, cb) = recorder();
        let _sub = watcher
            .subscribe("truck-loading/bay3", cb, ignore_errors())
            .await
            .unwrap();
        assert_eq!(*seen.lock(), vec![None]);

        other
            .write("truck-loading/bay3", json!({"truck": "EXT", "startedAt": 7}))
            .await
            .unwrap();

        let expected = Some(json!({"truck": "EXT", "startedAt": 7}));
        for _ in 0..250 {
            if seen.lock().last() == Some(&expected) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(seen.lock().last(), Some(&expected));

        // unchanged values are not delivered again
        let count = seen.lock().len();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(seen.lock().len(), count);

        other.delete("truck-loading/bay3").await.unwrap();
        for _ in 0..250 {
            if seen.lock().last() == Some(&None) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(seen.lock().last(), Some(&None));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_updates_from_two_handles_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("race.sqlite");
        let file = file.to_str().unwrap().to_string();

        let a = Arc::new(SqliteStore::open(&file).unwrap());
        let b = Arc::new(SqliteStore::open(&file).unwrap());

        let writer = |store: Arc<SqliteStore>, tag: &'static str| {
            tokio::spawn(async move {
                for i in 0..25 {
                    let mut fields = Map::new();
                    fields.insert(format!("{tag}{i}"), json!(i));
                    store.update("truck-loading/bay1", fields).await.unwrap();
                }
            })
        };
        let (ra, rb) = tokio::join!(writer(Arc::clone(&a), "a"), writer(Arc::clone(&b), "b"));
        ra.unwrap();
        rb.unwrap();

        let node = a.get("truck-loading/bay1").await.unwrap().unwrap();
        assert_eq!(node.as_object().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn update_after_delete_does_not_restore_old_fields() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("reset.sqlite");
        let file = file.to_str().unwrap();
        let a = SqliteStore::open(file).unwrap();
        let b = SqliteStore::open(file).unwrap();

        a.write("truck-loading/bay1", json!({"truck": "OLD", "startedAt": 3}))
            .await
            .unwrap();
        b.delete("truck-loading/bay1").await.unwrap();

        let mut fields = Map::new();
        fields.insert("clockedTimes".into(), json!([]));
        a.update("truck-loading/bay1", fields).await.unwrap();

        assert_eq!(
            a.get("truck-loading/bay1").await.unwrap(),
            Some(json!({"clockedTimes": []}))
        );
    }
}
