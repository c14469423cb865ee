//! Bay state store.
//!
//! Keeps the in-memory mapping `bay id -> Bay` in step with the backend
//! (one listener per bay) and publishes a full, immutable snapshot to every
//! subscriber on each change. Writes go straight to the backend; the local
//! mapping only changes when the backend pushes the result back.

use crate::config::Config;
use crate::core::calculator::stats::{self, Summary};
use crate::core::calculator::status::{Thresholds, recompute_all};
use crate::db::{
    CLOCKED_TIMES_ROOT, ChangeFn, ErrorFn, RealtimeStore, Subscription, bay_path,
    clocked_time_path,
};
use crate::errors::{AppError, AppResult};
use crate::models::{Bay, BayId, ClockedTime, DisplayBay};
use crate::utils::time::{Clock, SystemClock, date_of_ms, elapsed_seconds, format_hms};
use futures_util::future::join_all;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub type BayMap = BTreeMap<BayId, Bay>;
pub type Snapshot = Arc<BayMap>;

pub struct BayStore {
    backend: Arc<dyn RealtimeStore>,
    clock: Arc<dyn Clock>,
    num_bays: u32,
    thresholds: Thresholds,
    state: Arc<watch::Sender<Snapshot>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl BayStore {
    pub fn new(backend: Arc<dyn RealtimeStore>, num_bays: u32, thresholds: Thresholds) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(BayMap::new()));
        Self {
            backend,
            clock: Arc::new(SystemClock),
            num_bays,
            thresholds,
            state: Arc::new(tx),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(backend: Arc<dyn RealtimeStore>, cfg: &Config) -> Self {
        Self::new(backend, cfg.num_bays, cfg.thresholds())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build a store and start listening to every bay.
    pub async fn attach(backend: Arc<dyn RealtimeStore>, cfg: &Config) -> AppResult<Self> {
        let store = Self::from_config(backend, cfg);
        store.listen().await?;
        Ok(store)
    }

    pub fn num_bays(&self) -> u32 {
        self.num_bays
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn bay_id(&self, raw: &str) -> AppResult<BayId> {
        BayId::parse_within(raw, self.num_bays)
    }

    // ---------------------------
    // Subscriptions
    // ---------------------------

    /// Subscribe to every bay `1..=N`. Already-active listeners are kept.
    pub async fn listen(&self) -> AppResult<()> {
        if !self.subscriptions.lock().is_empty() {
            return Ok(());
        }

        let mut subs = Vec::with_capacity(self.num_bays as usize);
        for id in BayId::all(self.num_bays) {
            let path = bay_path(id);
            debug!(bay = %id, path = %path, "subscribing");
            let sub = self
                .backend
                .subscribe(&path, self.change_handler(id), Self::error_handler(id))
                .await?;
            subs.push(sub);
        }

        *self.subscriptions.lock() = subs;
        info!(bays = self.num_bays, "bay listeners attached");
        Ok(())
    }

    /// Release every backend listener.
    pub fn detach(&self) {
        let subs = std::mem::take(&mut *self.subscriptions.lock());
        if !subs.is_empty() {
            info!(count = subs.len(), "bay listeners released");
        }
    }

    fn change_handler(&self, id: BayId) -> ChangeFn {
        let state = Arc::clone(&self.state);
        Arc::new(move |value: Option<Value>| {
            let incoming = match value {
                None | Some(Value::Null) => None,
                Some(v) => match serde_json::from_value::<Bay>(v) {
                    Ok(bay) => Some(bay),
                    Err(e) => {
                        warn!(bay = %id, error = %e, "ignoring undecodable bay record");
                        return;
                    }
                },
            };
            apply_change(&state, id, incoming);
        })
    }

    fn error_handler(id: BayId) -> ErrorFn {
        Arc::new(move |err: &AppError| {
            error!(bay = %id, error = %err, "bay listener failed");
        })
    }

    /// Receiver of full snapshots. Dropping it unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.state.borrow())
    }

    pub fn lookup(&self, id: BayId) -> Option<Bay> {
        self.state.borrow().get(&id).cloned()
    }

    /// Board for "now": one entry per bay, idle bays synthesized.
    pub fn board(&self) -> Vec<DisplayBay> {
        recompute_all(
            &self.snapshot(),
            self.num_bays,
            &self.thresholds,
            self.now_ms(),
        )
    }

    pub fn active_bays_count(&self) -> usize {
        self.state.borrow().values().filter(|b| b.is_active()).count()
    }

    /// Clocked times cached on the bay record (may lag the history).
    pub fn clocked_times(&self, id: BayId) -> Vec<ClockedTime> {
        self.lookup(id)
            .and_then(|b| b.clocked_times)
            .unwrap_or_default()
    }

    // ---------------------------
    // Bay actions
    // ---------------------------

    /// Start a loading session, replacing whatever the bay held before.
    /// Concurrent starts from several clients: the last write wins.
    pub async fn start_loading(&self, id: BayId, truck: &str) -> AppResult<()> {
        let bay = Bay::new(id, truck.trim(), self.now_ms());
        info!(bay = %id, truck = %bay.truck, "start loading");
        self.backend
            .write(&bay_path(id), serde_json::to_value(&bay)?)
            .await
    }

    pub async fn reset_bay(&self, id: BayId) -> AppResult<()> {
        info!(bay = %id, "reset bay");
        self.backend.delete(&bay_path(id)).await
    }

    /// One independent delete per bay. Failures do not undo the bays that
    /// were already cleared.
    pub async fn reset_all_bays(&self) -> AppResult<()> {
        let backend = &self.backend;
        let results = join_all(BayId::all(self.num_bays).map(|id| async move {
            (id, backend.delete(&bay_path(id)).await)
        }))
        .await;

        let mut failed = Vec::new();
        let mut succeeded = 0;
        for (id, res) in results {
            match res {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    warn!(bay = %id, error = %e, "reset failed");
                    failed.push(id.to_string());
                }
            }
        }

        if failed.is_empty() {
            info!(bays = succeeded, "all bays reset");
            Ok(())
        } else {
            Err(AppError::PartialFailure { failed, succeeded })
        }
    }

    /// Record the elapsed time of an active bay.
    ///
    /// Writes the record into the history, then appends it to the bay's own
    /// cache. The two writes are independent: if the second fails, the
    /// history keeps the record and the error is returned.
    pub async fn clock_time(&self, id: BayId) -> AppResult<ClockedTime> {
        let bay = match self.lookup(id) {
            Some(b) if b.is_active() => b,
            _ => {
                return Err(AppError::InvalidState(format!("{id} is not active")));
            }
        };

        let now = self.now_ms();
        let total_seconds = elapsed_seconds(bay.started_at, now);
        let key = self.backend.generate_id(CLOCKED_TIMES_ROOT).await?;

        let record = ClockedTime {
            id: key.clone(),
            bay_id: id.to_string(),
            bay_number: id.number().to_string(),
            truck_number: bay.truck.clone(),
            elapsed_time: format_hms(total_seconds),
            total_seconds,
            clocked_at: now,
            date: date_of_ms(now),
        };

        self.backend
            .write(&clocked_time_path(&key), serde_json::to_value(&record)?)
            .await?;

        let mut cache = bay.clocked_times.unwrap_or_default();
        cache.push(record.clone());
        let mut fields = Map::new();
        fields.insert("clockedTimes".into(), serde_json::to_value(&cache)?);
        if let Err(e) = self.backend.update(&bay_path(id), fields).await {
            warn!(bay = %id, record = %key, error = %e, "clocked time saved without bay cache");
            return Err(e);
        }

        info!(bay = %id, elapsed = %record.elapsed_time, record = %key, "time clocked");
        Ok(record)
    }

    // ---------------------------
    // History
    // ---------------------------

    /// Every clocked-time record, in backend order.
    pub async fn all_clocked_times(&self) -> AppResult<Vec<ClockedTime>> {
        let Some(value) = self.backend.get(CLOCKED_TIMES_ROOT).await? else {
            return Ok(Vec::new());
        };
        let Value::Object(entries) = value else {
            warn!("clocked-times is not an object, treating as empty");
            return Ok(Vec::new());
        };

        let mut out = Vec::with_capacity(entries.len());
        for (key, v) in entries {
            match serde_json::from_value::<ClockedTime>(v) {
                Ok(mut rec) => {
                    rec.id = key;
                    out.push(rec);
                }
                Err(e) => warn!(record = %key, error = %e, "skipping undecodable clocked time"),
            }
        }
        Ok(out)
    }

    pub async fn clocked_times_by_bay(&self, id: BayId) -> AppResult<Vec<ClockedTime>> {
        let mut out = stats::filter_by_bay(&self.all_clocked_times().await?, &id.to_string());
        stats::sort_newest_first(&mut out);
        Ok(out)
    }

    pub async fn clocked_times_by_date_range(
        &self,
        from: &str,
        to: &str,
    ) -> AppResult<Vec<ClockedTime>> {
        let mut out = stats::filter_by_date_range(&self.all_clocked_times().await?, from, to);
        stats::sort_newest_first(&mut out);
        Ok(out)
    }

    pub async fn clocked_times_by_truck(&self, truck: &str) -> AppResult<Vec<ClockedTime>> {
        let mut out = stats::filter_by_truck_exact(&self.all_clocked_times().await?, truck);
        stats::sort_newest_first(&mut out);
        Ok(out)
    }

    pub async fn recent_clocked_times(&self, limit: usize) -> AppResult<Vec<ClockedTime>> {
        Ok(stats::recent(&self.all_clocked_times().await?, limit))
    }

    pub async fn clocked_times_count(&self) -> AppResult<usize> {
        Ok(self.all_clocked_times().await?.len())
    }

    pub async fn completed_on(&self, date: &str) -> AppResult<usize> {
        Ok(stats::completed_on(&self.all_clocked_times().await?, date))
    }

    pub async fn clocked_time_stats(&self) -> AppResult<Summary> {
        Ok(stats::summarize(&self.all_clocked_times().await?))
    }

    pub async fn delete_clocked_time(&self, record_id: &str) -> AppResult<()> {
        info!(record = record_id, "delete clocked time");
        self.backend.delete(&clocked_time_path(record_id)).await
    }

    pub async fn clear_all_clocked_times(&self) -> AppResult<()> {
        info!("clearing all clocked times");
        self.backend.delete(CLOCKED_TIMES_ROOT).await
    }

    /// One read of the history collection; any failure means "no".
    pub async fn is_collection_accessible(&self) -> bool {
        match self.backend.get(CLOCKED_TIMES_ROOT).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "clocked-times not accessible");
                false
            }
        }
    }
}

impl Drop for BayStore {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Replace the snapshot with a copy carrying the change for `id`.
fn apply_change(state: &watch::Sender<Snapshot>, id: BayId, incoming: Option<Bay>) {
    state.send_modify(|current| {
        let mut next = (**current).clone();
        match incoming {
            Some(bay) => {
                debug!(bay = %id, "bay updated");
                next.insert(id, bay);
            }
            None => {
                debug!(bay = %id, "bay cleared");
                next.remove(&id);
            }
        }
        *current = Arc::new(next);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::StatusTier;
    use crate::utils::time::ManualClock;
    use serde_json::json;

    const T0: u64 = 1_750_000_000_000;

    async fn setup() -> (Arc<MemoryStore>, BayStore, ManualClock) {
        let backend = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(T0);
        let store = BayStore::new(backend.clone(), 7, Thresholds::default())
            .with_clock(Arc::new(clock.clone()));
        store.listen().await.unwrap();
        (backend, store, clock)
    }

    fn bay(n: u32) -> BayId {
        BayId::new(n).unwrap()
    }

    #[tokio::test]
    async fn start_loading_reaches_the_snapshot() {
        let (_backend, store, _clock) = setup().await;
        store.start_loading(bay(1), "TRK-9").await.unwrap();

        let b = store.lookup(bay(1)).unwrap();
        assert_eq!(b.truck, "TRK-9");
        assert_eq!(b.started_at, T0);
        assert_eq!(store.active_bays_count(), 1);
    }

    #[tokio::test]
    async fn subscribers_get_full_snapshots() {
        let (_backend, store, _clock) = setup().await;
        let mut rx = store.subscribe();

        store.start_loading(bay(1), "A").await.unwrap();
        store.start_loading(bay(2), "B").await.unwrap();

        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.len(), 2);
    }

    #[tokio::test]
    async fn old_snapshots_stay_consistent() {
        let (_backend, store, _clock) = setup().await;
        store.start_loading(bay(4), "A").await.unwrap();
        let before = store.snapshot();

        store.reset_bay(bay(4)).await.unwrap();
        assert!(before.contains_key(&bay(4)));
        assert!(!store.snapshot().contains_key(&bay(4)));
    }

    #[tokio::test]
    async fn reset_bay_removes_entry() {
        let (_backend, store, _clock) = setup().await;
        store.start_loading(bay(3), "X").await.unwrap();
        store.reset_bay(bay(3)).await.unwrap();
        assert!(store.lookup(bay(3)).is_none());
    }

    #[tokio::test]
    async fn external_pushes_update_the_mapping() {
        let (backend, store, _clock) = setup().await;
        backend
            .write("truck-loading/bay6", json!({"id": "bay6", "truck": "EXT", "startedAt": T0}))
            .await
            .unwrap();
        assert_eq!(store.lookup(bay(6)).unwrap().truck, "EXT");

        // undecodable payloads leave the previous value in place
        backend
            .write("truck-loading/bay6", json!({"startedAt": "soon"}))
            .await
            .unwrap();
        assert_eq!(store.lookup(bay(6)).unwrap().truck, "EXT");
    }

    #[tokio::test]
    async fn start_overwrites_running_session() {
        let (_backend, store, clock) = setup().await;
        store.start_loading(bay(2), "FIRST").await.unwrap();
        clock.advance_secs(60);
        store.start_loading(bay(2), "SECOND").await.unwrap();

        let b = store.lookup(bay(2)).unwrap();
        assert_eq!(b.truck, "SECOND");
        assert_eq!(b.started_at, T0 + 60_000);
    }

    #[tokio::test]
    async fn clock_time_on_idle_bay_is_rejected() {
        let (backend, store, _clock) = setup().await;
        let err = store.clock_time(bay(2)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(backend.get(CLOCKED_TIMES_ROOT).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clock_time_writes_history_and_cache() {
        let (_backend, store, clock) = setup().await;
        store.start_loading(bay(5), "TR-5").await.unwrap();
        clock.advance_secs(2701);

        let rec = store.clock_time(bay(5)).await.unwrap();
        assert_eq!(rec.total_seconds, 2701);
        assert_eq!(rec.elapsed_time, "00:45:01");
        assert_eq!(rec.bay_number, "5");
        assert_eq!(rec.truck_number, "TR-5");
        assert_eq!(rec.date, date_of_ms(T0 + 2_701_000));

        let history = store.all_clocked_times().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, rec.id);

        let cached = store.clocked_times(bay(5));
        assert_eq!(cached, vec![rec.clone()]);
        // the session itself keeps running
        assert!(store.lookup(bay(5)).unwrap().is_active());
    }

    #[tokio::test]
    async fn failed_cache_write_keeps_history_record() {
        let (backend, store, _clock) = setup().await;
        store.start_loading(bay(1), "T").await.unwrap();
        backend.fail_writes_to("truck-loading/bay1");

        let err = store.clock_time(bay(1)).await.unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));
        assert_eq!(store.clocked_times_count().await.unwrap(), 1);
        assert!(store.clocked_times(bay(1)).is_empty());
    }

    #[tokio::test]
    async fn reset_all_reports_partial_failure() {
        let (backend, store, _clock) = setup().await;
        for n in 1..=3 {
            store.start_loading(bay(n), "T").await.unwrap();
        }
        backend.fail_writes_to("truck-loading/bay2");

        match store.reset_all_bays().await {
            Err(AppError::PartialFailure { failed, succeeded }) => {
                assert_eq!(failed, vec!["bay2".to_string()]);
                assert_eq!(succeeded, 6);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(store.lookup(bay(1)).is_none());
        assert!(store.lookup(bay(2)).is_some());
        assert!(store.lookup(bay(3)).is_none());
    }

    #[tokio::test]
    async fn backend_outage_leaves_state_unchanged() {
        let (backend, store, _clock) = setup().await;
        store.start_loading(bay(1), "KEEP").await.unwrap();
        backend.set_offline(true);

        assert!(matches!(
            store.reset_bay(bay(1)).await,
            Err(AppError::BackendUnavailable(_))
        ));
        assert_eq!(store.lookup(bay(1)).unwrap().truck, "KEEP");
        assert!(!store.is_collection_accessible().await);
    }

    #[tokio::test]
    async fn history_queries() {
        let (_backend, store, clock) = setup().await;
        store.start_loading(bay(1), "AA").await.unwrap();
        store.start_loading(bay(2), "BB").await.unwrap();
        clock.advance_secs(100);
        let first = store.clock_time(bay(1)).await.unwrap();
        clock.advance_secs(200);
        let second = store.clock_time(bay(2)).await.unwrap();
        clock.advance_secs(1);
        let third = store.clock_time(bay(1)).await.unwrap();

        let by_bay: Vec<String> = store
            .clocked_times_by_bay(bay(1))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(by_bay, vec![third.id.clone(), first.id.clone()]);

        assert_eq!(store.clocked_times_by_truck("BB").await.unwrap(), vec![second.clone()]);
        assert_eq!(store.recent_clocked_times(1).await.unwrap()[0].id, third.id);

        let day = first.date.clone();
        assert_eq!(store.clocked_times_by_date_range(&day, &day).await.unwrap().len(), 3);
        assert_eq!(store.completed_on(&day).await.unwrap(), 3);

        let summary = store.clocked_time_stats().await.unwrap();
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.total_seconds, 100 + 300 + 301);

        store.delete_clocked_time(&first.id).await.unwrap();
        assert_eq!(store.clocked_times_count().await.unwrap(), 2);
        store.clear_all_clocked_times().await.unwrap();
        assert_eq!(store.clocked_times_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn board_synthesizes_idle_bays() {
        let (_backend, store, clock) = setup().await;
        store.start_loading(bay(1), "W").await.unwrap();
        clock.advance_secs(2701);

        let board = store.board();
        assert_eq!(board.len(), 7);
        assert_eq!(board[0].tier, StatusTier::Warning);
        assert_eq!(board[0].elapsed_time, "00:45:01");
        assert_eq!(board[1].tier, StatusTier::Available);
    }

    #[tokio::test]
    async fn detach_releases_listeners() {
        let (backend, store, _clock) = setup().await;
        assert_eq!(backend.listener_count(), 7);
        store.detach();
        assert_eq!(backend.listener_count(), 0);

        backend
            .write("truck-loading/bay1", json!({"truck": "LATE", "startedAt": 1}))
            .await
            .unwrap();
        assert!(store.lookup(bay(1)).is_none());
    }

    #[tokio::test]
    async fn attach_from_config_loads_existing_state() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .write("truck-loading/bay2", json!({"id": "bay2", "truck": "PRE", "startedAt": 5}))
            .await
            .unwrap();
        let cfg = Config::default();
        let store = BayStore::attach(backend, &cfg).await.unwrap();
        assert_eq!(store.lookup(bay(2)).unwrap().truck, "PRE");
        assert_eq!(store.num_bays(), 7);
    }

    #[tokio::test]
    async fn two_stores_on_one_database_stay_in_step() {
        use crate::db::SqliteStore;
        use std::time::Duration;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("site.sqlite");
        let file = file.to_str().unwrap();
        let open = || {
            Arc::new(
                SqliteStore::open(file)
                    .unwrap()
                    .with_poll_interval(Duration::from_millis(20)),
            )
        };

        let watcher = BayStore::new(open(), 7, Thresholds::default());
        let other = BayStore::new(open(), 7, Thresholds::default());
        watcher.listen().await.unwrap();
        other.listen().await.unwrap();
        let mut rx = watcher.subscribe();

        other.start_loading(bay(3), "EXT").await.unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|snap| snap.get(&bay(3)).is_some_and(|b| b.truck == "EXT")),
        )
        .await
        .expect("start from the other store never arrived")
        .unwrap();

        other.reset_bay(bay(3)).await.unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|snap| !snap.contains_key(&bay(3))),
        )
        .await
        .expect("reset from the other store never arrived")
        .unwrap();
        assert_eq!(watcher.active_bays_count(), 0);
    }
}

