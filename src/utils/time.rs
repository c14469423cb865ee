//! Time utilities: HH:MM:SS durations, epoch milliseconds, clocks.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Source of "now" for the store and the ticker.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        epoch_ms()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.now.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Whole seconds elapsed since `started_at`, clamped at zero.
pub fn elapsed_seconds(started_at: u64, now: u64) -> u64 {
    now.saturating_sub(started_at) / 1000
}

/// `HH:MM:SS`, every field padded to two digits. Hours are never wrapped.
pub fn format_hms(total_seconds: u64) -> String {
    let h = total_seconds / 3600;
    let m = (total_seconds % 3600) / 60;
    let s = total_seconds % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Inverse of [`format_hms`]. Anything that is not three numeric fields,
/// or does not fit in a `u64` of seconds, counts as zero.
pub fn parse_hms(s: &str) -> u64 {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 3 {
        return 0;
    }

    let mut fields = [0u64; 3];
    for (slot, part) in fields.iter_mut().zip(parts) {
        match part.parse::<u64>() {
            Ok(v) => *slot = v,
            Err(_) => return 0,
        }
    }

    fields[0]
        .checked_mul(3600)
        .and_then(|h| fields[1].checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(fields[2]))
        .unwrap_or(0)
}

/// UTC instant for an epoch-millisecond timestamp.
pub fn utc_from_ms(ms: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms as i64).unwrap_or_default()
}

/// Calendar date (`YYYY-MM-DD`, UTC) of an epoch-millisecond timestamp.
pub fn date_of_ms(ms: u64) -> String {
    utc_from_ms(ms).format("%Y-%m-%d").to_string()
}
