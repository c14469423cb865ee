//! Elapsed-time and status evaluation for a single bay.
//!
//! Everything here is a pure function of the bay record and "now"; the
//! ticker and the CLI decide when to call it.

use crate::models::{Bay, BayId, DisplayBay, StatusTier};
use crate::utils::time::{elapsed_seconds, format_hms};
use std::collections::BTreeMap;

pub const WARNING_SECONDS: u64 = 45 * 60;
pub const OVERTIME_SECONDS: u64 = 60 * 60;

/// Status thresholds in seconds. Both comparisons are strict (`>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub warning_seconds: u64,
    pub overtime_seconds: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_seconds: WARNING_SECONDS,
            overtime_seconds: OVERTIME_SECONDS,
        }
    }
}

/// Result of evaluating one `started_at` against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub elapsed_seconds: u64,
    pub tier: StatusTier,
}

impl Evaluation {
    pub fn elapsed_time(&self) -> String {
        format_hms(self.elapsed_seconds)
    }
}

/// Evaluate a bay that started loading at `started_at` (0 = idle).
pub fn evaluate(started_at: u64, now: u64, thresholds: &Thresholds) -> Evaluation {
    if started_at == 0 {
        return Evaluation {
            elapsed_seconds: 0,
            tier: StatusTier::Available,
        };
    }

    let elapsed = elapsed_seconds(started_at, now);
    let tier = if elapsed > thresholds.overtime_seconds {
        StatusTier::Overtime
    } else if elapsed > thresholds.warning_seconds {
        StatusTier::Warning
    } else {
        StatusTier::OnTrack
    };

    Evaluation {
        elapsed_seconds: elapsed,
        tier,
    }
}

pub fn display_bay(id: BayId, bay: &Bay, thresholds: &Thresholds, now: u64) -> DisplayBay {
    let eval = evaluate(bay.started_at, now, thresholds);
    DisplayBay {
        id,
        truck: if bay.is_active() {
            bay.truck.clone()
        } else {
            String::new()
        },
        started_at: bay.started_at,
        elapsed_time: eval.elapsed_time(),
        elapsed_seconds: eval.elapsed_seconds,
        tier: eval.tier,
        status: eval.tier.label(),
        status_class: eval.tier.css_class(),
        clocked_times: bay.clocked_times.clone().unwrap_or_default(),
    }
}

/// Placeholder for a bay with no record in the store.
pub fn default_display_bay(id: BayId) -> DisplayBay {
    DisplayBay {
        id,
        truck: String::new(),
        started_at: 0,
        elapsed_time: format_hms(0),
        elapsed_seconds: 0,
        tier: StatusTier::Available,
        status: StatusTier::Available.label(),
        status_class: StatusTier::Available.css_class(),
        clocked_times: Vec::new(),
    }
}

/// Recompute the whole board: one entry per bay `1..=num_bays`, in order.
pub fn recompute_all(
    bays: &BTreeMap<BayId, Bay>,
    num_bays: u32,
    thresholds: &Thresholds,
    now: u64,
) -> Vec<DisplayBay> {
    BayId::all(num_bays)
        .map(|id| match bays.get(&id) {
            Some(bay) => display_bay(id, bay, thresholds, now),
            None => default_display_bay(id),
        })
        .collect()
}
