//! Reductions over clocked-time records and over the live board.
//!
//! Nothing here fetches data or knows about output formats: callers pass
//! records in and render the returned structures however they like.

use crate::models::{BayId, ClockedTime, DisplayBay};
use crate::utils::time::format_hms;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

pub const TOP_TRUCKS: usize = 10;

// ---------------------------
// Filters
// ---------------------------

/// Records whose `date` lies in `[from, to]`. `YYYY-MM-DD` strings compare
/// lexicographically in calendar order.
pub fn filter_by_date_range(records: &[ClockedTime], from: &str, to: &str) -> Vec<ClockedTime> {
    records
        .iter()
        .filter(|r| r.date.as_str() >= from && r.date.as_str() <= to)
        .cloned()
        .collect()
}

pub fn filter_by_bay(records: &[ClockedTime], bay_id: &str) -> Vec<ClockedTime> {
    records
        .iter()
        .filter(|r| r.bay_id == bay_id)
        .cloned()
        .collect()
}

/// Records whose truck number contains `needle`.
pub fn filter_by_truck(
    records: &[ClockedTime],
    needle: &str,
    case_insensitive: bool,
) -> Vec<ClockedTime> {
    if case_insensitive {
        let needle = needle.to_lowercase();
        records
            .iter()
            .filter(|r| r.truck_number.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    } else {
        records
            .iter()
            .filter(|r| r.truck_number.contains(needle))
            .cloned()
            .collect()
    }
}

pub fn filter_by_truck_exact(records: &[ClockedTime], truck: &str) -> Vec<ClockedTime> {
    records
        .iter()
        .filter(|r| r.truck_number == truck)
        .cloned()
        .collect()
}

pub fn sort_newest_first(records: &mut [ClockedTime]) {
    records.sort_by_key(|r| Reverse(r.clocked_at));
}

/// The `limit` most recent records, newest first.
pub fn recent(records: &[ClockedTime], limit: usize) -> Vec<ClockedTime> {
    let mut out = records.to_vec();
    sort_newest_first(&mut out);
    out.truncate(limit);
    out
}

/// Records clocked on `date`.
pub fn completed_on(records: &[ClockedTime], date: &str) -> usize {
    records.iter().filter(|r| r.date == date).count()
}

// ---------------------------
// Summary
// ---------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BayBreakdown {
    pub bay_id: String,
    pub count: usize,
    pub total_seconds: u64,
    pub average_seconds: u64,
    pub unique_trucks: usize,
}

impl BayBreakdown {
    pub fn total_time(&self) -> String {
        format_hms(self.total_seconds)
    }

    pub fn average_time(&self) -> String {
        format_hms(self.average_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruckCount {
    pub truck_number: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_records: usize,
    pub total_seconds: u64,
    pub average_seconds: u64,
    /// Ascending by bay id.
    pub by_bay: Vec<BayBreakdown>,
    /// Newest date first.
    pub by_date: Vec<DateCount>,
    /// At most ten trucks, most records first.
    pub top_trucks: Vec<TruckCount>,
}

impl Summary {
    pub fn total_time(&self) -> String {
        format_hms(self.total_seconds)
    }

    pub fn average_time(&self) -> String {
        format_hms(self.average_seconds)
    }

    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

fn average(total: u64, count: usize) -> u64 {
    if count == 0 { 0 } else { total / count as u64 }
}

/// Bay ids order by number when they look like `bayN`, then by text.
fn bay_sort_key(id: &str) -> (u32, String) {
    let n = id.parse::<BayId>().map(|b| b.number()).unwrap_or(u32::MAX);
    (n, id.to_string())
}

/// Per-bay count, total, average and distinct trucks, ascending by bay.
pub fn bay_statistics(records: &[ClockedTime]) -> Vec<BayBreakdown> {
    let mut acc: HashMap<&str, (usize, u64, BTreeSet<&str>)> = HashMap::new();
    for r in records {
        let entry = acc.entry(r.bay_id.as_str()).or_default();
        entry.0 += 1;
        entry.1 += r.total_seconds;
        if !r.truck_number.is_empty() {
            entry.2.insert(r.truck_number.as_str());
        }
    }

    let mut out: Vec<BayBreakdown> = acc
        .into_iter()
        .map(|(bay, (count, total, trucks))| BayBreakdown {
            bay_id: bay.to_string(),
            count,
            total_seconds: total,
            average_seconds: average(total, count),
            unique_trucks: trucks.len(),
        })
        .collect();
    out.sort_by_cached_key(|b| bay_sort_key(&b.bay_id));
    out
}

pub fn summarize(records: &[ClockedTime]) -> Summary {
    if records.is_empty() {
        return Summary::default();
    }

    let total_seconds: u64 = records.iter().map(|r| r.total_seconds).sum();

    let mut dates: HashMap<&str, usize> = HashMap::new();
    let mut trucks: HashMap<&str, usize> = HashMap::new();
    for r in records {
        *dates.entry(r.date.as_str()).or_default() += 1;
        if !r.truck_number.is_empty() {
            *trucks.entry(r.truck_number.as_str()).or_default() += 1;
        }
    }

    let mut by_date: Vec<DateCount> = dates
        .into_iter()
        .map(|(date, count)| DateCount {
            date: date.to_string(),
            count,
        })
        .collect();
    by_date.sort_by(|a, b| b.date.cmp(&a.date));

    let mut top_trucks: Vec<TruckCount> = trucks
        .into_iter()
        .map(|(truck, count)| TruckCount {
            truck_number: truck.to_string(),
            count,
        })
        .collect();
    top_trucks.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.truck_number.cmp(&b.truck_number))
    });
    top_trucks.truncate(TOP_TRUCKS);

    Summary {
        total_records: records.len(),
        total_seconds,
        average_seconds: average(total_seconds, records.len()),
        by_bay: bay_statistics(records),
        by_date,
        top_trucks,
    }
}

// ---------------------------
// Live board reductions
// ---------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total_active: usize,
    pub total_elapsed_seconds: u64,
    pub average_elapsed_seconds: u64,
    /// Most frequent status first.
    pub status_breakdown: Vec<StatusCount>,
    /// Active bays ordered by bay number.
    pub bays: Vec<DisplayBay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub total_active: usize,
    /// Share of bays in use, e.g. `42.9`.
    pub utilization_percent: f64,
    pub longest_seconds: Option<u64>,
    pub shortest_seconds: Option<u64>,
    pub average_seconds: Option<u64>,
    pub unique_trucks: usize,
}

impl PerformanceMetrics {
    pub fn utilization(&self) -> String {
        format!("{:.1}%", self.utilization_percent)
    }
}

fn active(bays: &[DisplayBay]) -> Vec<&DisplayBay> {
    bays.iter().filter(|b| b.is_active()).collect()
}

pub fn status_summary(bays: &[DisplayBay]) -> StatusSummary {
    let active = active(bays);
    if active.is_empty() {
        return StatusSummary::default();
    }

    let total: u64 = active.iter().map(|b| b.elapsed_seconds).sum();

    let mut counts: Vec<StatusCount> = Vec::new();
    for b in &active {
        match counts.iter_mut().find(|c| c.status == b.status) {
            Some(c) => c.count += 1,
            None => counts.push(StatusCount {
                status: b.status.to_string(),
                count: 1,
            }),
        }
    }
    // stable: equal counts keep first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));

    let mut details: Vec<DisplayBay> = active.into_iter().cloned().collect();
    details.sort_by_key(|b| b.id);

    StatusSummary {
        total_active: details.len(),
        total_elapsed_seconds: total,
        average_elapsed_seconds: average(total, details.len()),
        status_breakdown: counts,
        bays: details,
    }
}

pub fn performance_metrics(bays: &[DisplayBay], num_bays: u32) -> PerformanceMetrics {
    let active = active(bays);
    let elapsed: Vec<u64> = active.iter().map(|b| b.elapsed_seconds).collect();

    let unique_trucks: BTreeSet<&str> = active
        .iter()
        .map(|b| b.truck.as_str())
        .filter(|t| !t.is_empty() && *t != "—")
        .collect();

    let utilization_percent = if num_bays == 0 {
        0.0
    } else {
        active.len() as f64 / num_bays as f64 * 100.0
    };

    PerformanceMetrics {
        total_active: active.len(),
        utilization_percent,
        longest_seconds: elapsed.iter().copied().max(),
        shortest_seconds: elapsed.iter().copied().min(),
        average_seconds: if elapsed.is_empty() {
            None
        } else {
            Some(average(elapsed.iter().sum(), elapsed.len()))
        },
        unique_trucks: unique_trucks.len(),
    }
}
