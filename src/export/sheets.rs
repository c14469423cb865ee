// src/export/sheets.rs
//
// Row/column layout of the two workbooks. Nothing here knows about file
// formats; the writers only see `Sheet`s.

use crate::core::calculator::stats::{self, PerformanceMetrics, StatusSummary, Summary};
use crate::export::model::{Cell, Sheet};
use crate::models::{ClockedTime, DisplayBay};
use crate::utils::date::{week_number, weekday_name};
use crate::utils::time::{format_hms, utc_from_ms};

pub const CLOCKED_TIMES_SHEET: &str = "Clocked Times";
pub const SUMMARY_SHEET: &str = "Summary";
pub const BAY_STATISTICS_SHEET: &str = "Bay Statistics";
pub const CURRENT_STATUS_SHEET: &str = "Current Status";
pub const PERFORMANCE_SHEET: &str = "Performance Metrics";

const NO_DATA: &str = "No data available";

pub const CLOCKED_TIMES_HEADERS: [&str; 12] = [
    "Record ID",
    "Bay ID",
    "Bay Number",
    "Truck Number",
    "Elapsed Time",
    "Total Seconds",
    "Clock Time",
    "Clock Date",
    "Date (YYYY-MM-DD)",
    "Timestamp",
    "Day of Week",
    "Week Number",
];
const CLOCKED_TIMES_WIDTHS: [f64; 12] = [
    20.0, 10.0, 12.0, 15.0, 15.0, 15.0, 15.0, 15.0, 18.0, 25.0, 12.0, 12.0,
];

pub const STATUS_HEADERS: [&str; 7] = [
    "Bay ID",
    "Bay Number",
    "Truck Number",
    "Start Time",
    "Elapsed Time",
    "Status",
    "Last Updated",
];
const STATUS_WIDTHS: [f64; 7] = [10.0, 12.0, 15.0, 20.0, 15.0, 12.0, 25.0];

fn clock_time(ms: u64) -> String {
    utc_from_ms(ms).format("%H:%M:%S").to_string()
}

fn clock_date(ms: u64) -> String {
    utc_from_ms(ms).format("%-m/%-d/%Y").to_string()
}

fn timestamp(ms: u64) -> String {
    utc_from_ms(ms).format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn date_time(ms: u64) -> String {
    utc_from_ms(ms).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// "—" for idle bays, otherwise the UTC time of day the session started.
pub fn start_time(started_at: u64) -> String {
    if started_at == 0 {
        "—".to_string()
    } else {
        clock_time(started_at)
    }
}

// ---------------------------
// Clocked-times workbook
// ---------------------------

pub fn clocked_times_workbook(records: &[ClockedTime]) -> Vec<Sheet> {
    vec![
        clocked_times_sheet(records),
        summary_sheet(&stats::summarize(records)),
        bay_statistics_sheet(records),
    ]
}

pub fn clocked_times_sheet(records: &[ClockedTime]) -> Sheet {
    let mut sheet =
        Sheet::new(CLOCKED_TIMES_SHEET, &CLOCKED_TIMES_HEADERS).with_widths(&CLOCKED_TIMES_WIDTHS);

    for r in records {
        let at = utc_from_ms(r.clocked_at).naive_utc();
        sheet.push([
            Cell::from(r.id.as_str()),
            Cell::from(r.bay_id.as_str()),
            Cell::from(r.bay_number.as_str()),
            Cell::from(r.truck_number.as_str()),
            Cell::from(r.elapsed_time.as_str()),
            Cell::from(r.total_seconds),
            Cell::from(clock_time(r.clocked_at)),
            Cell::from(clock_date(r.clocked_at)),
            Cell::from(r.date.as_str()),
            Cell::from(timestamp(r.clocked_at)),
            Cell::from(weekday_name(at)),
            Cell::from(week_number(at)),
        ]);
    }
    sheet
}

pub fn summary_sheet(summary: &Summary) -> Sheet {
    if summary.is_empty() {
        return Sheet::placeholder(SUMMARY_SHEET, "Summary", NO_DATA);
    }

    let mut sheet = Sheet::new(
        SUMMARY_SHEET,
        &["Metric", "Value", "Total Time", "Average Time"],
    );
    sheet.push([Cell::from("Total Records"), summary.total_records.into()]);
    sheet.push([Cell::from("Total Time (seconds)"), summary.total_seconds.into()]);
    sheet.push(["Total Time (HH:MM:SS)".to_string(), summary.total_time()]);
    sheet.push(["Average Time".to_string(), summary.average_time()]);
    sheet.push([Cell::from("Average Time (seconds)"), summary.average_seconds.into()]);
    sheet.blank_row();

    sheet.push(["Records by Bay"]);
    for bay in &summary.by_bay {
        sheet.push([
            Cell::from(format!("  {}", bay.bay_id)),
            bay.count.into(),
            bay.total_time().into(),
            bay.average_time().into(),
        ]);
    }
    sheet.blank_row();

    sheet.push(["Records by Date"]);
    for d in &summary.by_date {
        sheet.push([Cell::from(format!("  {}", d.date)), d.count.into()]);
    }
    sheet.blank_row();

    sheet.push(["Top Trucks"]);
    for t in &summary.top_trucks {
        sheet.push([Cell::from(format!("  {}", t.truck_number)), t.count.into()]);
    }
    sheet
}

pub fn bay_statistics_sheet(records: &[ClockedTime]) -> Sheet {
    if records.is_empty() {
        return Sheet::placeholder(BAY_STATISTICS_SHEET, "Bay Statistics", NO_DATA);
    }

    let mut sheet = Sheet::new(
        BAY_STATISTICS_SHEET,
        &[
            "Bay ID",
            "Total Records",
            "Total Time (HH:MM:SS)",
            "Total Time (seconds)",
            "Average Time",
            "Unique Trucks",
        ],
    );
    for b in stats::bay_statistics(records) {
        sheet.push([
            Cell::from(b.bay_id.as_str()),
            b.count.into(),
            b.total_time().into(),
            b.total_seconds.into(),
            b.average_time().into(),
            b.unique_trucks.into(),
        ]);
    }
    sheet
}

// ---------------------------
// Current-status workbook
// ---------------------------

/// Workbook for the bays active at `now`. Idle bays are left out.
pub fn status_workbook(board: &[DisplayBay], num_bays: u32, now: u64) -> Vec<Sheet> {
    vec![
        current_status_sheet(board, now),
        status_summary_sheet(&stats::status_summary(board), now),
        performance_sheet(&stats::performance_metrics(board, num_bays), now),
    ]
}

pub fn current_status_sheet(board: &[DisplayBay], now: u64) -> Sheet {
    let mut sheet = Sheet::new(CURRENT_STATUS_SHEET, &STATUS_HEADERS).with_widths(&STATUS_WIDTHS);
    let updated = date_time(now);

    for b in board.iter().filter(|b| b.is_active()) {
        sheet.push([
            b.id.to_string(),
            b.id.number().to_string(),
            b.truck.clone(),
            start_time(b.started_at),
            b.elapsed_time.clone(),
            b.status.to_string(),
            updated.clone(),
        ]);
    }
    sheet
}

pub fn status_summary_sheet(summary: &StatusSummary, now: u64) -> Sheet {
    let mut sheet = Sheet::new(SUMMARY_SHEET, &[]);
    if summary.total_active == 0 {
        sheet.push(["Summary", "No active bays"]);
        return sheet;
    }

    sheet.push([Cell::from("Export Date"), date_time(now).into()]);
    sheet.push([Cell::from("Total Active Bays"), summary.total_active.into()]);
    sheet.push([
        "Average Elapsed Time".to_string(),
        format_hms(summary.average_elapsed_seconds),
    ]);
    sheet.push([
        "Total Elapsed Time".to_string(),
        format_hms(summary.total_elapsed_seconds),
    ]);
    sheet.blank_row();

    sheet.push(["Status Breakdown"]);
    for s in &summary.status_breakdown {
        sheet.push([Cell::from(s.status.as_str()), s.count.into()]);
    }
    sheet.blank_row();

    sheet.push(["Bay Details"]);
    sheet.push(["Bay Number", "Truck Number", "Elapsed Time", "Status"]);
    for b in &summary.bays {
        sheet.push([
            b.id.number().to_string(),
            b.truck.clone(),
            b.elapsed_time.clone(),
            b.status.to_string(),
        ]);
    }
    sheet
}

pub fn performance_sheet(metrics: &PerformanceMetrics, now: u64) -> Sheet {
    if metrics.total_active == 0 {
        return Sheet::placeholder(PERFORMANCE_SHEET, "Performance Metrics", NO_DATA);
    }

    let mut sheet = Sheet::new(
        PERFORMANCE_SHEET,
        &["Performance Metrics", "Value", "Description"],
    );
    sheet.push([
        "Report Generated".to_string(),
        date_time(now),
        "Date and time of report generation".to_string(),
    ]);
    sheet.push([
        Cell::from("Total Active Bays"),
        metrics.total_active.into(),
        "Number of currently active loading bays".into(),
    ]);
    sheet.push([
        "Bays Utilization".to_string(),
        metrics.utilization(),
        "Percentage of total bays currently in use".to_string(),
    ]);

    let timed = [
        (
            "Longest Active Time",
            metrics.longest_seconds,
            "Bay with the longest ongoing loading operation",
        ),
        (
            "Shortest Active Time",
            metrics.shortest_seconds,
            "Bay with the shortest ongoing loading operation",
        ),
        (
            "Average Active Time",
            metrics.average_seconds,
            "Average time across all active bays",
        ),
    ];
    for (label, secs, desc) in timed {
        if let Some(secs) = secs {
            sheet.push([label.to_string(), format_hms(secs), desc.to_string()]);
        }
    }

    sheet.push([
        Cell::from("Unique Trucks"),
        metrics.unique_trucks.into(),
        "Number of distinct trucks currently being loaded".into(),
    ]);
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculator::status::{Thresholds, recompute_all};
    use crate::models::{Bay, BayId};
    use std::collections::BTreeMap;

    // 2025-01-08 14:30:05 UTC, a Wednesday
    const AT: u64 = 1_736_346_605_000;

    fn record(id: &str, bay: u32, truck: &str, secs: u64) -> ClockedTime {
        ClockedTime {
            id: id.to_string(),
            bay_id: format!("bay{bay}"),
            bay_number: bay.to_string(),
            truck_number: truck.to_string(),
            elapsed_time: format_hms(secs),
            total_seconds: secs,
            clocked_at: AT,
            date: "2025-01-08".to_string(),
        }
    }

    #[test]
    fn clocked_times_columns() {
        let sheet = clocked_times_sheet(&[record("k1", 3, "TR-1", 2701)]);
        assert_eq!(sheet.headers.len(), 12);
        assert_eq!(sheet.widths.len(), 12);

        let row: Vec<String> = (0..12).filter_map(|c| sheet.cell_text(0, c)).collect();
        assert_eq!(
            row,
            vec![
                "k1",
                "bay3",
                "3",
                "TR-1",
                "00:45:01",
                "2701",
                "14:30:05",
                "1/8/2025",
                "2025-01-08",
                "2025-01-08T14:30:05.000Z",
                "Wednesday",
                "2",
            ]
        );
    }

    #[test]
    fn summary_sections_in_order() {
        let records = vec![
            record("a", 2, "X", 100),
            record("b", 10, "X", 300),
            record("c", 2, "Y", 200),
        ];
        let sheet = summary_sheet(&stats::summarize(&records));

        assert_eq!(sheet.cell_text(0, 1).as_deref(), Some("3"));
        assert_eq!(sheet.cell_text(3, 1).as_deref(), Some("00:03:20"));

        let labels: Vec<String> = sheet.rows.iter().map(|r| r[0].text()).collect();
        let bay2 = labels.iter().position(|l| l == "  bay2").unwrap();
        let bay10 = labels.iter().position(|l| l == "  bay10").unwrap();
        assert!(bay2 < bay10);
        assert_eq!(sheet.cell_text(bay2, 2).as_deref(), Some("00:05:00"));
        assert_eq!(sheet.cell_text(bay2, 3).as_deref(), Some("00:02:30"));

        let trucks = labels.iter().position(|l| l == "Top Trucks").unwrap();
        assert_eq!(labels[trucks + 1], "  X");
    }

    #[test]
    fn empty_history_gets_placeholders() {
        let book = clocked_times_workbook(&[]);
        assert_eq!(book.len(), 3);
        assert!(book[0].rows.is_empty());
        assert_eq!(book[1].cell_text(0, 0).as_deref(), Some("No data available"));
        assert_eq!(book[2].headers, vec!["Bay Statistics"]);
    }

    #[test]
    fn status_workbook_covers_active_bays_only() {
        let mut bays = BTreeMap::new();
        bays.insert(BayId::new(1).unwrap(), Bay::new(BayId::new(1).unwrap(), "A", AT));
        bays.insert(BayId::new(3).unwrap(), Bay::new(BayId::new(3).unwrap(), "B", AT - 3_000_000));
        let now = AT + 100_000;
        let board = recompute_all(&bays, 7, &Thresholds::default(), now);

        let book = status_workbook(&board, 7, now);
        let names: Vec<&str> = book.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Current Status", "Summary", "Performance Metrics"]);

        let status = &book[0];
        assert_eq!(status.rows.len(), 2);
        assert_eq!(status.cell_text(0, 3).as_deref(), Some("14:30:05"));
        assert_eq!(status.cell_text(1, 5).as_deref(), Some("Warning"));

        let perf = &book[2];
        assert_eq!(perf.cell_text(2, 1).as_deref(), Some("28.6%"));
        assert_eq!(perf.cell_text(3, 1).as_deref(), Some("00:51:40"));
    }

    #[test]
    fn status_workbook_without_active_bays() {
        let board = recompute_all(&BTreeMap::new(), 3, &Thresholds::default(), AT);
        let book = status_workbook(&board, 3, AT);
        assert!(book[0].rows.is_empty());
        assert_eq!(book[1].cell_text(0, 1).as_deref(), Some("No active bays"));
        assert_eq!(book[2].cell_text(0, 0).as_deref(), Some("No data available"));
    }

    #[test]
    fn idle_start_time_is_a_dash() {
        assert_eq!(start_time(0), "—");
    }
}
