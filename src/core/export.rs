//! High level export flows: fetch history or the live board, apply the
//! report filters, build the sheets and hand them to a writer.

use crate::core::calculator::stats;
use crate::core::store::BayStore;
use crate::errors::AppResult;
use crate::export::fs_utils::{ensure_parent, ensure_writable};
use crate::export::range::parse_range;
use crate::export::sheets::{clocked_times_workbook, status_workbook};
use crate::export::{ExportFormat, Sheet, export_csv, export_json, export_xlsx};
use crate::models::{BayId, ClockedTime, DisplayBay};
use crate::ui::messages::warning;
use crate::utils::date::{days_before, format_date, today};
use std::path::{Path, PathBuf};
use tracing::info;

/// Which records a clocked-times export covers. All parts are optional;
/// an empty filter is the full export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub bay: Option<BayId>,
    /// Case-insensitive substring of the truck number.
    pub truck: Option<String>,
}

impl ReportFilter {
    /// Filter for a `--range` expression (`all` = no bounds).
    pub fn from_range(range: &str) -> AppResult<Self> {
        if range.eq_ignore_ascii_case("all") {
            return Ok(Self::default());
        }
        let (from, to) = parse_range(range)?;
        Ok(Self {
            from: Some(format_date(from)),
            to: Some(format_date(to)),
            ..Self::default()
        })
    }

    /// The last `days` days up to today.
    pub fn last_days(days: u64) -> Self {
        let end = today();
        Self {
            from: Some(format_date(days_before(end, days))),
            to: Some(format_date(end)),
            ..Self::default()
        }
    }

    pub fn with_bay(mut self, bay: Option<BayId>) -> Self {
        self.bay = bay;
        self
    }

    pub fn with_truck(mut self, truck: Option<String>) -> Self {
        self.truck = truck.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn is_full(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.bay.is_none() && self.truck.is_none()
    }

    /// Apply the filter, newest record first.
    pub fn select(&self, records: &[ClockedTime]) -> Vec<ClockedTime> {
        let mut out = match (&self.from, &self.to) {
            (None, None) => records.to_vec(),
            (from, to) => stats::filter_by_date_range(
                records,
                from.as_deref().unwrap_or("0000-01-01"),
                to.as_deref().unwrap_or("9999-12-31"),
            ),
        };
        if let Some(bay) = self.bay {
            out = stats::filter_by_bay(&out, &bay.to_string());
        }
        if let Some(truck) = &self.truck {
            out = stats::filter_by_truck(&out, truck, true);
        }
        stats::sort_newest_first(&mut out);
        out
    }

    /// `clocked-times-full-export-<today>` or
    /// `advanced-report-<from>-to-<to>-<today>`.
    pub fn base_name(&self, today: &str) -> String {
        if self.is_full() {
            return format!("clocked-times-full-export-{today}");
        }
        let from = self.from.as_deref().unwrap_or("start");
        let to = self.to.as_deref().unwrap_or(today);
        format!("advanced-report-{from}-to-{to}-{today}")
    }
}

/// `current-bay-status-<today>-<ms>`.
pub fn status_base_name(today: &str, now_ms: u64) -> String {
    format!("current-bay-status-{today}-{now_ms}")
}

fn output_path(file: Option<&str>, base: &str, format: ExportFormat) -> PathBuf {
    match file {
        Some(f) => PathBuf::from(f),
        None => PathBuf::from(format!("{base}.{}", format.as_str())),
    }
}

pub struct ExportLogic;

impl ExportLogic {
    /// Export clocked times. Returns the written path, or `None` when the
    /// selection is empty and nothing was written.
    pub async fn export_clocked_times(
        store: &BayStore,
        format: ExportFormat,
        file: Option<&str>,
        filter: &ReportFilter,
        force: bool,
    ) -> AppResult<Option<PathBuf>> {
        let records = filter.select(&store.all_clocked_times().await?);
        if records.is_empty() {
            warning("No clocked times found for the selected filters.");
            return Ok(None);
        }

        let path = output_path(file, &filter.base_name(&format_date(today())), format);
        ensure_writable(&path, force)?;
        ensure_parent(&path)?;

        info!(records = records.len(), path = %path.display(), format = format.as_str(), "exporting clocked times");
        write(format, &clocked_times_workbook(&records), &records, &path)?;
        Ok(Some(path))
    }

    /// Export the bays active right now.
    pub async fn export_status(
        store: &BayStore,
        format: ExportFormat,
        file: Option<&str>,
        force: bool,
    ) -> AppResult<Option<PathBuf>> {
        let now = store.now_ms();
        let board = store.board();
        let active: Vec<DisplayBay> = board.iter().filter(|b| b.is_active()).cloned().collect();
        if active.is_empty() {
            warning("No active bays to export.");
            return Ok(None);
        }

        let base = status_base_name(&format_date(today()), now);
        let path = output_path(file, &base, format);
        ensure_writable(&path, force)?;
        ensure_parent(&path)?;

        info!(bays = active.len(), path = %path.display(), "exporting current status");
        let sheets = status_workbook(&board, store.num_bays(), now);
        write(format, &sheets, &active, &path)?;
        Ok(Some(path))
    }
}

/// Xlsx gets every sheet, csv the first one, json the raw records.
fn write<T: serde::Serialize>(
    format: ExportFormat,
    sheets: &[Sheet],
    records: &[T],
    path: &Path,
) -> AppResult<()> {
    match format {
        ExportFormat::Xlsx => export_xlsx(sheets, path),
        ExportFormat::Csv => match sheets.first() {
            Some(main) => export_csv(main, path),
            None => Ok(()),
        },
        ExportFormat::Json => export_json(records, path),
    }
}
