// src/export/mod.rs

pub(crate) mod fs_utils;
mod json_csv;
pub mod model;
pub(crate) mod range;
pub mod sheets;
mod xlsx;

pub use model::{Cell, Sheet};

pub(crate) use json_csv::{export_csv, export_json};
pub(crate) use xlsx::export_xlsx;

use crate::ui::messages::success;
use clap::ValueEnum;
use std::path::Path;

/// Shared completion notice for every writer.
pub(crate) fn notify_export_success(label: &str, path: &Path) {
    success(format!("{label} export completed: {}", path.display()));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}
