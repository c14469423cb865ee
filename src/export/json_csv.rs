// src/export/json_csv.rs

use crate::errors::{AppError, AppResult};
use crate::export::model::Sheet;
use crate::export::notify_export_success;
use crate::ui::messages::info;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Export JSON pretty-printed.
pub(crate) fn export_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> AppResult<()> {
    info(format!("Exporting to JSON: {}", path.display()));

    let json_data = serde_json::to_string_pretty(data)?;

    let mut file = File::create(path)?;
    file.write_all(json_data.as_bytes())?;

    notify_export_success("JSON", path);
    Ok(())
}

/// Export one sheet as CSV: header row (when present) then every row,
/// padded to the widest row.
pub(crate) fn export_csv(sheet: &Sheet, path: &Path) -> AppResult<()> {
    info(format!("Exporting to CSV: {}", path.display()));

    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::Export(format!("CSV open error: {e}")))?;

    if !sheet.headers.is_empty() {
        wtr.write_record(&sheet.headers)
            .map_err(|e| AppError::Export(format!("CSV write error: {e}")))?;
    }

    let width = sheet.width();
    for row in &sheet.rows {
        let mut fields: Vec<String> = row.iter().map(|c| c.text()).collect();
        fields.resize(width, String::new());
        wtr.write_record(&fields)
            .map_err(|e| AppError::Export(format!("CSV write error: {e}")))?;
    }

    wtr.flush()?;

    notify_export_success("CSV", path);
    Ok(())
}
