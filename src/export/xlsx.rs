// src/export/xlsx.rs

use crate::errors::{AppError, AppResult};
use crate::export::model::{Cell, Sheet};
use crate::export::notify_export_success;
use crate::ui::messages::info;
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook, Worksheet,
};
use std::path::Path;
use unicode_width::UnicodeWidthStr;

/// Write every sheet into one workbook, header row bold, frozen and
/// filterable.
pub(crate) fn export_xlsx(sheets: &[Sheet], path: &Path) -> AppResult<()> {
    info(format!("Exporting to XLSX: {}", path.display()));

    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet)?;
    }

    workbook.save(path_str(path)?).map_err(to_export_error)?;
    notify_export_success("XLSX", path);
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> AppResult<()> {
    worksheet.set_name(&sheet.name).map_err(to_export_error)?;

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0xFFFFFF))
        .set_background_color(Color::RGB(0x2F75B5))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);

    let first_data_row: u32 = if sheet.headers.is_empty() { 0 } else { 1 };

    if !sheet.headers.is_empty() {
        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet
                .write_with_format(0, col as u16, header.as_str(), &header_format)
                .map_err(to_export_error)?;
        }
        worksheet.set_row_height(0, 20).map_err(to_export_error)?;
        worksheet.set_freeze_panes(1, 0).map_err(to_export_error)?;
        worksheet
            .autofilter(0, 0, 0, (sheet.headers.len() - 1) as u16)
            .map_err(to_export_error)?;
    }

    // Fixed widths win; otherwise size columns to their content.
    let mut col_widths: Vec<usize> = (0..sheet.width())
        .map(|c| sheet.headers.get(c).map_or(0, |h| h.width()))
        .collect();

    let band1 = Color::RGB(0xEAF3FB);
    let band2 = Color::RGB(0xFFFFFF);

    for (row_index, row) in sheet.rows.iter().enumerate() {
        let r = first_data_row + row_index as u32;
        let band = if row_index % 2 == 0 { band1 } else { band2 };

        for (col, cell) in row.iter().enumerate() {
            write_cell(worksheet, r, col as u16, cell, band)?;
            col_widths[col] = col_widths[col].max(cell.text().width());
        }
    }

    for (c, w) in col_widths.iter().enumerate() {
        let width = sheet.widths.get(c).copied().unwrap_or(*w as f64 + 2.0);
        worksheet
            .set_column_width(c as u16, width)
            .map_err(to_export_error)?;
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    bg: Color,
) -> AppResult<()> {
    let base = Format::new()
        .set_background_color(bg)
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);

    match cell {
        Cell::Number(n) => {
            let fmt = base.set_align(FormatAlign::Right);
            worksheet
                .write_with_format(row, col, *n, &fmt)
                .map_err(to_export_error)?;
        }
        Cell::Text(s) => {
            worksheet
                .write_with_format(row, col, s.as_str(), &base)
                .map_err(to_export_error)?;
        }
        Cell::Empty => {}
    }
    Ok(())
}

fn to_export_error<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Export(e.to_string())
}

fn path_str(path: &Path) -> AppResult<&str> {
    path.to_str()
        .ok_or_else(|| AppError::Export(format!("invalid path: {}", path.display())))
}
