//! Plain text tables for CLI output.

use crate::utils::colors::strip_ansi;
use unicode_width::UnicodeWidthStr;

pub struct Column {
    pub header: String,
    pub width: usize,
}

pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Columns sized to their headers; rows widen them as they come in.
    pub fn with_headers(headers: &[&str]) -> Self {
        Self::new(
            headers
                .iter()
                .map(|h| Column {
                    header: h.to_string(),
                    width: h.width(),
                })
                .collect(),
        )
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (col, cell) in self.columns.iter_mut().zip(&row) {
            col.width = col.width.max(visible_width(cell));
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        for col in &self.columns {
            out.push_str(&pad(&col.header, col.width));
            out.push(' ');
        }
        trim_line(&mut out);

        let rule: usize = self.columns.iter().map(|c| c.width + 1).sum();
        out.push_str(&"-".repeat(rule.saturating_sub(1)));
        out.push('\n');

        for row in &self.rows {
            for (i, col) in self.columns.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                out.push_str(&pad(cell, col.width));
                out.push(' ');
            }
            trim_line(&mut out);
        }

        out
    }
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).width()
}

/// Left-align `s` in `width` terminal columns, ignoring colour codes.
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(visible_width(s));
    format!("{s}{}", " ".repeat(fill))
}

fn trim_line(out: &mut String) {
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
    out.push('\n');
}
