// src/export/model.rs

use serde::Serialize;

/// One spreadsheet cell. Numbers stay numeric so the writers can align and
/// sum them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<u64> for Cell {
    fn from(n: u64) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<u32> for Cell {
    fn from(n: u32) -> Self {
        Cell::Number(n as f64)
    }
}

/// A named table: optional header row, fixed column widths (in characters)
/// and rows that may be shorter or longer than the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub widths: Vec<f64>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            widths: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_widths(mut self, widths: &[f64]) -> Self {
        self.widths = widths.to_vec();
        self
    }

    pub fn push<I, C>(&mut self, row: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn blank_row(&mut self) {
        self.rows.push(vec![Cell::Empty]);
    }

    /// Header-only sheet with one "No data available" row.
    pub fn placeholder(name: &str, header: &str, message: &str) -> Self {
        let mut s = Self::new(name, &[header]);
        s.push([message]);
        s
    }

    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    /// Value at `(row, col)` as text; `None` past the end of the row.
    #[cfg(test)]
    pub fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        self.rows.get(row)?.get(col).map(Cell::text)
    }
}
