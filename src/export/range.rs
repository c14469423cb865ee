// src/export/range.rs

use crate::errors::{AppError, AppResult};
use chrono::{Datelike, NaiveDate};

/// Parse a `--range` expression into inclusive date bounds.
///
/// Accepted forms:
/// - `YYYY`, `YYYY-MM`, `YYYY-MM-DD`
/// - `A:B` where both sides use the same one of the forms above
pub(crate) fn parse_range(r: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let r = r.trim();
    match r.split_once(':') {
        Some((start_raw, end_raw)) => {
            let (start, end) = (start_raw.trim(), end_raw.trim());
            if start.len() != end.len() {
                return Err(invalid(r, "start and end must have same format"));
            }
            let (from, _) = period_bounds(start)?;
            let (_, to) = period_bounds(end)?;
            if from > to {
                return Err(invalid(r, "start is after end"));
            }
            Ok((from, to))
        }
        None => period_bounds(r),
    }
}

/// First and last day of the period one part of a range names.
fn period_bounds(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    match p.len() {
        4 => {
            let y: i32 = p.parse().map_err(|_| invalid(p, "invalid year"))?;
            let first = ymd(y, 1, 1, p)?;
            let last = ymd(y, 12, 31, p)?;
            Ok((first, last))
        }
        7 => {
            let first = NaiveDate::parse_from_str(&format!("{p}-01"), "%Y-%m-%d")
                .map_err(|_| invalid(p, "invalid month"))?;
            Ok((first, month_last_day(first)))
        }
        10 => {
            let d = NaiveDate::parse_from_str(p, "%Y-%m-%d")
                .map_err(|_| invalid(p, "invalid date"))?;
            Ok((d, d))
        }
        _ => Err(invalid(p, "unsupported --range format")),
    }
}

fn ymd(y: i32, m: u32, d: u32, src: &str) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| invalid(src, "date out of range"))
}

fn month_last_day(first: NaiveDate) -> NaiveDate {
    let (y, m) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(first)
}

fn invalid(src: &str, why: &str) -> AppError {
    AppError::InvalidDate(format!("{src}: {why}"))
}
