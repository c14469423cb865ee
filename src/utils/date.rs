use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Utc};

/// Today's date in UTC, the same calendar used for `ClockedTime::date`.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn today_str() -> String {
    format_date(today())
}

/// The date `days` before `from`.
pub fn days_before(from: NaiveDate, days: u64) -> NaiveDate {
    from.checked_sub_days(Days::new(days)).unwrap_or(from)
}

pub fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Week of the year as printed in the reports:
/// `ceil((days since Jan 1 + weekday(Jan 1) + 1) / 7)` with Sunday = 0.
///
/// Days since Jan 1 keep their fractional part, so the time of day matters
/// on the boundary day of each week.
pub fn week_number(dt: NaiveDateTime) -> u32 {
    let Some(jan1) = NaiveDate::from_ymd_opt(dt.year(), 1, 1) else {
        return 0;
    };
    let start = jan1.and_hms_opt(0, 0, 0).unwrap_or_default();

    let past_days = (dt - start).num_milliseconds() as f64 / 86_400_000.0;
    let offset = jan1.weekday().num_days_from_sunday() as f64;

    ((past_days + offset + 1.0) / 7.0).ceil() as u32
}

/// English weekday name ("Monday").
pub fn weekday_name(dt: NaiveDateTime) -> String {
    dt.format("%A").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn first_days_of_2025() {
        // Jan 1 2025 is a Wednesday (offset 3).
        assert_eq!(week_number(at(2025, 1, 1, 0)), 1);
        assert_eq!(week_number(at(2025, 1, 4, 0)), 1);
        assert_eq!(week_number(at(2025, 1, 5, 0)), 2);
    }

    #[test]
    fn time_of_day_counts_on_the_boundary() {
        assert_eq!(week_number(at(2025, 1, 4, 12)), 2);
    }

    #[test]
    fn sunday_start_year() {
        // Jan 1 2023 is a Sunday (offset 0).
        assert_eq!(week_number(at(2023, 1, 1, 0)), 1);
        assert_eq!(week_number(at(2023, 1, 7, 0)), 1);
        assert_eq!(week_number(at(2023, 1, 8, 0)), 2);
        assert_eq!(week_number(at(2023, 12, 31, 0)), 53);
    }

    #[test]
    fn days_before_crosses_months() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        assert_eq!(format_date(days_before(d, 7)), "2025-02-23");
    }

    #[test]
    fn weekday_names_are_english() {
        assert_eq!(weekday_name(at(2025, 1, 1, 9)), "Wednesday");
    }
}
