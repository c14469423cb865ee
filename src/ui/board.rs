//! Terminal rendering of the live board, the history and the summaries.

use crate::core::calculator::stats::{PerformanceMetrics, Summary};
use crate::export::sheets::start_time;
use crate::models::{ClockedTime, DisplayBay, StatusTier};
use crate::utils::colors::{
    BOLD, BRIGHT_GREEN, BRIGHT_RED, BRIGHT_WHITE, BRIGHT_YELLOW, CYAN, DIM, GREEN, GREY, RED,
    RESET, YELLOW, paint,
};
use crate::utils::table::Table;
use crate::utils::time::utc_from_ms;

/// Colours of one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub title: &'static str,
    pub available: &'static str,
    pub on_track: &'static str,
    pub warning: &'static str,
    pub overtime: &'static str,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        title: CYAN,
        available: GREY,
        on_track: GREEN,
        warning: YELLOW,
        overtime: RED,
    };

    pub const DARK: Palette = Palette {
        title: BRIGHT_WHITE,
        available: DIM,
        on_track: BRIGHT_GREEN,
        warning: BRIGHT_YELLOW,
        overtime: BRIGHT_RED,
    };

    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode { Self::DARK } else { Self::LIGHT }
    }

    pub fn tier(&self, tier: StatusTier) -> &'static str {
        match tier {
            StatusTier::Available => self.available,
            StatusTier::OnTrack => self.on_track,
            StatusTier::Warning => self.warning,
            StatusTier::Overtime => self.overtime,
        }
    }
}

pub fn render_board(board: &[DisplayBay], palette: &Palette) -> String {
    let mut table = Table::with_headers(&["Bay", "Truck", "Started", "Elapsed", "Status"]);
    for b in board {
        let color = palette.tier(b.tier);
        let truck = if b.truck.is_empty() { "—" } else { b.truck.as_str() };
        table.add_row(vec![
            b.id.to_string(),
            truck.to_string(),
            start_time(b.started_at),
            paint(&b.elapsed_time, color),
            paint(b.status, color),
        ]);
    }
    table.render()
}

/// One-line counters under the board.
pub fn render_footer(palette: &Palette, active: usize, num_bays: u32, completed_today: usize) -> String {
    format!(
        "{}{BOLD}Active bays:{RESET} {active}/{num_bays}   {}{BOLD}Completed today:{RESET} {completed_today}",
        palette.title, palette.title
    )
}

pub fn render_history(records: &[ClockedTime]) -> String {
    let mut table = Table::with_headers(&["Date", "Time", "Bay", "Truck", "Elapsed", "Record"]);
    for r in records {
        table.add_row(vec![
            r.date.clone(),
            utc_from_ms(r.clocked_at).format("%H:%M:%S").to_string(),
            r.bay_id.clone(),
            r.truck_number.clone(),
            r.elapsed_time.clone(),
            r.id.clone(),
        ]);
    }
    table.render()
}

pub fn render_summary(summary: &Summary) -> String {
    let mut out = format!(
        "Records: {}   Total: {}   Average: {}\n\n",
        summary.total_records,
        summary.total_time(),
        summary.average_time()
    );

    let mut bays = Table::with_headers(&["Bay", "Records", "Total", "Average", "Trucks"]);
    for b in &summary.by_bay {
        bays.add_row(vec![
            b.bay_id.clone(),
            b.count.to_string(),
            b.total_time(),
            b.average_time(),
            b.unique_trucks.to_string(),
        ]);
    }
    out.push_str(&bays.render());

    if !summary.top_trucks.is_empty() {
        out.push('\n');
        let mut trucks = Table::with_headers(&["Truck", "Records"]);
        for t in &summary.top_trucks {
            trucks.add_row(vec![t.truck_number.clone(), t.count.to_string()]);
        }
        out.push_str(&trucks.render());
    }
    out
}

pub fn render_metrics(m: &PerformanceMetrics) -> String {
    let opt = |v: Option<u64>| v.map(crate::utils::time::format_hms).unwrap_or_else(|| "—".into());
    format!(
        "Utilization: {}   Longest: {}   Shortest: {}   Average: {}   Trucks: {}",
        m.utilization(),
        opt(m.longest_seconds),
        opt(m.shortest_seconds),
        opt(m.average_seconds),
        m.unique_trucks
    )
}
