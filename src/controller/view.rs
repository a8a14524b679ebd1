use super::AppState;
use crate::components::calendar_grid::{DayCell, DisplayZone, GridCell, MonthGrid};
use crate::components::conversation::MessageKind;
use crate::utils::text::escape_display;
use chrono::{Datelike, Weekday};
use std::fmt::Write as _;
use std::io::Write;
use tracing::warn;

const CELL_WIDTH: usize = 7;
const MARK: &str = "•";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Draws the application state
pub trait View {
    fn render(&mut self, state: &AppState, grid: &MonthGrid, zone: &DisplayZone);
}

/// Prints a full text frame after every change
pub struct TerminalView<W: Write> {
    out: W,
    max_messages: usize,
    clear_screen: bool,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            max_messages: 8,
            clear_screen: false,
        }
    }

    /// Clear the terminal before each frame
    pub fn clearing(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

}

impl<W: Write> View for TerminalView<W> {
    fn render(&mut self, state: &AppState, grid: &MonthGrid, zone: &DisplayZone) {
        let frame = render_frame(state, grid, zone, self.max_messages);
        let clear = if self.clear_screen { CLEAR_SCREEN } else { "" };
        let result = write!(self.out, "{}{}", clear, frame).and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to draw frame: {}", e);
        }
    }
}

/// Render the whole screen as text
pub fn render_frame(
    state: &AppState,
    grid: &MonthGrid,
    zone: &DisplayZone,
    max_messages: usize,
) -> String {
    let mut frame = String::new();

    // Header
    if state.auth.connected {
        let _ = write!(frame, "● {}", t!("auth_connected"));
    } else {
        let _ = write!(frame, "○ {}", t!("auth_disconnected"));
    }
    if state.auth.show_logout {
        let _ = write!(frame, "  ({})", t!("logout_hint"));
    }
    frame.push('\n');
    if state.listening {
        let _ = writeln!(frame, "🎤 {}", t!("voice_listening"));
    }
    frame.push('\n');

    let locale = rust_i18n::locale();
    render_grid(&mut frame, grid, &locale);
    frame.push('\n');
    render_agenda(&mut frame, grid, zone, &locale);
    frame.push('\n');

    for message in state.messages.newest_first().take(max_messages) {
        let label = match message.kind {
            MessageKind::User => t!("label_user"),
            MessageKind::Assistant => t!("label_assistant"),
            MessageKind::Error => t!("label_error"),
        };
        let _ = writeln!(frame, "{}: {}", label, escape_display(&message.text));
    }

    frame.push_str("> ");
    frame
}

fn day_label(day: &DayCell) -> String {
    let number = day.date.format("%-d").to_string();
    let label = if day.is_today {
        format!("[{}]", number)
    } else {
        number
    };
    format!("{:>4}{:<3}", label, MARK.repeat(day.marks()))
}

/// Localized full month name
pub fn month_name(month: u32, locale: &str) -> String {
    let name = match month {
        1 => t!("month_1", locale = locale),
        2 => t!("month_2", locale = locale),
        3 => t!("month_3", locale = locale),
        4 => t!("month_4", locale = locale),
        5 => t!("month_5", locale = locale),
        6 => t!("month_6", locale = locale),
        7 => t!("month_7", locale = locale),
        8 => t!("month_8", locale = locale),
        9 => t!("month_9", locale = locale),
        10 => t!("month_10", locale = locale),
        11 => t!("month_11", locale = locale),
        _ => t!("month_12", locale = locale),
    };
    name.to_string()
}

/// Localized short weekday name
pub fn weekday_name(weekday: Weekday, locale: &str) -> String {
    let name = match weekday {
        Weekday::Sun => t!("weekday_sun", locale = locale),
        Weekday::Mon => t!("weekday_mon", locale = locale),
        Weekday::Tue => t!("weekday_tue", locale = locale),
        Weekday::Wed => t!("weekday_wed", locale = locale),
        Weekday::Thu => t!("weekday_thu", locale = locale),
        Weekday::Fri => t!("weekday_fri", locale = locale),
        Weekday::Sat => t!("weekday_sat", locale = locale),
    };
    name.to_string()
}

/// Month title, weekday headers and six rows of cells
pub fn render_grid(frame: &mut String, grid: &MonthGrid, locale: &str) {
    let _ = writeln!(
        frame,
        "{} {}",
        month_name(grid.month.month(), locale),
        grid.month.year()
    );

    for weekday in grid.headers {
        let _ = write!(frame, "{:>4}{:<3}", weekday_name(weekday, locale), "");
    }
    frame.push('\n');

    for week in grid.weeks() {
        let row: String = week
            .iter()
            .map(|cell| match cell {
                GridCell::Blank => " ".repeat(CELL_WIDTH),
                GridCell::Day(day) => day_label(day),
            })
            .collect();
        let _ = writeln!(frame, "{}", row.trim_end());
    }
}

/// The displayed month's events, grouped by day
pub fn render_agenda(frame: &mut String, grid: &MonthGrid, zone: &DisplayZone, locale: &str) {
    let _ = writeln!(frame, "{}", t!("events_heading"));

    let mut any = false;
    for day in grid.days().filter(|d| d.has_events()) {
        any = true;
        let _ = writeln!(
            frame,
            "  {} {:02} ({})",
            weekday_name(day.date.weekday(), locale),
            day.date.day(),
            day.tooltip().unwrap_or_default()
        );

        for event in &day.events {
            let start = event.start.as_deref().and_then(|s| zone.parse(s));
            let end = event.end.as_deref().and_then(|s| zone.parse(s));
            let time = match (start.and_then(|t| t.clock()), end.and_then(|t| t.clock())) {
                (Some(start), Some(end)) => format!("{}-{}", start, end),
                (Some(start), None) => start,
                _ => t!("all_day").to_string(),
            };

            let summary = event
                .summary
                .as_deref()
                .map(escape_display)
                .unwrap_or_else(|| t!("untitled_event").to_string());

            let _ = write!(frame, "    {:<11} {}", time, summary);
            if let Some(location) = event.location() {
                let _ = write!(frame, " @ {}", escape_display(location));
            }
            frame.push('\n');
        }
    }

    if !any {
        let _ = writeln!(frame, "  {}", t!("events_none"));
    }
}
