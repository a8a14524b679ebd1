pub mod time;

pub use time::{DisplayZone, EventTime};

use crate::components::backend::Event;
use chrono::{Datelike, Months, NaiveDate, Weekday};
use std::collections::HashMap;
use tracing::debug;

/// Day cells in a month grid: six weeks of seven days
pub const GRID_CELLS: usize = 42;

/// Most indicator marks a single day shows
pub const MAX_MARKS: usize = 3;

/// Weekday header order, Sunday first
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// The month the grid is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayedMonth {
    first: NaiveDate,
}

impl DisplayedMonth {
    /// Month `month` (1-12) of `year`
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// The month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn days_in_month(&self) -> u32 {
        self.first
            .checked_add_months(Months::new(1))
            .map(|next| next.signed_duration_since(self.first).num_days() as u32)
            .unwrap_or(31)
    }

    /// Blank cells before the first of the month
    pub fn leading_blanks(&self) -> usize {
        self.first.weekday().num_days_from_sunday() as usize
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    pub fn prev(self) -> Self {
        self.first
            .checked_sub_months(Months::new(1))
            .map(|first| Self { first })
            .unwrap_or(self)
    }

    pub fn next(self) -> Self {
        self.first
            .checked_add_months(Months::new(1))
            .map(|first| Self { first })
            .unwrap_or(self)
    }
}

/// One day of the displayed month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub is_today: bool,
    /// Events starting on this day, in cache order
    pub events: Vec<Event>,
}

impl DayCell {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Indicator marks to draw; capped at [`MAX_MARKS`]
    pub fn marks(&self) -> usize {
        self.events.len().min(MAX_MARKS)
    }

    /// Hover text stating the exact event count
    pub fn tooltip(&self) -> Option<String> {
        if self.has_events() {
            Some(t!("day_tooltip", count = self.events.len()).to_string())
        } else {
            None
        }
    }
}

/// A cell of the 6x7 grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCell {
    Blank,
    Day(DayCell),
}

impl GridCell {
    pub fn as_day(&self) -> Option<&DayCell> {
        match self {
            GridCell::Day(day) => Some(day),
            GridCell::Blank => None,
        }
    }
}

/// A rendered month: weekday headers plus exactly [`GRID_CELLS`] cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub month: DisplayedMonth,
    pub headers: [Weekday; 7],
    pub cells: Vec<GridCell>,
}

impl MonthGrid {
    /// Day cells only, in date order
    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.cells.iter().filter_map(GridCell::as_day)
    }

    /// The cell for `date`, if it is in this month
    pub fn day(&self, date: NaiveDate) -> Option<&DayCell> {
        self.days().find(|d| d.date == date)
    }

    /// Rows of seven cells
    pub fn weeks(&self) -> impl Iterator<Item = &[GridCell]> {
        self.cells.chunks(WEEKDAYS.len())
    }
}

/// Group events by the local calendar day they start on.
///
/// Events without a usable `start` are left out.
pub fn bucket_by_day(events: &[Event], zone: &DisplayZone) -> HashMap<NaiveDate, Vec<Event>> {
    let mut buckets: HashMap<NaiveDate, Vec<Event>> = HashMap::new();
    for event in events {
        match event.start.as_deref().and_then(|s| zone.date_of(s)) {
            Some(date) => buckets.entry(date).or_default().push(event.clone()),
            None => debug!(
                "Skipping event {:?} without a usable start: {:?}",
                event.id, event.start
            ),
        }
    }
    buckets
}

/// Render `month` from the event cache.
///
/// `today` is highlighted when it falls inside the month.
pub fn render_month(
    month: DisplayedMonth,
    events: &[Event],
    zone: &DisplayZone,
    today: NaiveDate,
) -> MonthGrid {
    let mut buckets = bucket_by_day(events, zone);
    let leading = month.leading_blanks();

    let mut cells: Vec<GridCell> = Vec::with_capacity(GRID_CELLS);
    cells.resize(leading, GridCell::Blank);

    for day in 1..=month.days_in_month() {
        let Some(date) = month.first_day().with_day(day) else {
            continue;
        };
        cells.push(GridCell::Day(DayCell {
            date,
            is_today: date == today,
            events: buckets.remove(&date).unwrap_or_default(),
        }));
    }

    cells.truncate(GRID_CELLS);
    cells.resize(GRID_CELLS, GridCell::Blank);

    MonthGrid {
        month,
        headers: WEEKDAYS,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> DisplayZone {
        DisplayZone::Named(chrono_tz::UTC)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(summary: &str, start: Option<&str>) -> Event {
        Event {
            summary: Some(summary.to_string()),
            start: start.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn every_month_fills_forty_two_cells() {
        for year in [1900, 2023, 2024, 2100] {
            for month in 1..=12 {
                let shown = DisplayedMonth::new(year, month).unwrap();
                let grid = render_month(shown, &[], &utc(), date(2000, 1, 1));
                assert_eq!(grid.cells.len(), GRID_CELLS);
                assert_eq!(grid.headers.len(), 7);

                let days = grid.days().count();
                assert_eq!(days as u32, shown.days_in_month());

                let leading = grid
                    .cells
                    .iter()
                    .take_while(|c| matches!(c, GridCell::Blank))
                    .count();
                assert_eq!(leading, shown.leading_blanks());
                let trailing = grid
                    .cells
                    .iter()
                    .rev()
                    .take_while(|c| matches!(c, GridCell::Blank))
                    .count();
                assert_eq!(leading + days + trailing, GRID_CELLS);
            }
        }
    }

    #[test]
    fn month_lengths_follow_gregorian_rules() {
        assert_eq!(DisplayedMonth::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(DisplayedMonth::new(2023, 2).unwrap().days_in_month(), 28);
        assert_eq!(DisplayedMonth::new(1900, 2).unwrap().days_in_month(), 28);
        assert_eq!(DisplayedMonth::new(2000, 2).unwrap().days_in_month(), 29);
        assert_eq!(DisplayedMonth::new(2024, 12).unwrap().days_in_month(), 31);
        assert!(DisplayedMonth::new(2024, 13).is_none());
    }

    #[test]
    fn march_2024_starts_on_friday() {
        let march = DisplayedMonth::new(2024, 3).unwrap();
        assert_eq!(march.leading_blanks(), 5);
        let grid = render_month(march, &[], &utc(), date(2024, 3, 1));
        assert!(matches!(grid.cells[4], GridCell::Blank));
        assert_eq!(grid.cells[5].as_day().map(|d| d.date), Some(date(2024, 3, 1)));
    }

    #[test]
    fn standup_marks_its_day() {
        let events = vec![Event {
            summary: Some("Standup".to_string()),
            start: Some("2024-03-05T09:00:00Z".to_string()),
            end: Some("2024-03-05T09:15:00Z".to_string()),
            ..Default::default()
        }];
        let grid = render_month(
            DisplayedMonth::new(2024, 3).unwrap(),
            &events,
            &utc(),
            date(2024, 3, 20),
        );

        let fifth = grid.day(date(2024, 3, 5)).unwrap();
        assert!(fifth.has_events());
        assert_eq!(fifth.marks(), 1);
        assert!(grid
            .days()
            .filter(|d| d.date != date(2024, 3, 5))
            .all(|d| !d.has_events()));
    }

    #[test]
    fn marks_cap_at_three_but_tooltip_counts_all() {
        let events: Vec<Event> = (0..5)
            .map(|i| event(&format!("Meeting {}", i), Some("2024-03-08T10:00:00Z")))
            .collect();
        let grid = render_month(
            DisplayedMonth::new(2024, 3).unwrap(),
            &events,
            &utc(),
            date(2024, 3, 1),
        );
        let day = grid.day(date(2024, 3, 8)).unwrap();
        assert_eq!(day.events.len(), 5);
        assert_eq!(day.marks(), MAX_MARKS);
        assert!(day.tooltip().unwrap().contains('5'));
    }

    #[test]
    fn events_without_start_are_skipped() {
        let events = vec![
            event("No start", None),
            event("Bad start", Some("sometime soon")),
            event("Fine", Some("2024-03-10")),
        ];
        let grid = render_month(
            DisplayedMonth::new(2024, 3).unwrap(),
            &events,
            &utc(),
            date(2024, 3, 1),
        );
        let marked: Vec<_> = grid.days().filter(|d| d.has_events()).collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].date, date(2024, 3, 10));
        assert_eq!(marked[0].events[0].summary.as_deref(), Some("Fine"));
    }

    #[test]
    fn today_is_highlighted_only_in_its_month() {
        let today = date(2024, 3, 19);
        let march = render_month(DisplayedMonth::new(2024, 3).unwrap(), &[], &utc(), today);
        let highlighted: Vec<_> = march.days().filter(|d| d.is_today).collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].date, today);
        assert!(!highlighted[0].has_events());

        let april = render_month(DisplayedMonth::new(2024, 4).unwrap(), &[], &utc(), today);
        assert!(april.days().all(|d| !d.is_today));
    }

    #[test]
    fn navigation_wraps_years() {
        let january = DisplayedMonth::new(2024, 1).unwrap();
        let december = january.prev();
        assert_eq!((december.year(), december.month()), (2023, 12));
        assert_eq!(december.next(), january);

        let next = DisplayedMonth::new(2024, 12).unwrap().next();
        assert_eq!((next.year(), next.month()), (2025, 1));
    }

    #[test]
    fn containing_uses_first_of_month() {
        let shown = DisplayedMonth::containing(date(2024, 3, 19));
        assert_eq!(shown.first_day(), date(2024, 3, 1));
        assert!(shown.contains(date(2024, 3, 31)));
        assert!(!shown.contains(date(2024, 4, 1)));
    }

    #[test]
    fn grid_splits_into_six_weeks() {
        let grid = render_month(
            DisplayedMonth::new(2024, 6).unwrap(),
            &[],
            &utc(),
            date(2024, 6, 1),
        );
        assert_eq!(grid.weeks().count(), 6);
        assert!(grid.weeks().all(|w| w.len() == 7));
    }
}
