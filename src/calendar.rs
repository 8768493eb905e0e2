use chrono::{Duration, NaiveDate};

use crate::academic::{academic_end, label_for, week_number};
use crate::dates::week_start;
use crate::event::{Event, EventFields};
use crate::query::events_on_day;

/// An event as displayed on one particular day.
#[derive(Debug, Clone)]
pub struct DayEntry<'a> {
    pub event: &'a Event,
    pub fields: EventFields,
}

#[derive(Debug, Clone)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    pub is_today: bool,
    pub entries: Vec<DayEntry<'a>>,
}

#[derive(Debug, Clone)]
pub struct WeekRow<'a> {
    pub start: NaiveDate,
    pub week_number: i64,
    pub label: Option<&'static str>,
    pub is_this_week: bool,
    pub days: Vec<DayCell<'a>>,
}

impl WeekRow<'_> {
    pub fn title(&self) -> String {
        let base = match self.label {
            Some(label) => label.to_string(),
            None => format!("Week {}", self.week_number),
        };
        if self.is_this_week {
            format!("This Week ({})", base)
        } else {
            base
        }
    }

    pub fn event_count(&self) -> usize {
        self.days.iter().map(|d| d.entries.len()).sum()
    }
}

/// The events of `day`, each with its per-day fields resolved.
pub fn day_entries(day: NaiveDate, events: &[Event]) -> Vec<DayEntry<'_>> {
    events_on_day(day, events)
        .into_iter()
        .map(|event| DayEntry {
            event,
            fields: event.effective(day),
        })
        .collect()
}

/// Week rows from the week containing `today` through the end of the academic
/// year. The first row is the current week.
pub fn build_weeks(today: NaiveDate, events: &[Event]) -> Vec<WeekRow<'_>> {
    let end = academic_end();
    let mut rows = Vec::new();
    let mut cursor = week_start(today);

    while cursor <= end {
        let days = (0..7)
            .map(|offset| {
                let date = cursor + Duration::days(offset);
                DayCell {
                    date,
                    is_today: date == today,
                    entries: day_entries(date, events),
                }
            })
            .collect();

        rows.push(WeekRow {
            start: cursor,
            week_number: week_number(cursor),
            label: label_for(cursor),
            is_this_week: rows.is_empty(),
            days,
        });
        cursor += Duration::days(7);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DayOverride;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_weeks_from_today() {
        let weeks = build_weeks(date(2025, 11, 26), &[]);
        assert_eq!(weeks[0].start, date(2025, 11, 24));
        assert!(weeks[0].is_this_week);
        assert!(!weeks[1].is_this_week);
        assert_eq!(weeks[0].title(), "This Week (Mid Semester I Break)");
        assert_eq!(weeks[1].title(), "Week 7");
        assert_eq!(weeks[0].week_number, 7);

        let last = weeks.last().unwrap();
        assert_eq!(last.start, date(2026, 8, 10));
        assert_eq!(weeks.len(), 38);

        let today: Vec<_> = weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .filter(|d| d.is_today)
            .map(|d| d.date)
            .collect();
        assert_eq!(today, vec![date(2025, 11, 26)]);
    }

    #[test]
    fn test_unlabeled_week_title_uses_week_number() {
        let weeks = build_weeks(date(2025, 9, 17), &[]);
        assert_eq!(weeks[0].label, None);
        assert_eq!(weeks[0].week_number, -3);
        assert_eq!(weeks[0].title(), "This Week (Week -3)");
        assert_eq!(weeks[1].title(), "Week -2");
    }

    #[test]
    fn test_after_academic_end_is_empty() {
        assert!(build_weeks(date(2026, 8, 17), &[]).is_empty());
    }

    #[test]
    fn test_day_entries_use_effective_fields() {
        let mut event = Event::new("cup", "Dean's Cup 2025", date(2025, 12, 5), date(2025, 12, 14));
        event.location = Some("Main Hall".to_string());
        event.per_day.insert(
            date(2025, 12, 10),
            DayOverride {
                location: Some("Room B".to_string()),
                ..DayOverride::default()
            },
        );
        let events = vec![event];

        let weeks = build_weeks(date(2025, 12, 8), &events);
        let week = &weeks[0];
        assert_eq!(week.event_count(), 7);
        let wednesday = &week.days[2];
        assert_eq!(wednesday.date, date(2025, 12, 10));
        assert_eq!(wednesday.entries[0].fields.location.as_deref(), Some("Room B"));
        let thursday = &week.days[3];
        assert_eq!(thursday.entries[0].fields.location.as_deref(), Some("Main Hall"));

        assert_eq!(weeks[1].days[0].entries.len(), 0);
    }
}
