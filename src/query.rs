use chrono::NaiveDate;

use crate::event::Event;
use crate::timeline::Semester;

/// Events whose inclusive `[start, end]` range contains `day`.
pub fn events_on_day<'a>(day: NaiveDate, events: impl IntoIterator<Item = &'a Event>) -> Vec<&'a Event> {
    events.into_iter().filter(|e| e.occurs_on(day)).collect()
}

/// Whether `event` intersects `[range_start, range_end]`: it starts inside,
/// ends inside, or spans the whole range.
pub fn overlaps(event: &Event, range_start: NaiveDate, range_end: NaiveDate) -> bool {
    let inside = |d: NaiveDate| range_start <= d && d <= range_end;
    inside(event.start_date)
        || inside(event.end_date)
        || (event.start_date <= range_start && event.end_date >= range_end)
}

pub fn events_in_week_range<'a>(
    week_start: NaiveDate,
    week_end: NaiveDate,
    events: impl IntoIterator<Item = &'a Event>,
) -> Vec<&'a Event> {
    events
        .into_iter()
        .filter(|e| overlaps(e, week_start, week_end))
        .collect()
}

/// Timeline subset: non-holiday events of a tracked department touching the semester.
pub fn semester_events(events: &[Event], semester: Semester) -> Vec<&Event> {
    let (start, end) = semester.range();
    events
        .iter()
        .filter(|e| !e.is_public_holiday)
        .filter(|e| e.department.is_some_and(|d| d.is_tracked()))
        .filter(|e| overlaps(e, start, end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Department;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: &str, start: NaiveDate, end: NaiveDate, department: Option<Department>) -> Event {
        let mut e = Event::new(id, id, start, end);
        e.department = department;
        e
    }

    #[test]
    fn test_events_on_day_scenario() {
        let cup = event("cup", date(2025, 12, 5), date(2025, 12, 14), Some(Department::Flagship));
        let events = vec![cup];

        let on_tenth = events_on_day(date(2025, 12, 10), &events);
        assert_eq!(on_tenth.len(), 1);
        assert_eq!(on_tenth[0].id, "cup");

        assert!(events_on_day(date(2025, 12, 15), &events).is_empty());
        assert_eq!(events_on_day(date(2025, 12, 5), &events).len(), 1);
        assert_eq!(events_on_day(date(2025, 12, 14), &events).len(), 1);
    }

    #[test]
    fn test_events_in_week_range() {
        let week_start = date(2025, 12, 8);
        let week_end = date(2025, 12, 14);
        let events = vec![
            event("inside", date(2025, 12, 10), date(2025, 12, 10), None),
            event("starts-before", date(2025, 12, 1), date(2025, 12, 8), None),
            event("ends-after", date(2025, 12, 14), date(2025, 12, 20), None),
            event("spans", date(2025, 11, 1), date(2026, 1, 1), None),
            event("before", date(2025, 12, 1), date(2025, 12, 7), None),
            event("after", date(2025, 12, 15), date(2025, 12, 16), None),
        ];

        let ids: Vec<&str> = events_in_week_range(week_start, week_end, &events)
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["inside", "starts-before", "ends-after", "spans"]);
    }

    #[test]
    fn test_semester_events_filters_holidays_and_untracked() {
        let mut holiday = event("deepavali", date(2025, 10, 20), date(2025, 10, 20), None);
        holiday.is_public_holiday = true;
        let events = vec![
            holiday,
            event("prep", date(2025, 10, 20), date(2025, 10, 21), Some(Department::EventPrep)),
            event("visit", date(2025, 10, 30), date(2025, 10, 30), Some(Department::Spr)),
            event("jam", date(2026, 1, 9), date(2026, 1, 11), Some(Department::Flagship)),
            event("hackathon", date(2026, 4, 3), date(2026, 4, 4), Some(Department::Flagship)),
        ];

        let sem1: Vec<&str> = semester_events(&events, Semester::One)
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(sem1, vec!["visit", "jam"]);

        let sem2: Vec<&str> = semester_events(&events, Semester::Two)
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(sem2, vec!["hackathon"]);
    }
}
