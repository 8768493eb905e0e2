//! Academic year layout: the numbered week engine and the labeled period table.

use chrono::NaiveDate;

use crate::dates::{parse_iso, week_start};

/// A labeled, Monday-aligned range of weeks. Both endpoints are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekLabel {
    pub start: &'static str,
    pub end: &'static str,
    pub label: &'static str,
}

const fn entry(start: &'static str, end: &'static str, label: &'static str) -> WeekLabel {
    WeekLabel { start, end, label }
}

pub const WEEK_LABELS: &[WeekLabel] = &[
    // Semester I
    entry("2025-10-06", "2025-10-12", "Orientation (WOW)"),
    entry("2025-10-13", "2025-10-19", "Week 1"),
    entry("2025-10-20", "2025-10-26", "Week 2"),
    entry("2025-10-27", "2025-11-02", "Week 3"),
    entry("2025-11-03", "2025-11-09", "Week 4"),
    entry("2025-11-10", "2025-11-16", "Week 5"),
    entry("2025-11-17", "2025-11-23", "Week 6"),
    entry("2025-11-24", "2025-11-30", "Mid Semester I Break"),
    entry("2025-12-01", "2025-12-07", "Week 7"),
    entry("2025-12-08", "2025-12-14", "Week 8"),
    entry("2025-12-15", "2025-12-21", "Week 9"),
    entry("2025-12-22", "2025-12-28", "Week 10"),
    entry("2025-12-29", "2026-01-04", "Week 11"),
    entry("2026-01-05", "2026-01-11", "Week 12"),
    entry("2026-01-12", "2026-01-18", "Week 13"),
    entry("2026-01-19", "2026-01-25", "Week 14"),
    entry("2026-01-26", "2026-02-01", "Revision Week"),
    entry("2026-02-02", "2026-02-22", "Semester I Final Examination"),
    entry("2026-02-23", "2026-03-08", "Semester I Break"),
    // Semester II
    entry("2026-03-09", "2026-03-15", "Week 1 (Sem 2)"),
    entry("2026-03-16", "2026-03-22", "Week 2 (Sem 2)"),
    entry("2026-03-23", "2026-03-29", "Week 3 (Sem 2)"),
    entry("2026-03-30", "2026-04-05", "Week 4 (Sem 2)"),
    entry("2026-04-06", "2026-04-12", "Week 5 (Sem 2)"),
    entry("2026-04-13", "2026-04-19", "Week 6 (Sem 2)"),
    entry("2026-04-20", "2026-04-26", "Week 7 (Sem 2)"),
    entry("2026-04-27", "2026-05-03", "Mid Semester II Break"),
    entry("2026-05-04", "2026-05-10", "Week 8 (Sem 2)"),
    entry("2026-05-11", "2026-05-17", "Week 9 (Sem 2)"),
    entry("2026-05-18", "2026-05-24", "Week 10 (Sem 2)"),
    entry("2026-05-25", "2026-05-31", "Week 11 (Sem 2)"),
    entry("2026-06-01", "2026-06-07", "Week 12 (Sem 2)"),
    entry("2026-06-08", "2026-06-14", "Week 13 (Sem 2)"),
    entry("2026-06-15", "2026-06-21", "Week 14 (Sem 2)"),
    entry("2026-06-22", "2026-06-28", "Revision Week (Sem 2)"),
    entry("2026-06-29", "2026-07-19", "Semester II Final Examination"),
    entry("2026-07-20", "2026-08-16", "Semester II Break"),
];

impl WeekLabel {
    /// Whether the week containing `date` falls inside this entry.
    ///
    /// Endpoints that fail to parse never match; the table is static so this
    /// only guards against a bad edit.
    pub fn contains_week(&self, date: NaiveDate) -> bool {
        let (Ok(start), Ok(end)) = (parse_iso(self.start), parse_iso(self.end)) else {
            return false;
        };
        let week = week_start(date);
        week >= week_start(start) && week <= week_start(end)
    }
}

/// Monday of the first teaching week (Week 1, Semester I).
pub fn academic_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 13).expect("valid epoch date")
}

/// Last day rendered by the calendar grid.
pub fn academic_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 16).expect("valid academic end date")
}

/// 1-based sequential week index relative to the academic epoch.
///
/// Weeks before the epoch count down through 0 and negative values.
pub fn week_number(date: NaiveDate) -> i64 {
    let elapsed = week_start(date)
        .signed_duration_since(week_start(academic_epoch()))
        .num_days();
    elapsed.div_euclid(7) + 1
}

/// Label of the first table entry whose week range contains `date`.
pub fn label_for(date: NaiveDate) -> Option<&'static str> {
    WEEK_LABELS
        .iter()
        .find(|item| item.contains_week(date))
        .map(|item| item.label)
}

/// Breaks, revision and exam weeks are drawn as spans on the timeline rail.
pub fn is_special_label(label: &str) -> bool {
    label.contains("Break") || label.contains("Revision") || label.contains("Examination")
}

/// The `N` in a `Week N` label.
pub fn label_week_number(label: &str) -> Option<u32> {
    let (_, rest) = label.split_once("Week ")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_epoch_is_monday() {
        assert_eq!(week_start(academic_epoch()), academic_epoch());
        assert_eq!(academic_end(), parse_iso(WEEK_LABELS.last().unwrap().end).unwrap());
    }

    #[test]
    fn test_table_is_week_aligned_and_ordered() {
        let mut previous_end: Option<NaiveDate> = None;
        for item in WEEK_LABELS {
            let start = parse_iso(item.start).unwrap();
            let end = parse_iso(item.end).unwrap();
            assert_eq!(week_start(start), start, "{} not a Monday", item.start);
            assert!(start <= end);
            if let Some(prev) = previous_end {
                assert!(start > prev, "{} overlaps previous entry", item.label);
            }
            previous_end = Some(end);
        }
        assert_eq!(WEEK_LABELS.len(), 37);
    }

    #[test]
    fn test_week_number_increments_by_one() {
        let epoch = academic_epoch();
        assert_eq!(week_number(epoch), 1);
        assert_eq!(week_number(epoch + Duration::days(6)), 1);
        assert_eq!(week_number(epoch - Duration::days(1)), 0);
        assert_eq!(week_number(epoch - Duration::days(7)), 0);
        assert_eq!(week_number(epoch - Duration::days(8)), -1);

        let mut ws = epoch;
        let mut expected = 1;
        while ws <= academic_end() {
            assert_eq!(week_number(ws), expected);
            assert_eq!(week_number(ws), week_number(ws));
            ws += Duration::days(7);
            expected += 1;
        }
    }

    #[test]
    fn test_label_at_epoch() {
        assert_eq!(label_for(week_start(academic_epoch())), Some("Week 1"));
    }

    #[test]
    fn test_label_scenarios() {
        assert_eq!(label_for(date(2025, 10, 13)), Some("Week 1"));
        assert_eq!(label_for(date(2025, 11, 24)), Some("Mid Semester I Break"));
        assert_eq!(label_for(date(2025, 10, 8)), Some("Orientation (WOW)"));
        assert_eq!(label_for(date(2026, 2, 15)), Some("Semester I Final Examination"));
        assert_eq!(label_for(date(2026, 3, 11)), Some("Week 1 (Sem 2)"));
        assert_eq!(label_for(date(2026, 8, 16)), Some("Semester II Break"));
    }

    #[test]
    fn test_label_outside_table() {
        assert_eq!(label_for(date(2025, 10, 5)), None);
        assert_eq!(label_for(date(2025, 1, 1)), None);
        assert_eq!(label_for(date(2026, 8, 17)), None);
    }

    #[test]
    fn test_label_number_independent_of_week_number() {
        let midsem = date(2025, 11, 24);
        assert_eq!(week_number(midsem), 7);
        assert_eq!(label_for(midsem), Some("Mid Semester I Break"));
        assert_eq!(week_number(date(2025, 12, 1)), 8);
        assert_eq!(label_for(date(2025, 12, 1)), Some("Week 7"));
    }

    #[test]
    fn test_special_labels() {
        assert!(is_special_label("Mid Semester I Break"));
        assert!(is_special_label("Revision Week (Sem 2)"));
        assert!(is_special_label("Semester II Final Examination"));
        assert!(!is_special_label("Week 4"));
        assert!(!is_special_label("Orientation (WOW)"));
    }

    #[test]
    fn test_label_week_number() {
        assert_eq!(label_week_number("Week 12"), Some(12));
        assert_eq!(label_week_number("Week 3 (Sem 2)"), Some(3));
        assert_eq!(label_week_number("Revision Week"), None);
        assert_eq!(label_week_number("Orientation (WOW)"), None);
    }
}
