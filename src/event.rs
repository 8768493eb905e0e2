use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Category string that marks a public holiday in seed data and legacy snapshots.
pub const PUBLIC_HOLIDAY: &str = "Public Holiday";

/// Legacy category name folded into [`Department::AnW`].
pub const LEGACY_COLLABORATION: &str = "Collaboration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Event Prep")]
    EventPrep,
    Internal,
    #[serde(rename = "SPR")]
    Spr,
    #[serde(rename = "A&W", alias = "Collaboration")]
    AnW,
    Execution,
    Flagship,
}

impl Department {
    pub const ALL: [Department; 6] = [
        Department::EventPrep,
        Department::Internal,
        Department::Spr,
        Department::AnW,
        Department::Execution,
        Department::Flagship,
    ];

    /// Departments drawn on the semester timeline.
    pub const TRACKED: [Department; 4] = [
        Department::Spr,
        Department::AnW,
        Department::Execution,
        Department::Flagship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::EventPrep => "Event Prep",
            Department::Internal => "Internal",
            Department::Spr => "SPR",
            Department::AnW => "A&W",
            Department::Execution => "Execution",
            Department::Flagship => "Flagship",
        }
    }

    pub fn is_tracked(&self) -> bool {
        Self::TRACKED.contains(self)
    }

    /// Fill colour for timeline pills.
    pub fn timeline_color(&self) -> &'static str {
        match self {
            Department::Spr => "#10b981",
            Department::AnW => "#f59e0b",
            Department::Flagship => "#ef4444",
            _ => "#6366f1",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown department '{0}'")]
pub struct UnknownDepartment(pub String);

impl FromStr for Department {
    type Err = UnknownDepartment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == LEGACY_COLLABORATION {
            return Ok(Department::AnW);
        }
        Department::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDepartment(s.to_string()))
    }
}

/// Split a raw category string into `(department, is_public_holiday)`.
///
/// Unknown categories are logged and dropped.
pub fn classify_department(raw: Option<&str>) -> (Option<Department>, bool) {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => (None, false),
        Some(PUBLIC_HOLIDAY) => (None, true),
        Some(s) => match s.parse::<Department>() {
            Ok(department) => (Some(department), false),
            Err(e) => {
                tracing::warn!("Dropping department: {}", e);
                (None, false)
            }
        },
    }
}

/// Per-date exception to an event's default display fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<EventFields> for DayOverride {
    fn from(fields: EventFields) -> Self {
        Self {
            location: fields.location,
            start_time: fields.start_time,
            end_time: fields.end_time,
            description: fields.description,
        }
    }
}

/// The display fields of an event as resolved for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFields {
    pub location: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub name: String,
    pub department: Option<Department>,
    pub is_public_holiday: bool,
    pub location: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub description: Option<String>,
    pub per_day: BTreeMap<NaiveDate, DayOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidEvent {
    #[error("event name must not be empty")]
    EmptyName,
    #[error("event ends ({end}) before it starts ({start})")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

impl Event {
    pub fn new(id: impl Into<String>, name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            start_date,
            end_date,
            name: name.into(),
            department: None,
            is_public_holiday: false,
            location: None,
            start_time: None,
            end_time: None,
            description: None,
            per_day: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), InvalidEvent> {
        if self.name.trim().is_empty() {
            return Err(InvalidEvent::EmptyName);
        }
        if self.start_date > self.end_date {
            return Err(InvalidEvent::InvertedRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    pub fn is_multi_day(&self) -> bool {
        self.start_date < self.end_date
    }

    /// Inclusive day membership.
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    /// The event's own defaults, ignoring per-day overrides.
    pub fn defaults(&self) -> EventFields {
        EventFields {
            location: self.location.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            description: self.description.clone(),
        }
    }

    /// Resolve display fields for `day`: an override field wins over the default.
    pub fn effective(&self, day: NaiveDate) -> EventFields {
        let Some(over) = self.per_day.get(&day) else {
            return self.defaults();
        };
        EventFields {
            location: over.location.clone().or_else(|| self.location.clone()),
            start_time: over.start_time.or(self.start_time),
            end_time: over.end_time.or(self.end_time),
            description: over.description.clone().or_else(|| self.description.clone()),
        }
    }

    /// Shallow merge: every field present in `update` replaces the current value.
    pub fn apply(&mut self, update: EventUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
        if let Some(department) = update.department {
            self.department = department;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(start_time) = update.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = update.end_time {
            self.end_time = end_time;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(per_day) = update.per_day {
            self.per_day = per_day;
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = if self.is_public_holiday {
            PUBLIC_HOLIDAY
        } else {
            self.department.map(|d| d.as_str()).unwrap_or("-")
        };
        if self.is_multi_day() {
            write!(f, "{} - {} [{}] {}", self.start_date, self.end_date, category, self.name)
        } else {
            write!(f, "{} [{}] {}", self.start_date, category, self.name)
        }
    }
}

/// Partial update. `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub department: Option<Option<Department>>,
    pub location: Option<Option<String>>,
    pub start_time: Option<Option<NaiveTime>>,
    pub end_time: Option<Option<NaiveTime>>,
    pub description: Option<Option<String>>,
    pub per_day: Option<BTreeMap<NaiveDate, DayOverride>>,
}

impl EventUpdate {
    /// Overwrite the shared defaults. Existing per-day overrides are left alone
    /// and keep winning on their own dates.
    pub fn all_days(name: String, department: Option<Department>, fields: EventFields) -> Self {
        Self {
            name: Some(name),
            department: Some(department),
            location: Some(fields.location),
            start_time: Some(fields.start_time),
            end_time: Some(fields.end_time),
            description: Some(fields.description),
            ..Self::default()
        }
    }

    /// Replace the override for `day` only; defaults are untouched.
    pub fn this_day_only(event: &Event, day: NaiveDate, fields: EventFields) -> Self {
        let mut per_day = event.per_day.clone();
        per_day.insert(day, DayOverride::from(fields));
        Self {
            per_day: Some(per_day),
            ..Self::default()
        }
    }
}

/// Wall-clock times persisted as `HH:MM`.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => crate::dates::parse_time(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn deans_cup() -> Event {
        let mut event = Event::new("cup", "Dean's Cup 2025", date(2025, 12, 5), date(2025, 12, 14));
        event.department = Some(Department::Flagship);
        event.location = Some("Main Hall".to_string());
        event.start_time = Some(time(9, 0));
        event.end_time = Some(time(17, 0));
        event.description = Some("Finals".to_string());
        event
    }

    #[test]
    fn test_department_parsing() {
        assert_eq!("A&W".parse::<Department>().unwrap(), Department::AnW);
        assert_eq!("Collaboration".parse::<Department>().unwrap(), Department::AnW);
        assert_eq!("event prep".parse::<Department>().unwrap(), Department::EventPrep);
        assert!("Public Holiday".parse::<Department>().is_err());
        assert!("Marketing".parse::<Department>().is_err());
    }

    #[test]
    fn test_department_serde_alias() {
        let d: Department = serde_json::from_str("\"Collaboration\"").unwrap();
        assert_eq!(d, Department::AnW);
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"A&W\"");
    }

    #[test]
    fn test_classify_department() {
        assert_eq!(classify_department(Some("Public Holiday")), (None, true));
        assert_eq!(classify_department(Some("Collaboration")), (Some(Department::AnW), false));
        assert_eq!(classify_department(Some("SPR")), (Some(Department::Spr), false));
        assert_eq!(classify_department(Some("Nonsense")), (None, false));
        assert_eq!(classify_department(None), (None, false));
    }

    #[test]
    fn test_effective_without_override_returns_defaults() {
        let event = deans_cup();
        assert_eq!(event.effective(date(2025, 12, 10)), event.defaults());
    }

    #[test]
    fn test_effective_partial_override_falls_back() {
        let mut event = deans_cup();
        event.per_day.insert(
            date(2025, 12, 10),
            DayOverride {
                location: Some("Room B".to_string()),
                end_time: Some(time(12, 0)),
                ..DayOverride::default()
            },
        );

        let fields = event.effective(date(2025, 12, 10));
        assert_eq!(fields.location.as_deref(), Some("Room B"));
        assert_eq!(fields.start_time, Some(time(9, 0)));
        assert_eq!(fields.end_time, Some(time(12, 0)));
        assert_eq!(fields.description.as_deref(), Some("Finals"));

        assert_eq!(event.effective(date(2025, 12, 11)).location.as_deref(), Some("Main Hall"));
    }

    #[test]
    fn test_all_days_update_keeps_overrides() {
        let mut event = deans_cup();
        event.per_day.insert(
            date(2025, 12, 10),
            DayOverride {
                location: Some("Room B".to_string()),
                ..DayOverride::default()
            },
        );

        let fields = EventFields {
            location: Some("Auditorium".to_string()),
            ..EventFields::default()
        };
        event.apply(EventUpdate::all_days("Dean's Cup".to_string(), Some(Department::Flagship), fields));

        assert_eq!(event.name, "Dean's Cup");
        assert_eq!(event.location.as_deref(), Some("Auditorium"));
        assert_eq!(event.start_time, None);
        assert_eq!(event.effective(date(2025, 12, 10)).location.as_deref(), Some("Room B"));
        assert_eq!(event.effective(date(2025, 12, 12)).location.as_deref(), Some("Auditorium"));
    }

    #[test]
    fn test_this_day_only_update_leaves_defaults() {
        let mut event = deans_cup();
        let fields = EventFields {
            location: Some("Lab 3".to_string()),
            ..EventFields::default()
        };
        let update = EventUpdate::this_day_only(&event, date(2025, 12, 6), fields);
        event.apply(update);

        assert_eq!(event.location.as_deref(), Some("Main Hall"));
        assert_eq!(event.per_day.len(), 1);
        let sixth = event.effective(date(2025, 12, 6));
        assert_eq!(sixth.location.as_deref(), Some("Lab 3"));
        assert_eq!(sixth.start_time, Some(time(9, 0)));
    }

    #[test]
    fn test_validate() {
        assert!(deans_cup().validate().is_ok());

        let mut unnamed = deans_cup();
        unnamed.name = "   ".to_string();
        assert_eq!(unnamed.validate(), Err(InvalidEvent::EmptyName));

        let inverted = Event::new("x", "Backwards", date(2025, 12, 14), date(2025, 12, 5));
        assert!(matches!(inverted.validate(), Err(InvalidEvent::InvertedRange { .. })));
    }

    #[test]
    fn test_occurs_on_is_inclusive() {
        let event = deans_cup();
        assert!(event.occurs_on(date(2025, 12, 5)));
        assert!(event.occurs_on(date(2025, 12, 14)));
        assert!(!event.occurs_on(date(2025, 12, 15)));
        assert!(!event.occurs_on(date(2025, 12, 4)));
    }

    #[test]
    fn test_day_override_serializes_hhmm() {
        let over = DayOverride {
            start_time: Some(time(14, 30)),
            ..DayOverride::default()
        };
        let json = serde_json::to_string(&over).unwrap();
        assert_eq!(json, r#"{"startTime":"14:30"}"#);

        let back: DayOverride = serde_json::from_str(r#"{"startTime":"14:30","endTime":""}"#).unwrap();
        assert_eq!(back, over);
    }
}
