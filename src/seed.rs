use csv::{ReaderBuilder, StringRecord};

use crate::dates::{format_iso, parse_seed_date};
use crate::event::{classify_department, Event};

/// Initial dataset: `start \t end \t name \t department`, dates as `7-Oct-2025`.
const SEED_DATA: &str = include_str!("../data/seed_events.tsv");

const DEFAULT_DEPARTMENT: &str = "Event Prep";

pub fn initial_events() -> Vec<Event> {
    parse_seed(SEED_DATA)
}

/// Parse seed rows, skipping any row that is short or carries a bad date.
pub fn parse_seed(data: &str) -> Vec<Event> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(data.as_bytes());

    let mut events = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping seed row {}: {}", index + 1, e);
                continue;
            }
        };

        match parse_record(&record) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping seed row {} due to parse error: {:#}", index + 1, e),
        }
    }

    events
}

fn parse_record(record: &StringRecord) -> anyhow::Result<Option<Event>> {
    let cells: Vec<&str> = record
        .iter()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    if cells.is_empty() {
        return Ok(None);
    }
    if cells.len() < 3 {
        anyhow::bail!("expected at least 3 columns, found {}", cells.len());
    }

    let start_date = parse_seed_date(cells[0])?;
    let end_date = parse_seed_date(cells[1])?;
    let name = cells[2];
    let (department, is_public_holiday) =
        classify_department(Some(cells.get(3).copied().unwrap_or(DEFAULT_DEPARTMENT)));

    let mut event = Event::new(format!("{}-{}", format_iso(start_date), name), name, start_date, end_date);
    event.department = department;
    event.is_public_holiday = is_public_holiday;
    Ok(Some(event))
}
