mod academic;
mod calendar;
mod cli;
mod dates;
mod event;
mod query;
mod seed;
mod store;
mod timeline;

use std::fs;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::dates::{day_only, format_display_date, format_time_range, parse_time, week_end, week_start};
use crate::event::{Department, Event, EventFields, EventUpdate, PUBLIC_HOLIDAY};
use crate::store::{EventStore, FileKeyValue};
use crate::timeline::Timeline;

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Trimmed text, with an empty value meaning "unset".
fn clean(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn clean_time(s: &str) -> Result<Option<NaiveTime>> {
    match clean(s) {
        Some(t) => Ok(Some(parse_time(&t)?)),
        None => Ok(None),
    }
}

fn category(event: &Event) -> &'static str {
    if event.is_public_holiday {
        PUBLIC_HOLIDAY
    } else {
        event.department.map(|d| d.as_str()).unwrap_or("-")
    }
}

fn filter_events(
    events: &[Event],
    today: NaiveDate,
    include_past: bool,
    department: Option<Department>,
) -> Vec<&Event> {
    let mut filtered: Vec<&Event> = events
        .iter()
        .filter(|e| {
            // Hide events that have already ended
            if !include_past && e.end_date < today {
                return false;
            }
            // Filter by department
            if let Some(d) = department {
                if e.department != Some(d) {
                    return false;
                }
            }
            true
        })
        .collect();

    // Sort by date and name
    filtered.sort_by(|a, b| {
        a.start_date.cmp(&b.start_date)
            .then_with(|| a.name.cmp(&b.name))
    });

    filtered
}

/// Field flags as given to `edit`. `None` keeps the current value and an
/// empty string clears it.
#[derive(Debug, Default)]
struct FieldEdits {
    location: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    description: Option<String>,
}

/// Build the update for an `edit` command.
///
/// Unspecified fields start from the values shown on `date` (or the event
/// defaults without one). With `this_day_only` the result is stored as an
/// override for that day; otherwise it replaces the shared defaults.
fn edit_update(
    event: &Event,
    date: Option<NaiveDate>,
    this_day_only: bool,
    name: Option<String>,
    department: Option<Department>,
    edits: FieldEdits,
) -> Result<EventUpdate> {
    if let Some(day) = date {
        if !event.occurs_on(day) {
            anyhow::bail!("{} is outside the event ({} - {})", day, event.start_date, event.end_date);
        }
    }

    let base = date.map(|d| event.effective(d)).unwrap_or_else(|| event.defaults());
    let fields = EventFields {
        location: edits.location.map(|l| clean(&l)).unwrap_or(base.location),
        start_time: edits.start_time.map(|t| clean_time(&t)).transpose()?.unwrap_or(base.start_time),
        end_time: edits.end_time.map(|t| clean_time(&t)).transpose()?.unwrap_or(base.end_time),
        description: edits.description.map(|d| clean(&d)).unwrap_or(base.description),
    };

    match (date, this_day_only) {
        (Some(day), true) => {
            if name.is_some() || department.is_some() {
                anyhow::bail!("Name and department apply to all days; drop --this-day-only to change them");
            }
            Ok(EventUpdate::this_day_only(event, day, fields))
        }
        (None, true) => anyhow::bail!("--this-day-only needs --date"),
        (_, false) => {
            let name = match name {
                Some(n) => clean(&n).context("Event name must not be empty")?,
                None => event.name.clone(),
            };
            Ok(EventUpdate::all_days(name, department.or(event.department), fields))
        }
    }
}

fn print_events(events: &[&Event]) {
    println!("\n{:<40} {:<12} {:<12} {:<15} {:<25} {}",
        "name", "start.date", "end.date", "department", "location", "id");
    println!("{}", "-".repeat(125));
    for event in events {
        println!("{:<40} {:<12} {:<12} {:<15} {:<25} {}",
            truncate(&event.name, 38),
            event.start_date.format("%Y-%m-%d"),
            event.end_date.format("%Y-%m-%d"),
            category(event),
            event.location.as_deref().map(|l| truncate(l, 23)).unwrap_or_default(),
            event.id,
        );
        if let Some(times) = format_time_range(event.start_time, event.end_time) {
            println!("  time: {}", times);
        }
        if let Some(desc) = &event.description {
            println!("  description: {}", truncate(&desc.replace('\n', " | "), 100));
        }
        if !event.per_day.is_empty() {
            let days: Vec<String> = event.per_day.keys().map(|d| d.format("%Y-%m-%d").to_string()).collect();
            println!("  per-day overrides: {}", days.join(", "));
        }
    }
}

fn print_entry(event: &Event, fields: &EventFields) {
    println!("  - {} [{}]", event.name, category(event));
    if let Some(times) = format_time_range(fields.start_time, fields.end_time) {
        println!("      time: {}", times);
    }
    if let Some(location) = &fields.location {
        println!("      location: {}", location);
    }
    if let Some(desc) = &fields.description {
        println!("      {}", truncate(&desc.replace('\n', " | "), 100));
    }
}

fn print_timeline(timeline: &Timeline<'_>) {
    let (start, end) = timeline.semester.range();
    println!("\n{} timeline ({} - {})", timeline.semester, format_display_date(start), format_display_date(end));
    println!("{}", "=".repeat(60));
    for (department, count) in &timeline.counts {
        println!("  {:>4}  {}", count, department);
    }
    println!("{:-<60}", "");

    let spans = timeline.special_spans();
    for (i, week) in timeline.weeks.iter().enumerate() {
        if week.is_special {
            if let Some(span) = spans.iter().find(|s| s.start_idx == i) {
                println!("{:<12} [{}]", week.start.format("%Y-%m-%d"), span.label);
            }
            continue;
        }
        println!("{} - {}  {}", week.start.format("%Y-%m-%d"), week.end.format("%m-%d"), week.title());
        for event in &week.events {
            println!("    {} ({})", truncate(&event.name, 60), category(event));
        }
    }
    println!();
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let store_path = match cli.store {
        Some(path) => path,
        None => store::default_store_path()?,
    };
    let mut store = EventStore::open(FileKeyValue::new(&store_path))
        .with_context(|| format!("Failed to open store: {}", store_path.display()))?;
    tracing::debug!("Loaded {} events from {}", store.all().len(), store.backend().path().display());

    let now = Local::now().naive_local();
    let today = day_only(now);

    match cli.command {
        Commands::List { past, department } => {
            let events = filter_events(store.all(), today, past, department);
            print_events(&events);
            println!("\n{} of {} events", events.len(), store.all().len());
        }
        Commands::Add { name, start, end, department, location, start_time, end_time, description } => {
            let Some(name) = clean(&name) else {
                anyhow::bail!("Event name must not be empty");
            };
            let end = end.unwrap_or(start);
            if end < start {
                anyhow::bail!("End date {} is before start date {}", end, start);
            }

            let mut event = Event::new(store.next_id(), name, start, end);
            event.department = Some(department);
            event.location = location.as_deref().and_then(clean);
            event.start_time = start_time.as_deref().map(clean_time).transpose()?.flatten();
            event.end_time = end_time.as_deref().map(clean_time).transpose()?.flatten();
            event.description = description.as_deref().and_then(clean);

            let summary = event.to_string();
            let id = event.id.clone();
            store.add(event).context("Failed to add event")?;
            println!("Added {} (id: {})", summary, id);
        }
        Commands::Edit { id, date, this_day_only, name, department, location, start_time, end_time, description } => {
            let Some(event) = store.get(&id) else {
                tracing::warn!("No event with id '{}'", id);
                return Ok(());
            };
            let edits = FieldEdits { location, start_time, end_time, description };
            let update = edit_update(event, date, this_day_only, name, department, edits)?;

            store.update(&id, update).context("Failed to update event")?;
            println!("Updated event {}", id);
        }
        Commands::Delete { id } => {
            let summary = store.get(&id).map(|e| e.to_string());
            if store.delete(&id).context("Failed to delete event")? {
                println!("Deleted {}", summary.unwrap_or(id));
            } else {
                tracing::warn!("No event with id '{}'", id);
            }
        }
        Commands::Day { date } => {
            let day = date.unwrap_or(today);
            let entries = calendar::day_entries(day, store.all());
            println!("\n{} ({})", format_display_date(day), day.format("%a"));
            if entries.is_empty() {
                println!("  No events");
            }
            for entry in &entries {
                print_entry(entry.event, &entry.fields);
            }
            println!();
        }
        Commands::Weeks { from, limit } => {
            let weeks = calendar::build_weeks(from.unwrap_or(today), store.all());
            let limit = limit.unwrap_or(weeks.len());
            for week in weeks.iter().take(limit) {
                println!("\n{}  ({}, {} events)", week.title(), format_display_date(week.start), week.event_count());
                println!("{}", "-".repeat(60));
                for day in &week.days {
                    let marker = if day.is_today { "*" } else { " " };
                    if day.entries.is_empty() {
                        println!("{}{} {}  No events", marker, day.date.format("%a"), day.date.format("%-d %b"));
                        continue;
                    }
                    println!("{}{} {}", marker, day.date.format("%a"), day.date.format("%-d %b"));
                    for entry in &day.entries {
                        print_entry(entry.event, &entry.fields);
                    }
                }
            }
            println!();
        }
        Commands::WeekInfo { date } => {
            let day = date.unwrap_or(today);
            let start = week_start(day);
            println!("date:        {}", day.format("%Y-%m-%d (%a)"));
            println!("week:        {} - {}", start.format("%Y-%m-%d"), week_end(day).format("%Y-%m-%d"));
            println!("week number: {}", academic::week_number(start));
            println!("label:       {}", academic::label_for(start).unwrap_or("-"));
        }
        Commands::Timeline { semester, output } => {
            let timeline = Timeline::build(store.all(), semester);
            print_timeline(&timeline);

            if let Some(output) = output {
                let path = if output.is_dir() {
                    output.join(semester.file_name())
                } else {
                    output
                };
                let svg = timeline.render_svg(Some(now)).context("Failed to render SVG")?;
                fs::write(&path, svg)
                    .with_context(|| format!("Failed to write SVG: {}", path.display()))?;
                tracing::info!("Wrote {} timeline to {}", semester, path.display());
            }
        }
        Commands::Reset => {
            store.reset().context("Failed to reset store")?;
            println!("Restored {} initial events", store.all().len());
        }
    }

    Ok(())
}
