use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::event::Department;
use crate::timeline::Semester;

#[derive(Parser)]
#[command(name = "academic-planner")]
#[command(author, version, about = "Plan events against the academic calendar")]
pub struct Cli {
    /// Store file (defaults to $PLANNER_STORE_PATH, then ./planner-store.json)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List upcoming events sorted by start date
    List {
        /// Include events that have already ended
        #[arg(long)]
        past: bool,

        /// Only include events from this department
        #[arg(short, long, value_parser = parse_department)]
        department: Option<Department>,
    },

    /// Add a new event
    Add {
        /// Event name
        #[arg(short, long)]
        name: String,

        /// First day of the event (YYYY-MM-DD)
        #[arg(short, long, value_parser = parse_date)]
        start: NaiveDate,

        /// Last day of the event (YYYY-MM-DD); defaults to the start date
        #[arg(short, long, value_parser = parse_date)]
        end: Option<NaiveDate>,

        /// Department (Event Prep, Internal, SPR, A&W, Execution, Flagship)
        #[arg(short, long, value_parser = parse_department, default_value = "Event Prep")]
        department: Department,

        #[arg(short, long)]
        location: Option<String>,

        /// Start time (HH:MM, 24h)
        #[arg(long)]
        start_time: Option<String>,

        /// End time (HH:MM, 24h)
        #[arg(long)]
        end_time: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Edit an event. Changes apply to all days unless --this-day-only is given.
    ///
    /// Pass an empty string to clear an optional field.
    Edit {
        /// Event id (see `list`)
        #[arg(long)]
        id: String,

        /// Day being edited (YYYY-MM-DD); unspecified fields keep that day's values
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Store the changes as an override for --date only
        #[arg(long, requires = "date", conflicts_with_all = ["name", "department"])]
        this_day_only: bool,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long, value_parser = parse_department)]
        department: Option<Department>,

        #[arg(short, long)]
        location: Option<String>,

        /// Start time (HH:MM, 24h)
        #[arg(long)]
        start_time: Option<String>,

        /// End time (HH:MM, 24h)
        #[arg(long)]
        end_time: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete an event permanently
    Delete {
        /// Event id (see `list`)
        #[arg(long)]
        id: String,
    },

    /// Show the events on a single day
    Day {
        /// Day to show (YYYY-MM-DD); defaults to today
        #[arg(value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Show the week-by-week calendar through the end of the academic year
    Weeks {
        /// Start from the week containing this date instead of the current week
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,

        /// Maximum number of weeks to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show the academic week number and label for a date
    WeekInfo {
        /// Date to look up (YYYY-MM-DD); defaults to today
        #[arg(value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Show the semester timeline, optionally exporting it as SVG
    Timeline {
        /// Semester (1 or 2)
        #[arg(short, long, value_parser = parse_semester, default_value = "1")]
        semester: Semester,

        /// Write the timeline as an SVG file (a directory gets the default file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Discard all changes and restore the initial event list
    Reset,
}

/// Years accepted on the command line.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD", s))?;
    if !YEAR_RANGE.contains(&date.year()) {
        return Err(format!(
            "Date '{}' is out of range. Use a year between {} and {}",
            s,
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        ));
    }
    Ok(date)
}

fn parse_department(s: &str) -> Result<Department, String> {
    s.parse::<Department>().map_err(|e| e.to_string())
}

fn parse_semester(s: &str) -> Result<Semester, String> {
    match s.trim().to_lowercase().as_str() {
        "1" | "i" | "sem1" => Ok(Semester::One),
        "2" | "ii" | "sem2" => Ok(Semester::Two),
        _ => Err(format!("Invalid semester '{}'. Use 1 or 2", s)),
    }
}
