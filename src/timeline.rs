//! Per-semester timeline: week buckets of tracked events laid out along a rail,
//! exportable as a standalone SVG document.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::academic::{is_special_label, label_for, label_week_number};
use crate::dates::week_start;
use crate::event::{Department, Event};
use crate::query::{events_in_week_range, semester_events};

const WEEK_WIDTH: u32 = 180;
const MIN_WIDTH: u32 = 1000;
const EVENT_WIDTH: u32 = 160;
const EVENT_ROW_HEIGHT: u32 = 34;
const RAIL_Y: u32 = 80;
const SVG_PADDING: u32 = 40;
const INK: &str = "#171717";
const MIDSEM_BREAK: &str = "Midsem Break";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semester {
    One,
    Two,
}

impl Semester {
    /// First and last day (inclusive) covered by the semester, exams included.
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).expect("valid semester date");
        match self {
            Semester::One => (ymd(2025, 10, 13), ymd(2026, 2, 22)),
            Semester::Two => (ymd(2026, 3, 9), ymd(2026, 7, 19)),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Semester::One => "Sem 1",
            Semester::Two => "Sem 2",
        }
    }

    /// Download name for the exported image, e.g. `sem-1-timeline.svg`.
    pub fn file_name(&self) -> String {
        format!("{}-timeline.svg", self.title().to_lowercase().replace(' ', "-"))
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone)]
pub struct TimelineWeek<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: Option<&'static str>,
    pub is_special: bool,
    /// Number shown in the week marker: the label's own `Week N` when it has
    /// one, otherwise a count of the non-special weeks so far.
    pub display_number: u32,
    pub events: Vec<&'a Event>,
}

impl TimelineWeek<'_> {
    pub fn title(&self) -> String {
        match self.label {
            Some(label) if label.contains("Week") => label.to_string(),
            _ => format!("Week {}", self.display_number),
        }
    }
}

/// A run of consecutive special weeks drawn as one block on the rail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialSpan {
    pub start_idx: usize,
    pub end_idx: usize,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct Timeline<'a> {
    pub semester: Semester,
    pub weeks: Vec<TimelineWeek<'a>>,
    pub counts: BTreeMap<Department, usize>,
}

impl<'a> Timeline<'a> {
    pub fn build(events: &'a [Event], semester: Semester) -> Self {
        let (start, end) = semester.range();
        let subset = semester_events(events, semester);

        let mut counts: BTreeMap<Department, usize> =
            Department::TRACKED.into_iter().map(|d| (d, 0)).collect();
        for department in subset.iter().filter_map(|e| e.department) {
            *counts.entry(department).or_insert(0) += 1;
        }

        let mut weeks = Vec::new();
        let mut cursor = week_start(start);
        let mut running = 1;

        while cursor <= end {
            let week_end = cursor + chrono::Duration::days(6);
            let label = label_for(cursor).map(timeline_label);
            let is_special = label.is_some_and(is_special_label);
            let display_number = label.and_then(label_week_number).unwrap_or(running);

            let week_events = events_in_week_range(cursor, week_end, subset.iter().copied());

            weeks.push(TimelineWeek {
                start: cursor,
                end: week_end,
                label,
                is_special,
                display_number,
                events: week_events,
            });

            if !is_special {
                running += 1;
            }
            cursor += chrono::Duration::days(7);
        }

        Self {
            semester,
            weeks,
            counts,
        }
    }

    pub fn special_spans(&self) -> Vec<SpecialSpan> {
        let mut spans = Vec::new();
        let mut current: Option<(usize, &'static str)> = None;

        for (i, week) in self.weeks.iter().enumerate() {
            match (week.is_special, week.label, current) {
                (true, Some(label), None) => current = Some((i, label)),
                (true, Some(_), Some(_)) => {}
                (_, _, Some((start_idx, label))) => {
                    spans.push(SpecialSpan {
                        start_idx,
                        end_idx: i - 1,
                        label,
                    });
                    current = None;
                }
                _ => {}
            }
        }
        if let Some((start_idx, label)) = current {
            spans.push(SpecialSpan {
                start_idx,
                end_idx: self.weeks.len() - 1,
                label,
            });
        }

        spans
    }

    pub fn width(&self) -> u32 {
        (self.weeks.len() as u32 * WEEK_WIDTH).max(MIN_WIDTH)
    }

    pub fn max_events_in_week(&self) -> usize {
        self.weeks.iter().map(|w| w.events.len()).max().unwrap_or(0)
    }

    /// Rail, week markers and the tallest event column, plus padding.
    pub fn height(&self) -> u32 {
        let event_list = self.max_events_in_week() as u32 * EVENT_ROW_HEIGHT;
        (140 + event_list + 40).max(200)
    }

    /// Horizontal offset of the "now" marker, when `now` falls inside the semester.
    pub fn now_offset(&self, now: NaiveDateTime) -> Option<f64> {
        let (start, end) = self.semester.range();
        let start = start.and_time(NaiveTime::MIN);
        let end = end.and_time(NaiveTime::MIN);
        if now < start || now > end {
            return None;
        }
        let elapsed = (now - start).num_milliseconds() as f64;
        let total = (end - start).num_milliseconds() as f64;
        Some(elapsed / total * f64::from(self.width()))
    }

    pub fn render_svg(&self, now: Option<NaiveDateTime>) -> Result<String, fmt::Error> {
        let width = self.width();
        let height = self.height();
        let svg_width = width + SVG_PADDING * 2;
        let svg_height = height + SVG_PADDING * 2;

        let mut svg = String::new();
        self.write_svg(&mut svg, width, height, svg_width, svg_height, now)?;
        Ok(svg)
    }

    fn write_svg(
        &self,
        out: &mut String,
        width: u32,
        height: u32,
        svg_width: u32,
        svg_height: u32,
        now: Option<NaiveDateTime>,
    ) -> fmt::Result {
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{svg_width}" height="{svg_height}" viewBox="0 0 {svg_width} {svg_height}">"#
        )?;
        writeln!(out, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;
        writeln!(out, r#"<g transform="translate({SVG_PADDING}, {SVG_PADDING})">"#)?;
        writeln!(
            out,
            r#"<line x1="0" y1="{RAIL_Y}" x2="{width}" y2="{RAIL_Y}" stroke="{INK}" stroke-width="4"/>"#
        )?;

        for span in self.special_spans() {
            let left = span.start_idx as u32 * WEEK_WIDTH;
            let span_width = (span.end_idx - span.start_idx + 1) as u32 * WEEK_WIDTH;
            writeln!(
                out,
                r#"<rect x="{left}" y="72" width="{span_width}" height="16" rx="4" fill="{INK}"/>"#
            )?;
            writeln!(
                out,
                r##"<text x="{}" y="82" text-anchor="middle" fill="#ffffff" font-size="11" font-weight="600">{}</text>"##,
                left + span_width / 2,
                escape_xml(span.label)
            )?;
        }

        for (i, week) in self.weeks.iter().enumerate() {
            if week.is_special {
                continue;
            }
            let center = i as u32 * WEEK_WIDTH + WEEK_WIDTH / 2;

            writeln!(out, r#"<circle cx="{center}" cy="{RAIL_Y}" r="18" fill="{INK}"/>"#)?;
            writeln!(
                out,
                r##"<text x="{center}" y="85" text-anchor="middle" fill="#ffffff" font-size="13" font-weight="600">{}</text>"##,
                week.display_number
            )?;
            writeln!(
                out,
                r#"<text x="{center}" y="110" text-anchor="middle" fill="{INK}" font-size="14" font-weight="500">{}</text>"#,
                escape_xml(&week.title())
            )?;

            for (ei, event) in week.events.iter().enumerate() {
                let color = event.department.unwrap_or(Department::Execution).timeline_color();
                let y = 140 + ei as u32 * EVENT_ROW_HEIGHT;
                let x = center - EVENT_WIDTH / 2;
                writeln!(
                    out,
                    r#"<rect x="{x}" y="{}" width="{EVENT_WIDTH}" height="28" rx="6" fill="{color}" opacity="0.9"/>"#,
                    y - 12
                )?;
                writeln!(
                    out,
                    r#"<line x1="{x}" y1="{}" x2="{x}" y2="{}" stroke="{color}" stroke-width="4"/>"#,
                    y - 12,
                    y + 16
                )?;
                writeln!(
                    out,
                    r##"<text x="{}" y="{}" fill="#ffffff" font-size="11" font-weight="500">{}</text>"##,
                    x + 10,
                    y + 2,
                    escape_xml(&event.name)
                )?;
            }
        }

        if let Some(left) = now.and_then(|n| self.now_offset(n)) {
            writeln!(
                out,
                r#"<line x1="{left:.1}" y1="32" x2="{left:.1}" y2="{height}" stroke="{INK}" stroke-width="1" opacity="0.5"/>"#
            )?;
            writeln!(
                out,
                r#"<rect x="{:.1}" y="0" width="40" height="20" rx="4" fill="{INK}"/>"#,
                left - 20.0
            )?;
            writeln!(
                out,
                r##"<text x="{left:.1}" y="13" text-anchor="middle" fill="#ffffff" font-size="10" font-weight="600">Now</text>"##
            )?;
        }

        writeln!(out, "</g>")?;
        writeln!(out, "</svg>")
    }
}

/// Both mid-semester breaks share one short name on the rail.
fn timeline_label(label: &'static str) -> &'static str {
    if label.starts_with("Mid Semester") && label.ends_with("Break") {
        MIDSEM_BREAK
    } else {
        label
    }
}

fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
