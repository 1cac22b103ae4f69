//! Timesheet CSV used to exchange tracked time with spreadsheets. The first column is the date
//! in the short `9-Dec` form, every other column is a project and a trailing total column is
//! optional.

use anyhow::{bail, Result};
use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, warn};

use crate::{
    engine::{
        day::{DayBook, DayRecord},
        resolver::ProjectRegistry,
    },
    utils::{percentage::Percentage, time::short_date},
};

pub const TOTAL_HEADER: &str = "Total Time Spent";

/// Formats with a year. Dates without one are parsed separately against the current year.
const IMPORT_DATE_FORMATS: [&str; 3] = ["%d-%b-%y", "%Y-%m-%d", "%m/%d/%Y"];

/// One exported line. Dates without a record are written with empty cells.
pub type Row<'a> = (NaiveDate, Option<&'a DayRecord>);

#[derive(Debug, Default, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub warnings: Vec<String>,
}

/// Monday to Sunday, starting at `monday`.
pub fn week_rows(book: &DayBook, monday: NaiveDate) -> Vec<Row<'_>> {
    (0..7)
        .map(|offset| monday + Duration::days(offset))
        .map(|date| (date, book.get(date)))
        .collect()
}

pub fn all_rows(book: &DayBook) -> Vec<Row<'_>> {
    book.iter().map(|v| (v.date(), Some(v))).collect()
}

/// Known projects keep their registry order. Anything else tracked in `rows` follows
/// alphabetically.
pub fn export_columns(registry: &ProjectRegistry, rows: &[Row]) -> Vec<String> {
    let mut columns = registry.projects().to_vec();
    let mut others = rows
        .iter()
        .filter_map(|v| v.1)
        .flat_map(|v| v.allocations().keys())
        .filter(|v| !columns.contains(*v))
        .cloned()
        .collect::<Vec<_>>();
    others.sort();
    others.dedup();
    columns.extend(others);
    columns
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn cell(value: f64) -> String {
    if value == 0. {
        String::new()
    } else {
        format!("{value:.1}%")
    }
}

pub fn render_csv(rows: &[Row], columns: &[String]) -> String {
    let mut output = String::from("Date");
    for column in columns {
        output.push(',');
        output.push_str(&quote(column));
    }
    output.push(',');
    output.push_str(TOTAL_HEADER);
    output.push('\n');

    for (date, day) in rows {
        output.push_str(&short_date(*date));
        let mut total = 0.;
        for column in columns {
            let value = day.and_then(|v| v.allocation(column)).unwrap_or_default();
            total += value;
            output.push_str(&format!(",{}", cell(value)));
        }
        output.push_str(&format!(",{}\n", cell(total)));
    }
    output
}

/// Splits one CSV line. Quoted fields may contain commas and doubled quotes.
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = vec![];
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_import_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    IMPORT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&format!("{input}-{}", today.year()), "%d-%b-%Y").ok()
        })
}

/// Merges a timesheet into `book`. Days that don't exist yet are created without recurring
/// obligations, and imported values never become the undo target.
pub fn import_csv(text: &str, book: &mut DayBook, today: NaiveDate) -> Result<ImportSummary> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        bail!("The timesheet is empty");
    };
    let header = split_record(header.trim_start_matches('\u{feff}'));
    if header.len() < 2 {
        bail!("A timesheet needs a date column and at least one project column");
    }

    let mut projects = &header[1..];
    if projects
        .last()
        .is_some_and(|v| v.to_lowercase().contains("total"))
    {
        projects = &projects[..projects.len() - 1];
    }
    let projects = projects.iter().map(|v| v.trim()).collect::<Vec<_>>();
    debug!("Importing columns {projects:?}");

    let mut summary = ImportSummary::default();
    let mut warn_about = |message: String| {
        warn!("{message}");
        summary.warnings.push(message);
    };
    let mut imported = 0;

    for (index, line) in lines {
        let record = split_record(line);
        let date_text = record[0].trim();
        if date_text.is_empty() {
            continue;
        }
        let Some(date) = parse_import_date(date_text, today) else {
            warn_about(format!(
                "Skipping row {} - invalid date format: {date_text}",
                index + 1
            ));
            continue;
        };

        let day = book.day_mut(date, &[]);
        for (project, value) in projects.iter().zip(record.iter().skip(1)) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match value.parse::<Percentage>() {
                Ok(percent) => day.import_allocation(project, percent),
                Err(_) => warn_about(format!(
                    "Invalid percentage for {project} on {date_text}: {value}"
                )),
            }
        }
        imported += 1;
    }

    summary.imported = imported;
    Ok(summary)
}
