use ansi_term::Colour;

use crate::engine::day::{DayBook, DayRecord};

use super::{gray, percent, remaining_colour};

const DATE_WIDTH: usize = 14;
const PROJECT_WIDTH: usize = 15;

/// The most recent days of a [DayBook] together with every project tracked in them.
pub struct CalendarView<'a> {
    /// Newest first.
    pub days: Vec<&'a DayRecord>,
    /// Alphabetical.
    pub projects: Vec<String>,
}

pub fn recent_days(book: &DayBook, count: usize) -> CalendarView<'_> {
    let days = book.iter().rev().take(count).collect::<Vec<_>>();
    let mut projects = days
        .iter()
        .flat_map(|v| v.allocations().keys().cloned())
        .collect::<Vec<_>>();
    projects.sort();
    projects.dedup();
    CalendarView { days, projects }
}

fn column_name(project: &str) -> String {
    if project.chars().count() > PROJECT_WIDTH {
        format!("{}...", project.chars().take(PROJECT_WIDTH - 3).collect::<String>())
    } else {
        project.to_string()
    }
}

pub fn print_calendar(book: &DayBook, count: usize) {
    let view = recent_days(book, count);
    if view.days.is_empty() {
        println!("No tracked time found");
        return;
    }

    println!();
    print!("{:<DATE_WIDTH$}", "Date");
    for project in &view.projects {
        print!("  {:<PROJECT_WIDTH$}", column_name(project));
    }
    println!("  {:<9}  {:>6}", "Tracked", "Avail");
    println!(
        "{}",
        "─".repeat(DATE_WIDTH + view.projects.len() * (PROJECT_WIDTH + 2) + 23)
    );

    for day in &view.days {
        print!("{:<DATE_WIDTH$}", day.date().format("%a %d/%m/%y").to_string());
        for project in &view.projects {
            match day.allocation(project).filter(|v| *v > 0.) {
                Some(value) => print!(
                    "  {}{}",
                    Colour::Blue.paint(format!("{:<6}", percent(value))),
                    " ".repeat(PROJECT_WIDTH - 6)
                ),
                None => print!("  {:<PROJECT_WIDTH$}", "-"),
            }
        }

        let tracked = format!("{:<6}", percent(day.tracked_total()));
        let icon = if day.over_allocation().is_some() { " ⚠️" } else { "" };
        print!("  {}{icon:<3}", remaining_colour(day.remaining()).paint(tracked));

        let available = format!("{:>6}", percent(day.available_capacity()));
        if day.excluded_percent() > 0. {
            println!("  {}", gray().paint(available));
        } else {
            println!("  {available}");
        }
    }

    println!();
    println!(
        "{} {} On track  {} Nearly full (<10% left)  {} Over-allocated",
        gray().paint("Legend:"),
        Colour::Green.paint("●"),
        Colour::Yellow.paint("●"),
        Colour::Red.paint("●"),
    );
    println!(
        "  Tracked = time logged  |  Avail = available after excluding meetings ({} = has exclusions)",
        gray().paint("gray")
    );
    println!();
}
