//! Commands changing a single day.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    storage::json_store::Store,
    utils::percentage::{Amount, Percentage},
};

use super::{
    output::{print_over_allocation, print_resolution, print_status},
    Session,
};

pub fn status<S: Store>(session: &Session<S>, date: NaiveDate) {
    let day = session.book.view(date, &session.settings.obligations);
    print_status(&day);
}

fn warn_suspicious_hours(amount: Amount) {
    if let Amount::Hours(percentage) = amount {
        if *percentage > 100. {
            let hours = percentage.as_hours();
            println!(
                "⚠️  Warning: {hours:.2} hours is {percentage} of an 8-hour day (>100%). Did you mean {:.2} hours?",
                hours / 10.
            );
        }
    }
}

/// Resolves a project typed by the user, printing how it was interpreted.
fn resolve_project<S: Store>(session: &Session<S>, input: &str) -> String {
    let resolution = session.settings.registry.resolve(input);
    print_resolution(input, &resolution);
    resolution.name
}

pub async fn add<S: Store>(
    session: &mut Session<S>,
    project: &str,
    amount: Amount,
    date: NaiveDate,
) -> Result<()> {
    let project = resolve_project(session, project);
    warn_suspicious_hours(amount);
    let percentage = amount.to_percentage();

    let day = session.book.day_mut(date, &session.settings.obligations);
    day.add_or_update(&project, percentage);
    info!("Added {percentage} to {project} on {date}");

    session.save_days().await?;
    report_change(session, date, &format!("Added {percentage} to {project}"));
    Ok(())
}

pub async fn edit<S: Store>(
    session: &mut Session<S>,
    project: &str,
    amount: Amount,
    date: NaiveDate,
) -> Result<()> {
    let project = resolve_project(session, project);
    warn_suspicious_hours(amount);
    let percentage = amount.to_percentage();

    let mut day = session
        .book
        .view(date, &session.settings.obligations)
        .into_owned();
    day.edit(&project, percentage)?;
    session.book.insert(day);
    info!("Updated {project} to {percentage} on {date}");

    session.save_days().await?;
    report_change(session, date, &format!("Updated {project} to {percentage}"));
    Ok(())
}

pub async fn fill<S: Store>(session: &mut Session<S>, project: &str, date: NaiveDate) -> Result<()> {
    let project = resolve_project(session, project);

    let mut day = session
        .book
        .view(date, &session.settings.obligations)
        .into_owned();
    let filled = day.fill(&project)?;
    session.book.insert(day);
    info!("Filled {filled:.1}% to {project} on {date}");

    session.save_days().await?;
    let hours = Percentage::new_opt(filled).map(|v| v.as_hours()).unwrap_or_default();
    report_change(
        session,
        date,
        &format!("Filled remaining {filled:.1}% ({hours:.2} hours) to {project}"),
    );
    Ok(())
}

pub async fn remove<S: Store>(session: &mut Session<S>, project: &str, date: NaiveDate) -> Result<()> {
    // No fuzzy matching here, a typo should never remove another project.
    let project = session
        .settings
        .registry
        .canonical(project)
        .map_or_else(|| project.to_string(), |(name, _)| name.to_string());

    let removed = session
        .book
        .get(date)
        .is_some_and(|v| v.allocation(&project).is_some());
    if !removed {
        println!("Project '{project}' not found{}", session.on_date(date));
        return Ok(());
    }

    session
        .book
        .day_mut(date, &session.settings.obligations)
        .remove(&project);
    info!("Removed {project} on {date}");

    session.save_days().await?;
    report_change(session, date, &format!("Removed {project}"));
    Ok(())
}

pub async fn undo<S: Store>(session: &mut Session<S>, date: NaiveDate) -> Result<()> {
    let mut day = session
        .book
        .view(date, &session.settings.obligations)
        .into_owned();
    let (project, percent) = day.undo()?;
    session.book.insert(day);
    info!("Undid {project} on {date}");

    session.save_days().await?;
    report_change(session, date, &format!("Removed {project} ({percent:.1}%)"));
    Ok(())
}

pub async fn exclude<S: Store>(
    session: &mut Session<S>,
    name: &str,
    amount: Amount,
    date: NaiveDate,
) -> Result<()> {
    let percentage = amount.to_percentage();
    session
        .book
        .day_mut(date, &session.settings.obligations)
        .exclude_one_off(name, percentage);
    info!("Excluded {percentage} for {name} on {date}");

    session.save_days().await?;
    report_change(session, date, &format!("Excluded {percentage} for {name}"));
    Ok(())
}

pub async fn remove_exclusion<S: Store>(
    session: &mut Session<S>,
    name: &str,
    date: NaiveDate,
) -> Result<()> {
    let mut day = session
        .book
        .view(date, &session.settings.obligations)
        .into_owned();
    day.remove_exclusion(name)?;
    session.book.insert(day);
    info!("Removed exclusion {name} on {date}");

    session.save_days().await?;
    report_change(session, date, &format!("Removed excluded meeting: {name}"));
    Ok(())
}

pub async fn clear<S: Store>(session: &mut Session<S>, date: NaiveDate, yes: bool) -> Result<()> {
    if !session.book.contains(date) {
        println!("Nothing stored for {date}");
        return Ok(());
    }
    if !yes && !confirm(&format!("Clear all data for {date}? (y/n): "))? {
        return Ok(());
    }

    session.book.clear(date);
    info!("Cleared {date}");
    session.save_days().await?;
    println!("Cleared data for {date}");
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn report_change<S: Store>(session: &Session<S>, date: NaiveDate, message: &str) {
    println!("{message}{}", session.on_date(date));
    if let Some(day) = session.book.get(date) {
        if let Some(over) = day.over_allocation() {
            warn!("{date} is over-allocated by {over:.1}%");
            print_over_allocation(over);
        }
        print_status(day);
    }
}
