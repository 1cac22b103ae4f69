use ansi_term::{Colour, Style};
use clap::Subcommand;

use crate::{storage::json_store::Store, utils::time::week_start};

use super::{
    output::{
        analysis::{project_history, statistics, summarize_week},
        percent, print_resolution, progress_bar,
    },
    Session,
};

const REPORT_WIDTH: usize = 60;

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    #[command(about = "Totals of the current week, Monday to Sunday")]
    Week,
    #[command(about = "History of a single project")]
    Project { name: String },
    #[command(about = "Statistics over every tracked day")]
    Stats,
}

fn bold() -> Style {
    Style::new().bold()
}

fn print_title(title: &str) {
    println!();
    println!("{}", bold().paint(format!("📊 {title}")));
}

pub fn process_report_command<S: Store>(session: &Session<S>, command: ReportCommand) {
    match command {
        ReportCommand::Week => print_week(session),
        ReportCommand::Project { name } => print_project(session, &name),
        ReportCommand::Stats => print_stats(session),
    }
}

fn print_week<S: Store>(session: &Session<S>) {
    let summary = summarize_week(&session.book, week_start(session.today));

    print_title("Weekly Report");
    println!(
        "{} to {}",
        summary.start.format("%b %-d"),
        summary.end.format("%b %-d, %Y")
    );
    println!("{}", "─".repeat(REPORT_WIDTH));

    if summary.days_tracked == 0 {
        println!("No data for this week");
        return;
    }

    println!("\n{}", bold().paint("Summary:"));
    println!("  Days tracked: {}/7", summary.days_tracked);
    println!("  Total available: {}", percent(summary.total_available));
    println!(
        "  Total tracked: {}",
        Colour::Blue.paint(percent(summary.total_tracked))
    );
    println!("  Average per day: {}", percent(summary.average_per_day()));

    println!("\n{}", bold().paint("Time by Project:"));
    for project in &summary.projects {
        let share = summary.share(project);
        println!(
            "  {} {} ({} of week) {}",
            progress_bar(share, 15),
            Colour::Blue.paint(percent(project.total)),
            Colour::Cyan.paint(format!("{share:.0}%")),
            project.name
        );
    }
    println!();
}

fn print_project<S: Store>(session: &Session<S>, input: &str) {
    let resolution = session.settings.registry.resolve(input);
    print_resolution(input, &resolution);
    let history = project_history(&session.book, &resolution.name);

    print_title(&format!("Project Report: {}", resolution.name));
    println!("{}", "─".repeat(REPORT_WIDTH));

    if history.entries.is_empty() {
        println!("No time tracked for project '{}'", resolution.name);
        return;
    }

    println!("\n{}", bold().paint("Summary:"));
    println!("  Days worked: {}", history.entries.len());
    println!("  Total time: {}", percent(history.total));
    println!("  Average per day: {}", percent(history.average_per_day()));

    println!("\n{}", bold().paint("Recent Activity:"));
    for (date, value) in history.recent() {
        println!(
            "  {}: {}",
            date.format("%b %-d, %Y"),
            Colour::Blue.paint(percent(*value))
        );
    }
    println!();
}

fn print_stats<S: Store>(session: &Session<S>) {
    print_title("Statistics");
    println!("{}", "─".repeat(REPORT_WIDTH));

    let Some(stats) = statistics(&session.book) else {
        println!("No data available");
        return;
    };

    println!("\n{}", bold().paint("Overall:"));
    println!("  Total days tracked: {}", stats.days);
    println!("  Average tracked: {}/day", percent(stats.average_tracked));
    println!("  Average available: {}/day", percent(stats.average_available));
    println!("  Fully allocated days: {}", stats.fully_allocated);
    println!(
        "  Over-allocated days: {}",
        Colour::Red.paint(stats.over_allocated.to_string())
    );

    if !stats.frequent_projects.is_empty() {
        println!("\n{}", bold().paint("Most Frequent Projects:"));
        for (index, (name, count)) in stats.frequent_projects.iter().enumerate() {
            println!("  {}. {name} ({count} days)", index + 1);
        }
    }
    println!();
}
