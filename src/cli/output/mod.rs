pub mod analysis;
pub mod calendar;
pub mod timesheet;

use ansi_term::{Colour, Style};

use crate::engine::{
    day::DayRecord,
    error::TrackError,
    resolver::{MatchKind, Resolution},
};

const STATUS_WIDTH: usize = 45;

pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn gray() -> Style {
    Colour::White.dimmed()
}

/// Green while at least 10% is left, yellow when nearly full and red when over-allocated.
pub fn remaining_colour(remaining: f64) -> Colour {
    if remaining < 0. {
        Colour::Red
    } else if remaining < 10. {
        Colour::Yellow
    } else {
        Colour::Green
    }
}

pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100. * width as f64).max(0.) as usize).min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn print_status(day: &DayRecord) {
    let available = day.available_capacity();
    let tracked = day.tracked_total();
    let remaining = day.remaining();

    println!();
    println!("{}", Style::new().bold().paint(format!("📅 {}", day.date())));
    println!("{}", "─".repeat(STATUS_WIDTH));

    if day.excluded_percent() > 0. {
        println!(
            "🚫 Excluded (meetings): {}",
            gray().paint(percent(day.excluded_percent()))
        );
        for (name, value) in day.excluded_obligations() {
            println!("   • {name}: {}", gray().paint(percent(*value)));
        }
        println!();
    }

    println!("📊 Available to track: {}", Colour::Cyan.paint(percent(available)));
    println!("✅ Tracked: {}", Colour::Blue.paint(percent(tracked)));
    println!(
        "⏳ Remaining: {}",
        remaining_colour(remaining).paint(percent(remaining))
    );
    println!();

    if !day.allocations().is_empty() {
        println!("Projects:");
        for (name, value) in day.allocations() {
            println!(
                "   {} {} {name}",
                progress_bar(*value, 20),
                Colour::Blue.paint(format!("{value:5.1}%"))
            );
        }
        println!();
    }

    if remaining == 0. {
        println!("{}", Colour::Green.paint("✨ Day fully allocated!"));
    } else if (0. ..10.).contains(&remaining) {
        println!(
            "{}",
            Colour::Yellow.paint(format!("💡 Only {} remaining - almost done!", percent(remaining)))
        );
    }
}

pub fn print_over_allocation(over: f64) {
    println!(
        "{}",
        Colour::Red.paint(format!("⚠️  Warning: Over-allocated by {}!", percent(over)))
    );
}

/// Fuzzy matches are used right away, but the user always gets to see what else could have
/// matched.
pub fn print_resolution(input: &str, resolution: &Resolution) {
    if resolution.kind != MatchKind::Fuzzy {
        return;
    }
    if resolution.suggestions.is_empty() {
        println!(
            "No exact match found for '{input}'. Using fuzzy match: {}",
            resolution.name
        );
        return;
    }
    println!("\nDid you mean '{}'?", resolution.name);
    println!("Other suggestions:");
    for (index, suggestion) in resolution.suggestions.iter().enumerate() {
        println!("  {}. {suggestion}", index + 1);
    }
    println!("\nUsing: {}", resolution.name);
}

pub fn print_track_error(error: &TrackError) {
    match error {
        TrackError::AmbiguousUndo { entries } => {
            println!("Cannot determine last added project. Current projects:");
            for (index, (name, value)) in entries.iter().enumerate() {
                println!("  {}. {name} ({})", index + 1, percent(*value));
            }
            println!("\nUse 'timetrack rm <project>' to remove a specific project");
        }
        TrackError::ProjectNotFound(_) => {
            println!("{error}");
            println!("Use 'add' to create a new entry");
        }
        TrackError::NoRemainingCapacity { .. } => {
            println!("{}", Colour::Yellow.paint(format!("⚠️  {error}")));
        }
        _ => println!("{error}"),
    }
}

#[cfg(test)]
mod tests {
    use ansi_term::Colour;

    use super::{progress_bar, remaining_colour};

    #[test]
    fn test_progress_bar_is_clamped() {
        assert_eq!(progress_bar(50., 4), "[██░░]");
        assert_eq!(progress_bar(250., 4), "[████]");
        assert_eq!(progress_bar(-20., 4), "[░░░░]");
    }

    #[test]
    fn test_remaining_colour() {
        assert_eq!(remaining_colour(-0.5), Colour::Red);
        assert_eq!(remaining_colour(9.9), Colour::Yellow);
        assert_eq!(remaining_colour(10.), Colour::Green);
    }
}
