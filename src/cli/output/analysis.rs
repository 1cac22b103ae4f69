use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::engine::day::DayBook;

/// Number of entries shown for the most recent activity of a project.
pub const RECENT_ENTRIES: usize = 10;
/// Number of projects listed by frequency.
pub const TOP_PROJECTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectTotal {
    pub name: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Days of the week with at least one allocation.
    pub days_tracked: usize,
    pub total_available: f64,
    pub total_tracked: f64,
    /// Sorted by total, largest first.
    pub projects: Vec<ProjectTotal>,
}

impl WeekSummary {
    pub fn average_per_day(&self) -> f64 {
        if self.days_tracked == 0 {
            0.
        } else {
            self.total_tracked / self.days_tracked as f64
        }
    }

    /// Share of everything tracked this week.
    pub fn share(&self, project: &ProjectTotal) -> f64 {
        if self.total_tracked == 0. {
            0.
        } else {
            project.total / self.total_tracked * 100.
        }
    }
}

/// Sums up the seven days starting at `start`. Days without allocations don't count.
pub fn summarize_week(book: &DayBook, start: NaiveDate) -> WeekSummary {
    let end = start + Duration::days(6);
    let mut totals = HashMap::<&str, f64>::new();
    let mut summary = WeekSummary {
        start,
        end,
        days_tracked: 0,
        total_available: 0.,
        total_tracked: 0.,
        projects: vec![],
    };

    for day in book.range(start, end).filter(|v| !v.allocations().is_empty()) {
        summary.days_tracked += 1;
        summary.total_available += day.available_capacity();
        summary.total_tracked += day.tracked_total();
        for (name, value) in day.allocations() {
            *totals.entry(name.as_str()).or_default() += value;
        }
    }

    summary.projects = totals
        .into_iter()
        .map(|(name, total)| ProjectTotal {
            name: name.to_string(),
            total,
        })
        .collect();
    summary
        .projects
        .sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    summary
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectHistory {
    /// Chronological.
    pub entries: Vec<(NaiveDate, f64)>,
    pub total: f64,
}

impl ProjectHistory {
    pub fn average_per_day(&self) -> f64 {
        if self.entries.is_empty() {
            0.
        } else {
            self.total / self.entries.len() as f64
        }
    }

    /// Newest first.
    pub fn recent(&self) -> impl Iterator<Item = &(NaiveDate, f64)> {
        self.entries.iter().rev().take(RECENT_ENTRIES)
    }
}

pub fn project_history(book: &DayBook, project: &str) -> ProjectHistory {
    let entries = book
        .iter()
        .filter_map(|day| day.allocation(project).map(|v| (day.date(), v)))
        .collect::<Vec<_>>();
    let total = entries.iter().map(|v| v.1).sum();
    ProjectHistory { entries, total }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub days: usize,
    pub average_tracked: f64,
    pub average_available: f64,
    pub fully_allocated: usize,
    pub over_allocated: usize,
    /// Most frequent first, at most [TOP_PROJECTS].
    pub frequent_projects: Vec<(String, usize)>,
}

/// Returns [None] when nothing was ever stored.
pub fn statistics(book: &DayBook) -> Option<Statistics> {
    if book.is_empty() {
        return None;
    }

    let mut tracked = 0.;
    let mut available = 0.;
    let mut fully_allocated = 0;
    let mut over_allocated = 0;
    let mut frequency = HashMap::<&str, usize>::new();

    for day in book.iter() {
        tracked += day.tracked_total();
        available += day.available_capacity();
        if day.over_allocation().is_some() {
            over_allocated += 1;
        } else if day.remaining() == 0. {
            fully_allocated += 1;
        }
        for name in day.allocations().keys() {
            *frequency.entry(name.as_str()).or_default() += 1;
        }
    }

    let mut frequent_projects = frequency
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect::<Vec<_>>();
    frequent_projects.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    frequent_projects.truncate(TOP_PROJECTS);

    let days = book.len();
    Some(Statistics {
        days,
        average_tracked: tracked / days as f64,
        average_available: available / days as f64,
        fully_allocated,
        over_allocated,
        frequent_projects,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use crate::{
        engine::{
            calendar::{DayToken, ObligationRule},
            day::DayBook,
        },
        utils::percentage::Percentage,
    };

    use super::{project_history, statistics, summarize_week, ProjectTotal};

    const MONDAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 12, 9).unwrap();

    fn percent(value: f64) -> Percentage {
        Percentage::new_opt(value).unwrap()
    }

    fn book() -> DayBook {
        let standup = ObligationRule {
            name: "standup".into(),
            capacity_percent: percent(10.),
            active_days: vec![DayToken::Mon],
        };
        let rules = [standup];
        let mut book = DayBook::default();

        let monday = book.day_mut(MONDAY, &rules);
        monday.add_or_update("Bugs", percent(60.));
        monday.add_or_update("Docs", percent(30.));

        book.day_mut(MONDAY + Duration::days(1), &rules)
            .add_or_update("Bugs", percent(120.));
        // Only exclusions, doesn't count as tracked.
        book.day_mut(MONDAY + Duration::days(2), &rules);
        // Previous week.
        book.day_mut(MONDAY - Duration::days(1), &rules)
            .add_or_update("Docs", percent(50.));
        book
    }

    #[test]
    fn test_week_summary() {
        let summary = summarize_week(&book(), MONDAY);

        assert_eq!(summary.end, MONDAY + Duration::days(6));
        assert_eq!(summary.days_tracked, 2);
        assert_eq!(summary.total_available, 190.);
        assert_eq!(summary.total_tracked, 210.);
        assert_eq!(summary.average_per_day(), 105.);
        assert_eq!(
            summary.projects,
            vec![
                ProjectTotal {
                    name: "Bugs".into(),
                    total: 180.
                },
                ProjectTotal {
                    name: "Docs".into(),
                    total: 30.
                },
            ]
        );
        assert!((summary.share(&summary.projects[1]) - 100. / 7.).abs() < 1e-9);
    }

    #[test]
    fn test_empty_week() {
        let summary = summarize_week(&book(), MONDAY + Duration::days(7));
        assert_eq!(summary.days_tracked, 0);
        assert_eq!(summary.average_per_day(), 0.);
        assert!(summary.projects.is_empty());
    }

    #[test]
    fn test_project_history() {
        let history = project_history(&book(), "Docs");
        assert_eq!(
            history.entries,
            vec![(MONDAY - Duration::days(1), 50.), (MONDAY, 30.)]
        );
        assert_eq!(history.total, 80.);
        assert_eq!(history.average_per_day(), 40.);
        assert_eq!(history.recent().next(), Some(&(MONDAY, 30.)));

        assert!(project_history(&book(), "Nope").entries.is_empty());
    }

    #[test]
    fn test_statistics() {
        let stats = statistics(&book()).unwrap();
        assert_eq!(stats.days, 4);
        assert_eq!(stats.fully_allocated, 1);
        assert_eq!(stats.over_allocated, 1);
        assert_eq!(stats.average_tracked, 65.);
        assert_eq!(
            stats.frequent_projects,
            vec![("Bugs".to_string(), 2), ("Docs".to_string(), 2)]
        );

        assert_eq!(statistics(&DayBook::default()), None);
    }
}
