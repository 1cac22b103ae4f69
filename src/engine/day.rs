//! Per-day allocation state. A [DayRecord] knows how much of the day recurring obligations took
//! away and how the rest has been split between projects.

use std::{borrow::Cow, collections::BTreeMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::percentage::Percentage;

use super::{
    calendar::{materialize, ObligationRule},
    error::TrackError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    date: NaiveDate,
    #[serde(default)]
    excluded_percent: f64,
    #[serde(default)]
    excluded_obligations: BTreeMap<String, f64>,
    #[serde(default)]
    allocations: BTreeMap<String, f64>,
    /// Project touched by the last add/edit. Only used for a single step undo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_mutated_project: Option<String>,
}

impl DayRecord {
    /// Creates a record for `date` with every applying obligation already excluded.
    pub fn materialize(date: NaiveDate, rules: &[ObligationRule]) -> Self {
        let exclusions = materialize(date, rules);
        Self {
            date,
            excluded_percent: exclusions.percent,
            excluded_obligations: exclusions.obligations,
            allocations: BTreeMap::new(),
            last_mutated_project: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn excluded_percent(&self) -> f64 {
        self.excluded_percent
    }

    pub fn excluded_obligations(&self) -> &BTreeMap<String, f64> {
        &self.excluded_obligations
    }

    /// Allocations in alphabetical order.
    pub fn allocations(&self) -> &BTreeMap<String, f64> {
        &self.allocations
    }

    pub fn allocation(&self, project: &str) -> Option<f64> {
        self.allocations.get(project).copied()
    }

    pub fn last_mutated_project(&self) -> Option<&str> {
        self.last_mutated_project.as_deref()
    }

    /// Can be negative when more than a whole day was excluded.
    pub fn available_capacity(&self) -> f64 {
        100. - self.excluded_percent
    }

    pub fn tracked_total(&self) -> f64 {
        self.allocations.values().sum()
    }

    pub fn remaining(&self) -> f64 {
        self.available_capacity() - self.tracked_total()
    }

    /// Amount tracked above the available capacity, if any.
    pub fn over_allocation(&self) -> Option<f64> {
        let remaining = self.remaining();
        (remaining < 0.).then_some(-remaining)
    }

    /// Sets the allocation of `project`, replacing any previous value, and remembers it for
    /// [DayRecord::undo]. Returns the previous value.
    pub fn add_or_update(&mut self, project: &str, percent: Percentage) -> Option<f64> {
        self.last_mutated_project = Some(project.to_string());
        self.allocations.insert(project.to_string(), *percent)
    }

    /// Like [DayRecord::add_or_update] but only for projects that already have an allocation.
    pub fn edit(&mut self, project: &str, percent: Percentage) -> Result<f64, TrackError> {
        if !self.allocations.contains_key(project) {
            return Err(TrackError::ProjectNotFound(project.to_string()));
        }
        Ok(self.add_or_update(project, percent).unwrap_or_default())
    }

    /// Gives all remaining capacity to `project`. Returns the amount that was added.
    pub fn fill(&mut self, project: &str) -> Result<f64, TrackError> {
        let remaining = self.remaining();
        if remaining <= 0. {
            return Err(TrackError::NoRemainingCapacity {
                available: self.available_capacity(),
                tracked: self.tracked_total(),
            });
        }
        let value = self.allocation(project).unwrap_or_default() + remaining;
        self.last_mutated_project = Some(project.to_string());
        self.allocations.insert(project.to_string(), value);
        Ok(remaining)
    }

    /// Sets an allocation without moving the undo pointer. Used when restoring data from outside
    /// sources.
    pub fn import_allocation(&mut self, project: &str, percent: Percentage) {
        self.allocations.insert(project.to_string(), *percent);
    }

    pub fn remove(&mut self, project: &str) -> bool {
        self.allocations.remove(project).is_some()
    }

    /// Removes the most recently added or edited project. Records without a usable pointer can
    /// still be undone when they contain exactly one allocation.
    pub fn undo(&mut self) -> Result<(String, f64), TrackError> {
        if self.allocations.is_empty() {
            return Err(TrackError::NothingToUndo);
        }

        let target = match self.last_mutated_project.as_deref() {
            Some(project) if self.allocations.contains_key(project) => project.to_string(),
            _ if self.allocations.len() == 1 => self
                .allocations
                .keys()
                .next()
                .cloned()
                .ok_or(TrackError::NothingToUndo)?,
            _ => {
                return Err(TrackError::AmbiguousUndo {
                    entries: self
                        .allocations
                        .iter()
                        .map(|(k, v)| (k.clone(), *v))
                        .collect(),
                });
            }
        };

        let percent = self
            .allocations
            .remove(&target)
            .ok_or_else(|| TrackError::ProjectNotFound(target.clone()))?;
        self.last_mutated_project = None;
        Ok((target, percent))
    }

    /// Excludes a one-off obligation. Excluding the same name again replaces the previous value.
    pub fn exclude_one_off(&mut self, name: &str, percent: Percentage) {
        let previous = self
            .excluded_obligations
            .insert(name.to_string(), *percent)
            .unwrap_or_default();
        self.excluded_percent = self.excluded_percent - previous + *percent;
    }

    pub fn remove_exclusion(&mut self, name: &str) -> Result<f64, TrackError> {
        let percent = self
            .excluded_obligations
            .remove(name)
            .ok_or_else(|| TrackError::ObligationNotFound(name.to_string()))?;
        self.excluded_percent -= percent;
        Ok(percent)
    }
}

/// Every persisted [DayRecord], keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayBook {
    days: BTreeMap<NaiveDate, DayRecord>,
}

impl DayBook {
    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.get(&date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Returns the record for `date`, materializing it only if it was never stored. Nothing is
    /// inserted.
    pub fn view(&self, date: NaiveDate, rules: &[ObligationRule]) -> Cow<'_, DayRecord> {
        match self.days.get(&date) {
            Some(day) => Cow::Borrowed(day),
            None => Cow::Owned(DayRecord::materialize(date, rules)),
        }
    }

    /// Mutable access to the record for `date`. A record is materialized from `rules` the first
    /// time its date is touched and never re-derived afterwards.
    pub fn day_mut(&mut self, date: NaiveDate, rules: &[ObligationRule]) -> &mut DayRecord {
        self.days.entry(date).or_insert_with(|| {
            debug!("Creating record for {date}");
            DayRecord::materialize(date, rules)
        })
    }

    /// Removes the whole record, exclusions included.
    pub fn clear(&mut self, date: NaiveDate) -> Option<DayRecord> {
        self.days.remove(&date)
    }

    pub fn insert(&mut self, day: DayRecord) {
        self.days.insert(day.date, day);
    }

    /// Records in chronological order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DayRecord> {
        self.days.values()
    }

    pub fn range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl DoubleEndedIterator<Item = &DayRecord> {
        self.days.range(start..=end).map(|v| v.1)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// All projects that were ever tracked, alphabetically.
    pub fn projects(&self) -> Vec<String> {
        let mut projects = self
            .days
            .values()
            .flat_map(|v| v.allocations.keys().cloned())
            .collect::<Vec<_>>();
        projects.sort();
        projects.dedup();
        projects
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;

    use crate::{
        engine::{
            calendar::{DayToken, ObligationRule},
            error::TrackError,
        },
        utils::percentage::Percentage,
    };

    use super::{DayBook, DayRecord};

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 12, 11).unwrap();

    fn pct(value: f64) -> Percentage {
        Percentage::new_opt(value).unwrap()
    }

    fn rules() -> Vec<ObligationRule> {
        vec![ObligationRule {
            name: "standup".into(),
            capacity_percent: pct(10.),
            active_days: vec![DayToken::Weekdays],
        }]
    }

    #[test]
    fn test_materialize_is_not_repeated() {
        let mut book = DayBook::default();
        let first = book.day_mut(TEST_DATE, &rules()).clone();
        assert_eq!(first.excluded_percent(), 10.);

        let mut changed = rules();
        changed[0].capacity_percent = pct(50.);
        let second = book.day_mut(TEST_DATE, &changed).clone();

        assert_eq!(first, second);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_view_does_not_insert() {
        let book = DayBook::default();
        let day = book.view(TEST_DATE, &rules());
        assert_eq!(day.available_capacity(), 90.);
        assert!(book.is_empty());
    }

    #[test]
    fn test_add_or_update_replaces_previous_value() {
        let mut day = DayRecord::materialize(TEST_DATE, &[]);
        day.add_or_update("Bugs", pct(20.));
        day.add_or_update("Tech Debt", pct(30.));
        let before = day.tracked_total();

        let previous = day.add_or_update("Bugs", pct(5.));

        assert_eq!(previous, Some(20.));
        assert_eq!(day.tracked_total(), before - 20. + 5.);
        assert_eq!(day.last_mutated_project(), Some("Bugs"));
    }

    #[test]
    fn test_over_allocation_is_allowed() {
        let mut day = DayRecord::materialize(TEST_DATE, &rules());
        day.add_or_update("Bugs", pct(95.));
        assert_eq!(day.tracked_total(), 95.);
        assert_eq!(day.over_allocation(), Some(5.));
    }

    #[test]
    fn test_undo_after_single_add() -> Result<()> {
        let mut day = DayRecord::materialize(TEST_DATE, &[]);
        let before = day.tracked_total();
        day.add_or_update("X", pct(40.));

        assert_eq!(day.undo()?, ("X".to_string(), 40.));
        assert_eq!(day.tracked_total(), before);
        assert_eq!(day.last_mutated_project(), None);
        Ok(())
    }

    #[test]
    fn test_undo_targets_last_mutation() -> Result<()> {
        let mut day = DayRecord::materialize(TEST_DATE, &[]);
        day.add_or_update("A", pct(10.));
        day.add_or_update("B", pct(10.));
        day.remove("C");

        assert_eq!(day.undo()?.0, "B");
        assert_eq!(day.allocations().len(), 1);
        Ok(())
    }

    #[test]
    fn test_undo_without_pointer() -> Result<()> {
        let mut day = DayRecord::materialize(TEST_DATE, &[]);
        day.import_allocation("A", pct(10.));
        assert_eq!(day.undo()?.0, "A");

        day.import_allocation("A", pct(10.));
        day.import_allocation("B", pct(15.));
        let ambiguous = day.undo();
        assert_eq!(
            ambiguous,
            Err(TrackError::AmbiguousUndo {
                entries: vec![("A".into(), 10.), ("B".into(), 15.)]
            })
        );
        assert_eq!(day.allocations().len(), 2);

        assert_eq!(
            DayRecord::materialize(TEST_DATE, &[]).undo(),
            Err(TrackError::NothingToUndo)
        );
        Ok(())
    }

    #[test]
    fn test_remove_does_not_touch_undo_pointer() {
        let mut day = DayRecord::materialize(TEST_DATE, &[]);
        day.add_or_update("A", pct(10.));
        assert!(!day.remove("B"));
        assert!(day.remove("A"));
        assert_eq!(day.last_mutated_project(), Some("A"));
    }

    #[test]
    fn test_edit_requires_existing_project() -> Result<()> {
        let mut day = DayRecord::materialize(TEST_DATE, &[]);
        assert_eq!(
            day.edit("A", pct(10.)),
            Err(TrackError::ProjectNotFound("A".into()))
        );
        assert!(day.allocations().is_empty());

        day.import_allocation("A", pct(10.));
        assert_eq!(day.edit("A", pct(12.5))?, 10.);
        assert_eq!(day.allocation("A"), Some(12.5));
        assert_eq!(day.last_mutated_project(), Some("A"));
        Ok(())
    }

    #[test]
    fn test_fill_uses_remaining_capacity() -> Result<()> {
        let mut day = DayRecord::materialize(TEST_DATE, &rules());
        day.add_or_update("A", pct(30.));
        day.add_or_update("B", pct(20.));

        assert_eq!(day.fill("A")?, 40.);
        assert_eq!(day.allocation("A"), Some(70.));
        assert_eq!(day.remaining(), 0.);
        assert!(matches!(
            day.fill("B"),
            Err(TrackError::NoRemainingCapacity { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_repeated_exclusion_keeps_latest_value() -> Result<()> {
        let mut day = DayRecord::materialize(TEST_DATE, &rules());
        day.exclude_one_off("offsite", pct(25.));
        day.exclude_one_off("offsite", pct(12.5));

        assert_eq!(day.excluded_percent(), 22.5);
        assert_eq!(day.excluded_obligations()["offsite"], 12.5);

        assert_eq!(day.remove_exclusion("offsite")?, 12.5);
        assert_eq!(day.excluded_percent(), 10.);
        assert_eq!(
            day.remove_exclusion("offsite"),
            Err(TrackError::ObligationNotFound("offsite".into()))
        );
        Ok(())
    }

    #[test]
    fn test_clear_removes_whole_record() {
        let mut book = DayBook::default();
        book.day_mut(TEST_DATE, &rules()).add_or_update("A", pct(10.));
        assert!(book.clear(TEST_DATE).is_some());
        assert!(!book.contains(TEST_DATE));
        assert!(book.clear(TEST_DATE).is_none());
    }

    #[test]
    fn test_day_book_json_shape() -> Result<()> {
        let mut book = DayBook::default();
        book.day_mut(TEST_DATE, &rules()).add_or_update("Bugs", pct(25.));

        let json = serde_json::to_value(&book)?;
        assert_eq!(json["2024-12-11"]["allocations"]["Bugs"], 25.);
        assert_eq!(json["2024-12-11"]["excluded_percent"], 10.);

        let restored: DayBook = serde_json::from_value(json)?;
        assert_eq!(restored, book);
        Ok(())
    }
}
