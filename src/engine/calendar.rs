//! Recurring obligations and the rules deciding on which dates they consume capacity.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::percentage::Percentage;

use super::error::TrackError;

/// Token describing on which days an [ObligationRule] is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayToken {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
    Daily,
    Weekdays,
}

impl DayToken {
    pub fn matches(self, weekday: Weekday) -> bool {
        match self {
            DayToken::Daily => true,
            DayToken::Weekdays => is_workday(weekday),
            DayToken::Mon => weekday == Weekday::Mon,
            DayToken::Tue => weekday == Weekday::Tue,
            DayToken::Wed => weekday == Weekday::Wed,
            DayToken::Thu => weekday == Weekday::Thu,
            DayToken::Fri => weekday == Weekday::Fri,
            DayToken::Sat => weekday == Weekday::Sat,
            DayToken::Sun => weekday == Weekday::Sun,
        }
    }

    /// Parses a comma separated list such as `mon,wed` or `weekdays`.
    pub fn parse_list(s: &str) -> Result<Vec<DayToken>, TrackError> {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for DayToken {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mon" => Ok(DayToken::Mon),
            "tue" => Ok(DayToken::Tue),
            "wed" => Ok(DayToken::Wed),
            "thu" => Ok(DayToken::Thu),
            "fri" => Ok(DayToken::Fri),
            "sat" => Ok(DayToken::Sat),
            "sun" => Ok(DayToken::Sun),
            "daily" => Ok(DayToken::Daily),
            "weekdays" => Ok(DayToken::Weekdays),
            _ => Err(TrackError::InvalidDayToken(s.to_string())),
        }
    }
}

impl Display for DayToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DayToken::Mon => "mon",
            DayToken::Tue => "tue",
            DayToken::Wed => "wed",
            DayToken::Thu => "thu",
            DayToken::Fri => "fri",
            DayToken::Sat => "sat",
            DayToken::Sun => "sun",
            DayToken::Daily => "daily",
            DayToken::Weekdays => "weekdays",
        };
        write!(f, "{name}")
    }
}

fn is_workday(weekday: Weekday) -> bool {
    weekday.number_from_monday() <= 5
}

/// A named recurring commitment, e.g. a standup, that takes a fixed share of every matching day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationRule {
    pub name: String,
    pub capacity_percent: Percentage,
    pub active_days: Vec<DayToken>,
}

impl ObligationRule {
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday();
        self.active_days.iter().any(|v| v.matches(weekday))
    }
}

/// Capacity taken away from a single date by its obligations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exclusions {
    pub percent: f64,
    pub obligations: BTreeMap<String, f64>,
}

/// Evaluates every rule against `date`. Rules are independent, each applying rule contributes its
/// whole capacity.
pub fn materialize(date: NaiveDate, rules: &[ObligationRule]) -> Exclusions {
    let mut exclusions = Exclusions::default();
    for rule in rules.iter().filter(|v| v.applies_on(date)) {
        exclusions.percent += *rule.capacity_percent;
        *exclusions.obligations.entry(rule.name.clone()).or_default() += *rule.capacity_percent;
    }
    debug!(
        "Materialized {date} with {:.1}% excluded",
        exclusions.percent
    );
    exclusions
}

/// Inserts `rule` or, when a rule with the same name exists, replaces its percent and days.
/// Returns `true` if an existing rule was updated.
pub fn upsert_rule(rules: &mut Vec<ObligationRule>, rule: ObligationRule) -> bool {
    match rules.iter_mut().find(|v| v.name == rule.name) {
        Some(existing) => {
            existing.capacity_percent = rule.capacity_percent;
            existing.active_days = rule.active_days;
            true
        }
        None => {
            rules.push(rule);
            false
        }
    }
}

pub fn remove_rule(rules: &mut Vec<ObligationRule>, name: &str) -> Result<ObligationRule, TrackError> {
    let index = rules
        .iter()
        .position(|v| v.name == name)
        .ok_or_else(|| TrackError::ObligationNotFound(name.to_string()))?;
    Ok(rules.remove(index))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;

    use crate::{engine::error::TrackError, utils::percentage::Percentage};

    use super::{materialize, remove_rule, upsert_rule, DayToken, ObligationRule};

    // 2024-12-11 is a Wednesday.
    const WEDNESDAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 12, 11).unwrap();
    const FRIDAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 12, 13).unwrap();
    const SATURDAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 12, 14).unwrap();
    const SUNDAY: NaiveDate = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();

    fn rule(name: &str, percent: f64, days: &[DayToken]) -> ObligationRule {
        ObligationRule {
            name: name.into(),
            capacity_percent: Percentage::new_opt(percent).unwrap(),
            active_days: days.to_vec(),
        }
    }

    #[test]
    fn test_weekdays_rule() {
        let standup = rule("standup", 5., &[DayToken::Weekdays]);
        assert!(standup.applies_on(WEDNESDAY));
        assert!(standup.applies_on(FRIDAY));
        assert!(!standup.applies_on(SATURDAY));
        assert!(!standup.applies_on(SUNDAY));
    }

    #[test]
    fn test_daily_rule_applies_on_weekends() {
        let email = rule("email", 2.5, &[DayToken::Daily]);
        for date in [WEDNESDAY, FRIDAY, SATURDAY, SUNDAY] {
            assert!(email.applies_on(date));
        }
    }

    #[test]
    fn test_materialize_sums_matching_rules() {
        let rules = vec![
            rule("standup", 5., &[DayToken::Weekdays]),
            rule("planning", 12.5, &[DayToken::Mon, DayToken::Wed]),
            rule("retro", 10., &[DayToken::Fri]),
        ];

        let wednesday = materialize(WEDNESDAY, &rules);
        assert_eq!(wednesday.percent, 17.5);
        assert_eq!(wednesday.obligations.len(), 2);
        assert_eq!(wednesday.obligations["planning"], 12.5);

        let saturday = materialize(SATURDAY, &rules);
        assert_eq!(saturday.percent, 0.);
        assert!(saturday.obligations.is_empty());
    }

    #[test]
    fn test_day_tokens_parse_case_insensitively() -> Result<()> {
        assert_eq!(
            DayToken::parse_list("Mon, wed,WEEKDAYS")?,
            vec![DayToken::Mon, DayToken::Wed, DayToken::Weekdays]
        );
        assert_eq!(
            DayToken::parse_list("mon,funday"),
            Err(TrackError::InvalidDayToken("funday".into()))
        );
        Ok(())
    }

    #[test]
    fn test_upsert_rule_updates_by_name() {
        let mut rules = vec![rule("standup", 5., &[DayToken::Weekdays])];
        assert!(!upsert_rule(&mut rules, rule("retro", 10., &[DayToken::Fri])));
        assert!(upsert_rule(&mut rules, rule("standup", 7.5, &[DayToken::Daily])));

        assert_eq!(rules.len(), 2);
        assert_eq!(*rules[0].capacity_percent, 7.5);
        assert_eq!(rules[0].active_days, vec![DayToken::Daily]);
    }

    #[test]
    fn test_remove_missing_rule() {
        let mut rules = vec![rule("standup", 5., &[DayToken::Weekdays])];
        assert_eq!(
            remove_rule(&mut rules, "retro"),
            Err(TrackError::ObligationNotFound("retro".into()))
        );
        assert!(remove_rule(&mut rules, "standup").is_ok());
        assert!(rules.is_empty());
    }
}
