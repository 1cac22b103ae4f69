use std::{fmt::Display, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::engine::error::TrackError;

/// Length of the notional workday all percentages refer to.
pub const WORKDAY_HOURS: f64 = 8.;

/// Non-negative share of a workday. Stored with full precision, rounded only when displayed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value.is_finite() && value >= 0. {
            Some(Percentage(value))
        } else {
            None
        }
    }

    pub fn from_hours(hours: f64) -> Option<Percentage> {
        Percentage::new_opt(hours / WORKDAY_HOURS * 100.)
    }

    pub fn as_hours(&self) -> f64 {
        self.0 / 100. * WORKDAY_HOURS
    }
}

impl FromStr for Percentage {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // This means that 100%% also works, but I think I'm fine with that
        let trimmed = s.trim().trim_end_matches('%');
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(Percentage::new_opt)
            .ok_or_else(|| TrackError::InvalidAmount(s.to_string()))
    }
}

impl TryFrom<f64> for Percentage {
    type Error = TrackError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Percentage::new_opt(value).ok_or_else(|| TrackError::InvalidAmount(value.to_string()))
    }
}

impl From<Percentage> for f64 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Amount of time typed on the command line. Plain numbers are hours of a workday, numbers
/// suffixed with `%` are already percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    /// Typed as hours, held as the share of the workday they make up.
    Hours(Percentage),
    Percent(Percentage),
}

impl Amount {
    pub fn to_percentage(self) -> Percentage {
        match self {
            Amount::Hours(percentage) | Amount::Percent(percentage) => percentage,
        }
    }
}

impl FromStr for Amount {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.ends_with('%') {
            return s.parse::<Percentage>().map(Amount::Percent);
        }
        s.parse::<f64>()
            .ok()
            .and_then(Percentage::from_hours)
            .map(Amount::Hours)
            .ok_or_else(|| TrackError::InvalidAmount(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::engine::error::TrackError;

    use super::{Amount, Percentage};

    #[test]
    fn test_hours_are_converted_against_workday() -> Result<()> {
        let amount: Amount = "2".parse()?;
        assert_eq!(*amount.to_percentage(), 25.);

        let amount: Amount = "1.5".parse()?;
        assert_eq!(*amount.to_percentage(), 18.75);
        Ok(())
    }

    #[test]
    fn test_percent_suffix_is_taken_verbatim() -> Result<()> {
        let amount: Amount = "37.5%".parse()?;
        assert_eq!(amount, Amount::Percent(Percentage::new_opt(37.5).unwrap()));
        Ok(())
    }

    #[test]
    fn test_invalid_amounts_are_rejected() {
        assert!("-1".parse::<Amount>().is_err());
        assert!("-5%".parse::<Amount>().is_err());
        assert!("two".parse::<Amount>().is_err());
        assert!("NaN".parse::<Amount>().is_err());
    }

    #[test]
    fn test_hours_overflowing_a_percentage_are_rejected() {
        assert_eq!(
            "1e308".parse::<Amount>(),
            Err(TrackError::InvalidAmount("1e308".into()))
        );
        assert!("1e308%".parse::<Amount>().is_ok());
    }

    #[test]
    fn test_percentage_display_rounds_to_one_decimal() {
        let value = Percentage::new_opt(100. / 3.).unwrap();
        assert_eq!(value.to_string(), "33.3%");
        assert_eq!(value.as_hours(), 100. / 3. / 100. * 8.);
    }

    #[test]
    fn test_negative_percentage_is_not_deserialized() {
        assert!(serde_json::from_str::<Percentage>("-3.0").is_err());
        assert_eq!(
            serde_json::from_str::<Percentage>("12.5").ok(),
            Percentage::new_opt(12.5)
        );
    }
}
