use chrono::{Local, NaiveDate};

/// Represents an entity responsible for providing dates across application. This allows
/// date dependent behaviour to be tested.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Uses the local calendar date of the machine.
pub struct DefaultClock;

impl Clock for DefaultClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
