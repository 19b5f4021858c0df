//! Calendar months.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One calendar month, stored by its first and last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    first: NaiveDate,
    last: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self::containing)
            .ok_or_else(|| Error::Validation(format!("Invalid month {}-{:02}", year, month)))
    }

    /// The month `date` falls in.
    pub fn containing(date: NaiveDate) -> Self {
        let first = date - Days::new(u64::from(date.day0()));
        let mut last = date;
        while let Some(next) = last.succ_opt() {
            if next.month() != date.month() {
                break;
            }
            last = next;
        }
        Self { first, last }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    pub fn num_days(&self) -> u32 {
        self.last.day()
    }

    /// Every day of the month, in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.first
            .iter_days()
            .take(self.num_days() as usize)
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    /// Blank cells before day 1 in a grid whose rows start on `week_start`.
    pub fn leading_blanks(&self, week_start: Weekday) -> u32 {
        let offset = self.first.weekday().num_days_from_monday() + 7
            - week_start.num_days_from_monday();
        offset % 7
    }

    pub fn next(&self) -> Option<Self> {
        self.last.succ_opt().map(Self::containing)
    }

    pub fn prev(&self) -> Option<Self> {
        self.first.pred_opt().map(Self::containing)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Month {
    type Err = Error;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid month {:?}, expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for Month {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}
