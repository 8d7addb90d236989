// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Unsigned time management
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
pub use error::TimeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use std::{
    convert::{TryFrom, TryInto},
    str::FromStr,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Time structure used everywhere.
/// milliseconds since 01/01/1970.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DposTime(u64);

impl fmt::Display for DposTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_millis())
    }
}

impl TryFrom<Duration> for DposTime {
    type Error = TimeError;

    /// Conversion from `std::time::Duration`.
    /// ```
    /// # use std::time::Duration;
    /// # use dpos_time::*;
    /// # use std::convert::TryFrom;
    /// let duration: Duration = Duration::from_millis(42);
    /// let time : DposTime = DposTime::from_millis(42);
    /// assert_eq!(time, DposTime::try_from(duration).unwrap());
    /// ```
    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Ok(DposTime(
            value
                .as_millis()
                .try_into()
                .map_err(|_| TimeError::ConversionError)?,
        ))
    }
}

impl From<DposTime> for Duration {
    fn from(value: DposTime) -> Self {
        value.to_duration()
    }
}

impl FromStr for DposTime {
    type Err = crate::TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DposTime(
            u64::from_str(s).map_err(|_| Self::Err::ConversionError)?,
        ))
    }
}

impl DposTime {
    /// Conversion from `u64`, representing timestamp in milliseconds.
    pub const fn from_millis(value: u64) -> Self {
        DposTime(value)
    }

    /// Conversion from a number of seconds.
    pub const fn from_secs(value: u64) -> Self {
        DposTime(value.saturating_mul(1000))
    }

    /// Gets current UNIX timestamp (resolution: milliseconds).
    ///
    /// ```
    /// # use std::time::{Duration, SystemTime, UNIX_EPOCH};
    /// # use dpos_time::*;
    /// # use std::convert::TryFrom;
    /// # use std::cmp::max;
    /// let now_duration : Duration = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    /// let now_dpos_time : DposTime = DposTime::now().unwrap();
    /// let converted  :DposTime = DposTime::try_from(now_duration).unwrap();
    /// assert!(max(now_dpos_time.saturating_sub(converted), converted.saturating_sub(now_dpos_time)) < DposTime::from_millis(100))
    /// ```
    pub fn now() -> Result<Self, TimeError> {
        let now: u64 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimeError::TimeOverflowError)?
            .as_millis()
            .try_into()
            .map_err(|_| TimeError::TimeOverflowError)?;
        Ok(DposTime(now))
    }

    /// Conversion to `std::time::Duration`.
    pub fn to_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// Conversion to `u64`, representing milliseconds.
    /// ```
    /// # use dpos_time::*;
    /// let time : DposTime = DposTime::from_millis(42);
    /// let res: u64 = time.to_millis();
    /// assert_eq!(res, 42);
    /// ```
    pub const fn to_millis(&self) -> u64 {
        self.0
    }

    /// Whole seconds, rounded down.
    pub const fn to_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// ```
    /// # use dpos_time::*;
    /// let time_1 : DposTime = DposTime::from_millis(42);
    /// let time_2 : DposTime = DposTime::from_millis(7);
    /// let res : DposTime = time_1.saturating_sub(time_2);
    /// assert_eq!(res, DposTime::from_millis(42-7))
    /// ```
    #[must_use]
    pub fn saturating_sub(self, t: DposTime) -> Self {
        DposTime(self.0.saturating_sub(t.0))
    }

    /// ```
    /// # use dpos_time::*;
    /// let time_1 : DposTime = DposTime::from_millis(42);
    /// let time_2 : DposTime = DposTime::from_millis(7);
    /// let res : DposTime = time_1.saturating_add(time_2);
    /// assert_eq!(res, DposTime::from_millis(42+7))
    /// ```
    #[must_use]
    pub fn saturating_add(self, t: DposTime) -> Self {
        DposTime(self.0.saturating_add(t.0))
    }

    /// ```
    /// # use dpos_time::*;
    /// let time_1 : DposTime = DposTime::from_millis(42);
    /// let time_2 : DposTime = DposTime::from_millis(7);
    /// let res : DposTime = time_1.checked_sub(time_2).unwrap();
    /// assert_eq!(res, DposTime::from_millis(42-7))
    /// ```
    pub fn checked_sub(self, t: DposTime) -> Result<Self, TimeError> {
        self.0
            .checked_sub(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("subtraction error".to_string()))
            .map(DposTime)
    }

    /// ```
    /// # use dpos_time::*;
    /// let time_1 : DposTime = DposTime::from_millis(42);
    /// let res : DposTime = time_1.saturating_mul(7);
    /// assert_eq!(res,DposTime::from_millis(42*7))
    /// ```
    #[must_use]
    pub const fn saturating_mul(self, n: u64) -> DposTime {
        DposTime(self.0.saturating_mul(n))
    }

    /// ```
    /// # use dpos_time::*;
    /// let dpos_time : DposTime = DposTime::from_millis(1_640_995_200_000);
    /// assert_eq!(dpos_time.format_instant(), String::from("2022-01-01T00:00:00Z"))
    /// ```
    pub fn format_instant(&self) -> String {
        OffsetDateTime::from_unix_timestamp(self.to_secs() as i64)
            .ok()
            .and_then(|date| date.format(&Rfc3339).ok())
            .unwrap_or_else(|| format!("{}ms", self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_round_down() {
        assert_eq!(DposTime::from_millis(7_999).to_secs(), 7);
        assert_eq!(DposTime::from_secs(8).to_millis(), 8_000);
    }

    #[test]
    fn test_checked_sub_underflow() {
        assert!(DposTime::from_millis(1)
            .checked_sub(DposTime::from_millis(2))
            .is_err());
    }
}
