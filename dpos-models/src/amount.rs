// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::constants::AMOUNT_DECIMAL_FACTOR;
use crate::error::ModelsError;
use dpos_serialization::{Deserializer, SerializeError, Serializer, U64LeDeserializer, U64LeSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A structure representing a decimal Amount of coins with safe operations.
/// The underlying `u64` raw representation is a fixed-point value with factor `AMOUNT_DECIMAL_FACTOR`.
/// Raw values are what travels on the wire and in JSON.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Create a zero Amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Obtains the underlying raw `u64` representation (base units)
    pub const fn to_raw(&self) -> u64 {
        self.0
    }

    /// constructs an `Amount` from base units
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Signed view of the raw value, for ledger deltas. Saturates at `i64::MAX`.
    pub fn to_signed(&self) -> i64 {
        i64::try_from(self.0).unwrap_or(i64::MAX)
    }

    /// safely add self to another amount, saturating the result on overflow
    #[must_use]
    pub fn saturating_add(self, amount: Amount) -> Self {
        Amount(self.0.saturating_add(amount.0))
    }

    /// safely subtract another amount from self, saturating the result on underflow
    #[must_use]
    pub fn saturating_sub(self, amount: Amount) -> Self {
        Amount(self.0.saturating_sub(amount.0))
    }

    /// returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// safely subtract another amount from self, returning None on underflow
    /// ```
    /// # use dpos_models::Amount;
    /// # use std::str::FromStr;
    /// let amount_1 : Amount = Amount::from_str("42").unwrap();
    /// let amount_2 : Amount = Amount::from_str("7").unwrap();
    /// let res : Amount = amount_1.checked_sub(amount_2).unwrap();
    /// assert_eq!(res, Amount::from_str("35").unwrap())
    /// ```
    pub fn checked_sub(self, amount: Amount) -> Option<Self> {
        self.0.checked_sub(amount.0).map(Amount)
    }

    /// safely add self to another amount, returning None on overflow
    /// ```
    /// # use dpos_models::Amount;
    /// # use std::str::FromStr;
    /// let amount_1 : Amount = Amount::from_str("42").unwrap();
    /// let amount_2 : Amount = Amount::from_str("0.5").unwrap();
    /// let res : Amount = amount_1.checked_add(amount_2).unwrap();
    /// assert_eq!(res, Amount::from_str("42.5").unwrap())
    /// ```
    pub fn checked_add(self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.0).map(Amount)
    }

    /// safely multiply self with a `u64`, returning None on overflow
    pub fn checked_mul_u64(self, factor: u64) -> Option<Self> {
        self.0.checked_mul(factor).map(Amount)
    }
}

/// display an Amount in decimal string form (like "10.33")
///
/// ```
/// # use dpos_models::Amount;
/// let value = Amount::from_raw(1_050_000_000);
/// assert_eq!(format!("{}", value), "10.5")
/// ```
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let integer = self.0 / AMOUNT_DECIMAL_FACTOR;
        let fraction = self.0 % AMOUNT_DECIMAL_FACTOR;
        if fraction == 0 {
            return write!(f, "{}", integer);
        }
        let digits = format!("{:08}", fraction);
        write!(f, "{}.{}", integer, digits.trim_end_matches('0'))
    }
}

/// build an Amount from decimal string form (like "10.33")
impl FromStr for Amount {
    type Err = ModelsError;

    fn from_str(str_amount: &str) -> Result<Self, Self::Err> {
        let parse_err = || ModelsError::AmountParseError(str_amount.to_string());
        let (integer, fraction) = match str_amount.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (str_amount, ""),
        };
        if integer.is_empty()
            || fraction.len() > 8
            || !integer.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(parse_err());
        }
        let integer = u64::from_str(integer).map_err(|_| parse_err())?;
        let fraction = if fraction.is_empty() {
            0
        } else {
            u64::from_str(&format!("{:0<8}", fraction)).map_err(|_| parse_err())?
        };
        integer
            .checked_mul(AMOUNT_DECIMAL_FACTOR)
            .and_then(|raw| raw.checked_add(fraction))
            .map(Amount)
            .ok_or_else(parse_err)
    }
}

/// Serializer for amounts: 8 bytes little-endian
#[derive(Clone, Default)]
pub struct AmountSerializer {
    u64_serializer: U64LeSerializer,
}

impl AmountSerializer {
    /// Create a new `AmountSerializer`
    pub fn new() -> Self {
        Self {
            u64_serializer: U64LeSerializer::new(),
        }
    }
}

impl Serializer<Amount> for AmountSerializer {
    fn serialize(&self, value: &Amount, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for amounts
#[derive(Clone, Default)]
pub struct AmountDeserializer {
    u64_deserializer: U64LeDeserializer,
}

impl AmountDeserializer {
    /// Create a new `AmountDeserializer`
    pub fn new() -> Self {
        Self {
            u64_deserializer: U64LeDeserializer::default(),
        }
    }
}

impl Deserializer<Amount> for AmountDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Amount, E> {
        context("Failed Amount deserialization", |input| {
            self.u64_deserializer
                .deserialize(input)
                .map(|(rest, raw)| (rest, Amount(raw)))
        })(buffer)
    }
}
