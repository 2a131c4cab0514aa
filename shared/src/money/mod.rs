//! Money calculation utilities using rust_decimal for precision
//!
//! Every monetary figure in a report (job splits, technician rollups, monthly
//! rollups, grand totals) goes through this module. Values stay `Decimal`
//! until the final output step, where they are converted to `f64` for display
//! or for a spreadsheet/document cell.
//!
//! Null or invalid inputs are NOT handled here: callers substitute zero
//! before calling in (see [`to_decimal_or_zero`]).
//!
//! Arithmetic is checked. A result outside the `Decimal` range is a
//! [`MoneyError::Overflow`], never a panic.

use rust_decimal::prelude::*;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default output precision for currency (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Errors raised while constructing a decimal
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoneyError {
    /// String input that is not a decimal number
    #[error("Invalid numeric value: '{0}'")]
    InvalidNumber(String),

    /// NaN or infinite float input
    #[error("Non-finite numeric value: {0}")]
    NonFinite(f64),

    /// Value outside the representable decimal range
    #[error("Numeric value out of range: {0}")]
    OutOfRange(String),

    /// Arithmetic result outside the representable decimal range
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

/// Result type for decimal construction
pub type MoneyResult<T> = Result<T, MoneyError>;

/// Output precision for [`to_number`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// Keep every digit the decimal carries
    #[default]
    Full,
    /// Round to the given number of decimal places
    Places(u32),
}

/// Values that can enter the decimal layer
pub trait IntoDecimal {
    fn into_decimal(self) -> MoneyResult<Decimal>;
}

impl IntoDecimal for Decimal {
    fn into_decimal(self) -> MoneyResult<Decimal> {
        Ok(self)
    }
}

impl IntoDecimal for i64 {
    fn into_decimal(self) -> MoneyResult<Decimal> {
        Ok(Decimal::from(self))
    }
}

impl IntoDecimal for f64 {
    /// Goes through the shortest round-trip text of the float, so `0.1`
    /// becomes exactly `0.1` rather than its binary expansion.
    fn into_decimal(self) -> MoneyResult<Decimal> {
        if !self.is_finite() {
            return Err(MoneyError::NonFinite(self));
        }
        let text = self.to_string();
        Decimal::from_str(&text)
            .ok()
            .or_else(|| Decimal::from_f64(self))
            .ok_or(MoneyError::OutOfRange(text))
    }
}

impl IntoDecimal for &str {
    fn into_decimal(self) -> MoneyResult<Decimal> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::InvalidNumber(self.to_string()));
        }
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| MoneyError::InvalidNumber(self.to_string()))
    }
}

impl IntoDecimal for &String {
    fn into_decimal(self) -> MoneyResult<Decimal> {
        self.as_str().into_decimal()
    }
}

impl IntoDecimal for String {
    fn into_decimal(self) -> MoneyResult<Decimal> {
        self.as_str().into_decimal()
    }
}

/// Monetary row field as delivered by the query layer
///
/// Numeric columns arrive as JSON numbers or as numeric strings (`"120.50"`).
/// Deserialization never fails on the value itself; a string that is not a
/// number is kept as text and rejected later by [`to_decimal`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawAmount {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Float(value)
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        RawAmount::Integer(value)
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl IntoDecimal for &RawAmount {
    fn into_decimal(self) -> MoneyResult<Decimal> {
        match self {
            RawAmount::Integer(v) => v.into_decimal(),
            RawAmount::Float(v) => v.into_decimal(),
            RawAmount::Text(v) => v.as_str().into_decimal(),
        }
    }
}

impl IntoDecimal for RawAmount {
    fn into_decimal(self) -> MoneyResult<Decimal> {
        (&self).into_decimal()
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawAmountVisitor;

        impl<'de> Visitor<'de> for RawAmountVisitor {
            type Value = RawAmount;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number or a numeric string")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(RawAmount::Integer(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                // Above i64::MAX: keep the digits, the decimal parse decides
                Ok(i64::try_from(value)
                    .map(RawAmount::Integer)
                    .unwrap_or_else(|_| RawAmount::Text(value.to_string())))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                Ok(RawAmount::Float(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(RawAmount::Text(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
                Ok(RawAmount::Text(value))
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
                Ok(RawAmount::Text(value.to_string()))
            }
        }

        deserializer.deserialize_any(RawAmountVisitor)
    }
}

/// Construct a decimal from a plain number or numeric string
#[inline]
pub fn to_decimal<T: IntoDecimal>(value: T) -> MoneyResult<Decimal> {
    value.into_decimal()
}

/// Convert a nullable row field, treating null and invalid values as zero
///
/// Invalid values are logged; they never abort a report.
pub fn to_decimal_or_zero<T: IntoDecimal>(value: Option<T>, field: &str) -> Decimal {
    match value {
        None => Decimal::ZERO,
        Some(v) => v.into_decimal().unwrap_or_else(|e| {
            tracing::warn!(field, error = %e, "Invalid monetary value, defaulting to zero");
            Decimal::ZERO
        }),
    }
}

#[inline]
pub fn add(a: Decimal, b: Decimal) -> MoneyResult<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| MoneyError::Overflow(format!("{} + {}", a, b)))
}

#[inline]
pub fn subtract(a: Decimal, b: Decimal) -> MoneyResult<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| MoneyError::Overflow(format!("{} - {}", a, b)))
}

/// Left-to-right sum; an empty input sums to zero
pub fn sum<I>(values: I) -> MoneyResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values.into_iter().try_fold(Decimal::ZERO, add)
}

/// `part / whole × 100`, or zero when `whole` is zero
///
/// A ratio too large for a decimal is logged and reported as zero.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or_else(|| {
            tracing::warn!(part = %part, whole = %whole, "Percentage out of range, defaulting to zero");
            Decimal::ZERO
        })
}

/// `total / count`, or zero when `count` is zero
pub fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    total / Decimal::from(count as u64)
}

/// Round half away from zero
#[inline]
pub fn round_dp(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a decimal to a native number at the requested precision
pub fn to_number(value: Decimal, precision: Precision) -> f64 {
    let value = match precision {
        Precision::Full => value,
        Precision::Places(dp) => round_dp(value, dp),
    };
    // Parse the decimal text so the result is the nearest f64 to the exact value
    f64::from_str(&value.to_string())
        .ok()
        .or_else(|| value.to_f64())
        .unwrap_or_else(|| {
            tracing::error!(value = %value, "Decimal not representable as f64, defaulting to zero");
            0.0
        })
}

/// Convert Decimal to f64 for currency output, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    to_number(value, Precision::Places(DECIMAL_PLACES))
}

/// Per-job division of net revenue between technician and company
///
/// `rate` is the technician's commission as a percentage (0-100) of NET
/// revenue, i.e. after parts cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneySplit {
    pub net: Decimal,
    pub tech_pay: Decimal,
    pub company_net: Decimal,
}

impl MoneySplit {
    pub fn new(net: Decimal, rate: Decimal) -> MoneyResult<Self> {
        let tech_pay = net
            .checked_mul(rate)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .ok_or_else(|| MoneyError::Overflow(format!("{} × {}%", net, rate)))?;
        Ok(Self {
            net,
            tech_pay,
            company_net: subtract(net, tech_pay)?,
        })
    }

    /// Split a job's gross after deducting parts
    pub fn from_job(gross: Decimal, parts: Decimal, rate: Decimal) -> MoneyResult<Self> {
        Self::new(subtract(gross, parts)?, rate)
    }
}

/// Human-readable split label, e.g. "75% Co / 25% Tech"
pub fn split_label(rate: Decimal) -> String {
    let tech = rate.normalize();
    match subtract(Decimal::ONE_HUNDRED, rate) {
        Ok(company) => format!("{}% Co / {}% Tech", company.normalize(), tech),
        Err(_) => format!("{}% Tech", tech),
    }
}
