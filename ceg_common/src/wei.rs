use std::{
    fmt::Display,
    iter::Sum,
    ops::Mul,
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::op;

pub const ETH_CURRENCY_CODE: &str = "ETH";
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;
const ETH_DECIMALS: usize = 18;

//--------------------------------------        Wei          ---------------------------------------------------------
/// An amount of ether, held as an integer number of wei so that prices never pass through floating point.
///
/// Amounts are supplied by clients as decimal ETH strings (`"0.5"`), and that is also how they are rendered in signed
/// payment links, so [`Wei::from_eth_str`] and [`Wei::to_eth_string`] are exact inverses for any value with at most 18
/// decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Wei(u128);

op!(binary Wei, Add, add, saturating_add);
op!(binary Wei, Sub, sub, saturating_sub);
op!(inplace Wei, AddAssign, add_assign, saturating_add);
op!(inplace Wei, SubAssign, sub_assign, saturating_sub);

impl Mul<u64> for Wei {
    type Output = Self;

    fn mul(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_mul(u128::from(rhs)))
    }
}

impl Sum for Wei {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, v| acc + v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented in wei: {0}")]
pub struct WeiConversionError(String);

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl Wei {
    pub fn value(&self) -> u128 {
        self.0
    }

    pub fn from_eth(eth: u64) -> Self {
        Self(u128::from(eth) * WEI_PER_ETH)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parses a non-negative decimal ETH amount, e.g. `"0.42"`, `"3"` or `".5"`.
    pub fn from_eth_str(s: &str) -> Result<Self, WeiConversionError> {
        let s = s.trim();
        let (whole, fraction) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(WeiConversionError(format!("'{s}' is not an ETH amount")));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(WeiConversionError(format!("'{s}' is not an ETH amount")));
        }
        if fraction.len() > ETH_DECIMALS {
            return Err(WeiConversionError(format!("'{s}' has more than {ETH_DECIMALS} decimal places")));
        }
        let whole = if whole.is_empty() { 0 } else { whole.parse::<u128>().map_err(|e| WeiConversionError(e.to_string()))? };
        let padded = format!("{fraction:0<width$}", width = ETH_DECIMALS);
        let fraction = padded.parse::<u128>().map_err(|e| WeiConversionError(e.to_string()))?;
        whole
            .checked_mul(WEI_PER_ETH)
            .and_then(|w| w.checked_add(fraction))
            .map(Self)
            .ok_or_else(|| WeiConversionError(format!("'{s}' is too large")))
    }

    /// Renders the amount as a decimal ETH string with no trailing zeros, e.g. `"0.5"` or `"2"`.
    pub fn to_eth_string(&self) -> String {
        let whole = self.0 / WEI_PER_ETH;
        let fraction = self.0 % WEI_PER_ETH;
        if fraction == 0 {
            return whole.to_string();
        }
        let fraction = format!("{fraction:0>width$}", width = ETH_DECIMALS);
        format!("{whole}.{}", fraction.trim_end_matches('0'))
    }
}

impl FromStr for Wei {
    type Err = WeiConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_eth_str(s)
    }
}

impl Display for Wei {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {ETH_CURRENCY_CODE}", self.to_eth_string())
    }
}

// Serialized as a decimal ETH string. JSON numbers cannot carry 128-bit integers across every client.
impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_eth_string())
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_eth_str(&s).map_err(serde::de::Error::custom)
    }
}
