//! Data types shared by the OLT governance crates.
//!
//! Everything here is plain data: addresses, integer amounts, proposal
//! records, governance option categories and transaction messages. Behavior
//! lives in `olt-governance` and signing lives in `olt-crypto`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use primitive_types::U256;

pub mod governance;
pub mod options;
pub mod transaction;

pub type Hash = [u8; 32];
pub type PublicKeyBytes = [u8; 32];

/// Prefix of the textual address form.
pub const ADDRESS_PREFIX: &str = "0lt";

/// Errors produced while parsing the textual wire forms defined in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("amount must be a non-empty string of decimal digits, got {0:?}")]
    InvalidAmount(String),
    #[error("amount {0} does not fit in 256 bits")]
    AmountOverflow(String),
    #[error("address must start with 0lt: {0:?}")]
    MissingAddressPrefix(String),
    #[error("address must be 20 hex encoded bytes: {0:?}")]
    InvalidAddress(String),
    #[error("unknown {kind}: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },
}

/// A 20 byte account address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Derives the account address that owns an ed25519 public key.
    pub fn from_public_key(public_key: &PublicKeyBytes) -> Self {
        let digest = blake3::hash(public_key);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ADDRESS_PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(ADDRESS_PREFIX)
            .ok_or_else(|| ParseError::MissingAddressPrefix(s.to_string()))?;
        let raw = hex::decode(body).map_err(|_| ParseError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|_| ParseError::InvalidAddress(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Non-negative integer amount in the smallest currency unit.
///
/// On the wire an amount is always a decimal digit string so that values
/// above 2^53 survive JSON clients untouched. Only plain digits are
/// accepted; signs, exponents and fractions are rejected.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

/// Basis points in one whole (100%).
pub const BASIS_POINTS: u16 = 10_000;

impl Amount {
    pub const ZERO: Amount = Amount(U256([0, 0, 0, 0]));

    pub fn new(value: U256) -> Self {
        Amount(value)
    }

    pub fn from_u64(value: u64) -> Self {
        Amount(U256::from(value))
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(&self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_sub(&self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    pub fn checked_mul_u64(&self, factor: u64) -> Option<Amount> {
        self.0.checked_mul(U256::from(factor)).map(Amount)
    }

    /// `floor(self * bp / 10000)` without intermediate overflow.
    pub fn basis_points(&self, bp: u16) -> Amount {
        let whole = U256::from(BASIS_POINTS);
        let quotient = self.0 / whole;
        let remainder = self.0 % whole;
        let bp = U256::from(bp);
        Amount(quotient * bp + remainder * bp / whole)
    }

    /// Splits the amount into `parts` equal pieces, returning the piece and the remainder.
    pub fn split(&self, parts: u64) -> (Amount, Amount) {
        if parts == 0 {
            return (Amount::ZERO, *self);
        }
        let parts = U256::from(parts);
        (Amount(self.0 / parts), Amount(self.0 % parts))
    }

    /// Sums a sequence of amounts, returning `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(amounts: I) -> Option<Amount> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::from_u64(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl FromStr for Amount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidAmount(s.to_string()));
        }
        U256::from_dec_str(s)
            .map(Amount)
            .map_err(|_| ParseError::AmountOverflow(s.to_string()))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An amount tagged with its currency name, e.g. `{"currency":"OLT","value":"1000"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub currency: String,
    pub value: Amount,
}

impl Coin {
    pub fn new(currency: impl Into<String>, value: Amount) -> Self {
        Coin {
            currency: currency.into(),
            value,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}
