//! # XP Balance Arithmetic
//!
//! The ledger's currency domain. Balances are 256-bit unsigned integers,
//! persisted as decimal strings so the stored representation never depends
//! on a fixed-width binary encoding.
//!
//! ## Invariants
//!
//! - A balance is never negative (the type is unsigned; debits underflowing
//!   zero are refused at the storage statement, see `service/accounts.rs`).
//! - All arithmetic is checked. Overflow surfaces as a typed error upstream,
//!   never as a silent wrap.

use primitive_types::U256;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An XP amount or balance.
///
/// Thin wrapper around `U256` that fixes the serialized form to a decimal
/// string (`"1234"`), matching how rows are stored in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Xp(U256);

impl Xp {
    /// The zero balance.
    pub const fn zero() -> Self {
        Xp(U256::zero())
    }

    /// Checked addition. `None` on 256-bit overflow.
    pub fn checked_add(self, other: Xp) -> Option<Xp> {
        self.0.checked_add(other.0).map(Xp)
    }

    /// Checked subtraction. `None` when `other > self`.
    pub fn checked_sub(self, other: Xp) -> Option<Xp> {
        self.0.checked_sub(other.0).map(Xp)
    }

    /// Checked multiplication by a small scalar (crate quantity pricing).
    pub fn checked_mul_u64(self, factor: u64) -> Option<Xp> {
        self.0.checked_mul(U256::from(factor)).map(Xp)
    }

    /// Parse from a decimal string, the ledger's storage representation.
    ///
    /// The empty string is rejected (U256 would read it as zero).
    pub fn from_dec_str(s: &str) -> Result<Xp, InvalidXp> {
        if s.is_empty() {
            return Err(InvalidXp {
                input: s.to_string(),
            });
        }
        U256::from_dec_str(s).map(Xp).map_err(|_| InvalidXp {
            input: s.to_string(),
        })
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<u64> for Xp {
    fn from(v: u64) -> Self {
        Xp(U256::from(v))
    }
}

impl fmt::Display for Xp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // U256 displays in base 10.
        write!(f, "{}", self.0)
    }
}

/// A string that failed to parse as a decimal XP amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidXp {
    pub input: String,
}

impl fmt::Display for InvalidXp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid decimal XP amount: {:?}", self.input)
    }
}

impl std::error::Error for InvalidXp {}

impl Serialize for Xp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Xp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Xp::from_dec_str(&s).map_err(D::Error::custom)
    }
}
