//! Asset and accounting-token amounts.
//!
//! Amounts are raw 256-bit unsigned integer units, the width of an ERC-20
//! balance. There is no rounding anywhere; every arithmetic step is checked
//! and overflow is reported to the caller.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of the underlying asset, or of a delegate's accounting-token class.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Self = Self(U256::ZERO);
    /// `2^256 - 1`, also the "unlimited" allowance marker.
    pub const MAX: Self = Self(U256::MAX);

    pub const fn new(raw: u128) -> Self {
        Self(U256::from_limbs([raw as u64, (raw >> 64) as u64, 0, 0]))
    }

    pub const fn from_u256(raw: U256) -> Self {
        Self(raw)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// The amount as a `u128`, if it fits.
    pub fn to_u128(&self) -> Option<u128> {
        u128::try_from(self.0).ok()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<u128> for Amount {
    fn from(raw: u128) -> Self {
        Self::new(raw)
    }
}

impl From<U256> for Amount {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
