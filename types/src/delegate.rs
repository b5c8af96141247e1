//! Delegate identities and the accounting-token ids derived from them.

use crate::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity of a delegate: the address voting power is directed to.
///
/// Doubles as the numeric id of the delegate's accounting-token class (see
/// [`DelegateId::token_id`]).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DelegateId(Address);

impl DelegateId {
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    pub fn address(&self) -> &Address {
        &self.0
    }

    /// The accounting-token class id: the address widened to a 256-bit
    /// big-endian integer.
    pub fn token_id(&self) -> TokenId {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(self.0.as_bytes());
        TokenId(word)
    }
}

impl From<Address> for DelegateId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for DelegateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A 256-bit accounting-token class id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId([u8; 32]);

impl TokenId {
    pub fn new(word: [u8; 32]) -> Self {
        Self(word)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The delegate this id belongs to, if the id fits in 160 bits.
    pub fn delegate(&self) -> Option<DelegateId> {
        if self.0[..12].iter().any(|b| *b != 0) {
            return None;
        }
        Some(DelegateId(Address::from_word(&self.0)))
    }
}

/// 64 lowercase hex digits, zero-padded, no prefix.
impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
