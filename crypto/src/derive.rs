//! Deterministic proxy address derivation.
//!
//! `address = low20(blake2b(0xff || factory || salt || init_code_hash))`
//! where `init_code_hash = blake2b(PROXY_CODE_TAG || asset || delegate)`.
//!
//! The address depends only on its inputs, so callers that ask for the same
//! delegate converge on the same proxy without coordinating.

use crate::hash::blake2b_256_multi;
use multidelegate_types::{Address, DelegateId, Salt};

/// Domain separator for proxy init code.
const PROXY_CODE_TAG: &[u8] = b"multidelegate/proxy-delegator/v1";

/// Leading marker byte, keeps derived addresses apart from any other hash use.
const DERIVATION_MARKER: u8 = 0xff;

/// Hash of the proxy's initialisation data: which asset it holds and which
/// delegate it votes for.
pub fn proxy_init_code_hash(asset: &Address, delegate: &DelegateId) -> [u8; 32] {
    blake2b_256_multi(&[
        PROXY_CODE_TAG,
        asset.as_bytes(),
        delegate.address().as_bytes(),
    ])
}

/// Derive the proxy address for `delegate` under `factory` and `salt`.
pub fn derive_proxy_address(
    factory: &Address,
    salt: &Salt,
    asset: &Address,
    delegate: &DelegateId,
) -> Address {
    let code_hash = proxy_init_code_hash(asset, delegate);
    let word = blake2b_256_multi(&[
        &[DERIVATION_MARKER],
        factory.as_bytes(),
        salt.as_bytes(),
        &code_hash,
    ]);
    Address::from_word(&word)
}
