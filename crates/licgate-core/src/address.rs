//! # Addresses and Deterministic Derivation
//!
//! Every account on the ledger (wallets, holding accounts, Publisher
//! records, entitlement classes) is named by a 32-byte [`Address`].
//! Wallet addresses are Ed25519 public keys; record addresses are derived.
//!
//! ## Derivation
//!
//! [`derive_address`] hashes the canonical JSON form of
//! `{namespace, program, seeds}` with SHA-256. The result depends only on
//! its inputs, so any party can recompute where a record lives without an
//! index, and two records under different namespaces, programs or seeds
//! never share an address.
//!
//! ## Type distinctions
//!
//! [`EntitlementClass`] wraps an `Address` so a class identifier cannot be
//! passed where a wallet or record address is expected.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::canonical::CanonicalBytes;
use crate::digest::sha256_digest;
use crate::error::{CanonicalizationError, ValidationError};
use crate::hex;

/// A 32-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// Wrap raw address bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build a fixed address from an ASCII tag, zero-padded to 32 bytes.
    ///
    /// Tags longer than 32 bytes are truncated. Used for well-known
    /// program identifiers.
    pub const fn from_tag(tag: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        let mut i = 0;
        while i < tag.len() && i < 32 {
            bytes[i] = tag[i];
            i += 1;
        }
        Self(bytes)
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse a 64-character hex address.
    pub fn from_hex(input: &str) -> Result<Self, ValidationError> {
        hex::decode_array::<32>(input)
            .map(Self)
            .map_err(|reason| ValidationError::InvalidAddress {
                input: input.to_string(),
                reason,
            })
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({}...)", hex::prefix(&self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of an entitlement unit type (the license "mint").
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitlementClass(Address);

impl EntitlementClass {
    /// Wrap the class's ledger address.
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// The class's ledger address.
    pub fn address(&self) -> &Address {
        &self.0
    }
}

impl FromStr for EntitlementClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s).map(Self)
    }
}

impl std::fmt::Display for EntitlementClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for EntitlementClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EntitlementClass({}...)", hex::prefix(self.0.as_bytes()))
    }
}

#[derive(Serialize)]
struct DerivationInput<'a> {
    namespace: &'a str,
    program: &'a Address,
    seeds: &'a [Address],
}

/// Derive a record address from a program id, a namespace tag and seeds.
///
/// Pure and deterministic: the same inputs always produce the same
/// address, and changing any input changes it.
pub fn derive_address(
    program: &Address,
    namespace: &str,
    seeds: &[Address],
) -> Result<Address, CanonicalizationError> {
    let canonical = CanonicalBytes::new(&DerivationInput {
        namespace,
        program,
        seeds,
    })?;
    Ok(Address(*sha256_digest(&canonical).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn hex_roundtrip() {
        let a = addr(0xab);
        let hex = a.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Address::from_hex(&hex).unwrap(), a);
        assert_eq!(hex.parse::<Address>().unwrap(), a);
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(matches!(
            Address::from_hex("abcd"),
            Err(ValidationError::InvalidAddress { .. })
        ));
        assert!(Address::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn serde_is_hex_string() {
        let a = addr(1);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json.len(), 66);
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);

        let class = EntitlementClass::new(a);
        assert_eq!(serde_json::to_string(&class).unwrap(), json);
    }

    #[test]
    fn debug_shows_prefix_only() {
        assert_eq!(format!("{:?}", addr(0xff)), "Address(ffffffff...)");
    }

    #[test]
    fn from_tag_pads_with_zeros() {
        let a = Address::from_tag(b"prog");
        assert_eq!(&a.as_bytes()[..4], b"prog");
        assert!(a.as_bytes()[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn derivation_is_deterministic() {
        let program = addr(9);
        let a = derive_address(&program, "publisher", &[addr(1)]).unwrap();
        let b = derive_address(&program, "publisher", &[addr(1)]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn derivation_separates_namespace_program_and_seed() {
        let program = addr(9);
        let base = derive_address(&program, "publisher", &[addr(1)]).unwrap();
        assert_ne!(base, derive_address(&program, "holding", &[addr(1)]).unwrap());
        assert_ne!(base, derive_address(&addr(8), "publisher", &[addr(1)]).unwrap());
        assert_ne!(base, derive_address(&program, "publisher", &[addr(2)]).unwrap());
        assert_ne!(base, addr(1));
    }

    #[test]
    fn seed_order_matters() {
        let program = addr(9);
        let ab = derive_address(&program, "holding", &[addr(1), addr(2)]).unwrap();
        let ba = derive_address(&program, "holding", &[addr(2), addr(1)]).unwrap();
        assert_ne!(ab, ba);
    }
}
