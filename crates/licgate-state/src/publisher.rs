//! # Publisher Record
//!
//! One Publisher record per authority, stored at an address derived from
//! the program id, the `"publisher"` namespace and the authority. Nobody
//! keeps an index: every party recomputes the address.
//!
//! ## Layout
//!
//! ```text
//! offset  size  field
//!      0     8  discriminator
//!      8    32  authority
//!     40    32  entitlement_class
//!     72     8  license_price      (u64 LE, lamports)
//!     80     8  total_subscribers  (u64 LE)
//! ```
//!
//! Only `total_subscribers` changes after creation.

use licgate_core::{derive_address, Address, CanonicalizationError, EntitlementClass, Lamports};
use serde::{Deserialize, Serialize};

use crate::error::{LicenseError, RecordError};

/// Namespace tag for Publisher address derivation.
pub const PUBLISHER_NAMESPACE: &str = "publisher";

/// Aggregate configuration and counters for one publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    /// May administer this publisher (revoke licenses). Immutable.
    pub authority: Address,
    /// The class minted as this publisher's license. Immutable.
    pub entitlement_class: EntitlementClass,
    /// Price of one issuance.
    pub license_price: Lamports,
    /// Subscribers currently holding a license.
    pub total_subscribers: u64,
}

impl Publisher {
    /// Leading bytes identifying a Publisher record.
    pub const DISCRIMINATOR: [u8; 8] = *b"lgpubv01";

    /// Encoded record length.
    pub const LEN: usize = 8 + 32 + 32 + 8 + 8;

    /// A fresh record with zero subscribers.
    pub fn new(
        authority: Address,
        entitlement_class: EntitlementClass,
        license_price: Lamports,
    ) -> Result<Self, LicenseError> {
        if license_price.is_zero() {
            return Err(LicenseError::InvalidPrice);
        }
        Ok(Self {
            authority,
            entitlement_class,
            license_price,
            total_subscribers: 0,
        })
    }

    /// Record address for `authority` under `program`.
    pub fn address(program: &Address, authority: &Address) -> Result<Address, CanonicalizationError> {
        derive_address(program, PUBLISHER_NAMESPACE, &[*authority])
    }

    /// Encode to the fixed layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&Self::DISCRIMINATOR);
        out.extend_from_slice(self.authority.as_bytes());
        out.extend_from_slice(self.entitlement_class.address().as_bytes());
        out.extend_from_slice(&self.license_price.get().to_le_bytes());
        out.extend_from_slice(&self.total_subscribers.to_le_bytes());
        out
    }

    /// Decode from the fixed layout.
    pub fn from_bytes(data: &[u8]) -> Result<Self, RecordError> {
        if data.len() != Self::LEN {
            return Err(RecordError::InvalidLength {
                expected: Self::LEN,
                actual: data.len(),
            });
        }
        if read::<8>(data, 0)? != Self::DISCRIMINATOR {
            return Err(RecordError::DiscriminatorMismatch);
        }
        Ok(Self {
            authority: Address::new(read(data, 8)?),
            entitlement_class: EntitlementClass::new(Address::new(read(data, 40)?)),
            license_price: Lamports(u64::from_le_bytes(read(data, 72)?)),
            total_subscribers: u64::from_le_bytes(read(data, 80)?),
        })
    }

    /// Count a new holder. Returns the new total.
    pub fn record_subscription(&mut self) -> Result<u64, LicenseError> {
        self.total_subscribers = self.total_subscribers.checked_add(1).ok_or_else(|| {
            LicenseError::InvariantViolation("total_subscribers overflow".to_string())
        })?;
        Ok(self.total_subscribers)
    }

    /// Remove a holder. Returns the new total; never goes below zero.
    pub fn release_subscription(&mut self) -> Result<u64, LicenseError> {
        self.total_subscribers = self.total_subscribers.checked_sub(1).ok_or_else(|| {
            LicenseError::InvariantViolation("total_subscribers underflow".to_string())
        })?;
        Ok(self.total_subscribers)
    }
}

fn read<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], RecordError> {
    data.get(offset..offset + N)
        .and_then(|s| <[u8; N]>::try_from(s).ok())
        .ok_or(RecordError::InvalidLength {
            expected: Publisher::LEN,
            actual: data.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Publisher {
        Publisher {
            authority: Address::new([1; 32]),
            entitlement_class: EntitlementClass::new(Address::new([2; 32])),
            license_price: Lamports(1_000_000_000),
            total_subscribers: 7,
        }
    }

    #[test]
    fn encoded_length_matches_layout() {
        assert_eq!(Publisher::LEN, 88);
        assert_eq!(sample().to_bytes().len(), Publisher::LEN);
    }

    #[test]
    fn decode_restores_fields() {
        let p = sample();
        assert_eq!(Publisher::from_bytes(&p.to_bytes()).unwrap(), p);
    }

    #[test]
    fn price_and_counter_are_little_endian() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[72..80], &1_000_000_000u64.to_le_bytes());
        assert_eq!(bytes[80], 7);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut bytes = sample().to_bytes();
        bytes.pop();
        assert_eq!(
            Publisher::from_bytes(&bytes),
            Err(RecordError::InvalidLength {
                expected: 88,
                actual: 87
            })
        );
    }

    #[test]
    fn wrong_discriminator_is_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[0] ^= 0xff;
        assert_eq!(
            Publisher::from_bytes(&bytes),
            Err(RecordError::DiscriminatorMismatch)
        );
    }

    #[test]
    fn zero_price_is_invalid() {
        let err = Publisher::new(
            Address::new([1; 32]),
            EntitlementClass::new(Address::new([2; 32])),
            Lamports::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, LicenseError::InvalidPrice));
    }

    #[test]
    fn counter_never_underflows() {
        let mut p = Publisher::new(
            Address::new([1; 32]),
            EntitlementClass::new(Address::new([2; 32])),
            Lamports(1),
        )
        .unwrap();
        assert_eq!(p.record_subscription().unwrap(), 1);
        assert_eq!(p.release_subscription().unwrap(), 0);
        assert!(matches!(
            p.release_subscription(),
            Err(LicenseError::InvariantViolation(_))
        ));
        assert_eq!(p.total_subscribers, 0);
    }

    #[test]
    fn address_is_per_authority_and_program() {
        let program = Address::from_tag(b"program-a");
        let a = Publisher::address(&program, &Address::new([1; 32])).unwrap();
        assert_eq!(a, Publisher::address(&program, &Address::new([1; 32])).unwrap());
        assert_ne!(a, Publisher::address(&program, &Address::new([2; 32])).unwrap());
        assert_ne!(
            a,
            Publisher::address(&Address::from_tag(b"program-b"), &Address::new([1; 32])).unwrap()
        );
    }
}
