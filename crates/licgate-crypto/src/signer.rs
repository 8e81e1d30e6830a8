//! # Signers and Signed Messages
//!
//! A [`Signer`] is proof that the holder of an address's private key
//! authorized the current operation. The license engine takes `&Signer`
//! wherever a party must co-sign (the authority on initialize and revoke,
//! the subscriber and payer on purchase).
//!
//! There are exactly two ways to obtain one:
//!
//! - [`Signer::from_keypair`], for in-process callers holding the key.
//! - [`SignedMessage::verify`], which checks an Ed25519 signature over the
//!   canonical bytes of the payload. This is the path the API uses.

use licgate_core::{Address, CanonicalBytes, CryptoError};
use serde::{Deserialize, Serialize};

use crate::ed25519::{self, Ed25519KeyPair, Ed25519Signature};

/// A verified co-signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signer {
    address: Address,
}

impl Signer {
    /// Signer for a key pair held by the caller.
    pub fn from_keypair(keypair: &Ed25519KeyPair) -> Self {
        Self {
            address: keypair.address(),
        }
    }

    /// The address that signed.
    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// A payload together with the signer's address and signature over the
/// payload's canonical bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedMessage<T> {
    /// The signed payload.
    pub payload: T,
    /// Address (Ed25519 public key) of the signer.
    pub signer: Address,
    /// Signature over `CanonicalBytes::new(&payload)`.
    pub signature: Ed25519Signature,
}

impl<T: Serialize> SignedMessage<T> {
    /// Sign `payload` with `keypair`.
    pub fn sign(payload: T, keypair: &Ed25519KeyPair) -> Result<Self, CryptoError> {
        let canonical = canonical_payload(&payload)?;
        Ok(Self {
            signature: keypair.sign(&canonical),
            signer: keypair.address(),
            payload,
        })
    }

    /// Verify the signature and return the proven [`Signer`].
    pub fn verify(&self) -> Result<Signer, CryptoError> {
        let canonical = canonical_payload(&self.payload)?;
        ed25519::verify(&canonical, &self.signature, &self.signer)?;
        Ok(Signer {
            address: self.signer,
        })
    }
}

fn canonical_payload<T: Serialize>(payload: &T) -> Result<CanonicalBytes, CryptoError> {
    CanonicalBytes::new(payload)
        .map_err(|e| CryptoError::VerificationFailed(format!("payload not canonicalizable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Purchase {
        publisher: Address,
    }

    #[test]
    fn keypair_signer_reports_its_address() {
        let kp = Ed25519KeyPair::generate();
        assert_eq!(Signer::from_keypair(&kp).address(), &kp.address());
    }

    #[test]
    fn signed_message_verifies_to_signer() {
        let kp = Ed25519KeyPair::generate();
        let msg = SignedMessage::sign(
            Purchase {
                publisher: Address::new([3u8; 32]),
            },
            &kp,
        )
        .unwrap();
        let signer = msg.verify().unwrap();
        assert_eq!(signer.address(), &kp.address());
    }

    #[test]
    fn swapped_signer_address_is_rejected() {
        let kp = Ed25519KeyPair::generate();
        let impostor = Ed25519KeyPair::generate();
        let mut msg = SignedMessage::sign(
            Purchase {
                publisher: Address::new([3u8; 32]),
            },
            &kp,
        )
        .unwrap();
        msg.signer = impostor.address();
        assert!(msg.verify().is_err());
    }

    #[test]
    fn modified_payload_is_rejected() {
        let kp = Ed25519KeyPair::generate();
        let mut msg = SignedMessage::sign(
            Purchase {
                publisher: Address::new([3u8; 32]),
            },
            &kp,
        )
        .unwrap();
        msg.payload.publisher = Address::new([4u8; 32]);
        assert!(matches!(msg.verify(), Err(CryptoError::VerificationFailed(_))));
    }

    #[test]
    fn survives_json_transport() {
        let kp = Ed25519KeyPair::generate();
        let msg = SignedMessage::sign(
            Purchase {
                publisher: Address::new([5u8; 32]),
            },
            &kp,
        )
        .unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        let back: SignedMessage<Purchase> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.verify().unwrap().address(), &kp.address());
    }
}
