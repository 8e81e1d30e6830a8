//! # Ed25519 Signing and Verification
//!
//! A wallet's ledger [`Address`] is its Ed25519 public key. Signing input is
//! always `&CanonicalBytes`, so a signature produced here verifies against
//! any other implementation that canonicalizes the same payload.
//!
//! Private keys are never serialized or printed: [`Ed25519KeyPair`] has no
//! `Serialize` impl and its `Debug` output is redacted.

use ed25519_dalek::{Signer as _, Verifier as _};
use licgate_core::{hex, Address, CanonicalBytes, CryptoError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An Ed25519 signature (64 bytes). Serializes as a hex string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; 64]);

/// An Ed25519 key pair.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519Signature impls
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Lowercase hex rendering (128 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse a 128-character hex signature.
    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        hex::decode_array::<64>(input)
            .map(Self)
            .map_err(|e| CryptoError::KeyError(format!("signature: {e}")))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", hex::prefix(&self.0))
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair impls
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a new random key pair from the OS RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Deterministic key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// The ledger address controlled by this key pair.
    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(data.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify `signature` over `data` against the public key at `address`.
pub fn verify(
    data: &CanonicalBytes,
    signature: &Ed25519Signature,
    address: &Address,
) -> Result<(), CryptoError> {
    let vk = ed25519_dalek::VerifyingKey::from_bytes(address.as_bytes())
        .map_err(|e| CryptoError::KeyError(format!("address is not an ed25519 key: {e}")))?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify(data.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(v: serde_json::Value) -> CanonicalBytes {
        CanonicalBytes::new(&v).unwrap()
    }

    #[test]
    fn sign_and_verify() {
        let kp = Ed25519KeyPair::generate();
        let data = canonical(serde_json::json!({"license_price": 1_000_000_000u64}));
        let sig = kp.sign(&data);
        verify(&data, &sig, &kp.address()).expect("valid signature should verify");
    }

    #[test]
    fn wrong_key_fails() {
        let signer = Ed25519KeyPair::generate();
        let other = Ed25519KeyPair::generate();
        let data = canonical(serde_json::json!({"x": 1}));
        let sig = signer.sign(&data);
        assert!(matches!(
            verify(&data, &sig, &other.address()),
            Err(CryptoError::VerificationFailed(_))
        ));
    }

    #[test]
    fn tampered_message_fails() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&canonical(serde_json::json!({"price": 1})));
        assert!(verify(&canonical(serde_json::json!({"price": 2})), &sig, &kp.address()).is_err());
    }

    #[test]
    fn seed_is_deterministic() {
        let a = Ed25519KeyPair::from_seed(&[7u8; 32]);
        let b = Ed25519KeyPair::from_seed(&[7u8; 32]);
        assert_eq!(a.address(), b.address());
        let data = canonical(serde_json::json!({"k": "v"}));
        assert_eq!(a.sign(&data), b.sign(&data));
    }

    #[test]
    fn signature_serde_is_hex() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&canonical(serde_json::json!({})));
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json.len(), 128 + 2);
        let back: Ed25519Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
        assert!(Ed25519Signature::from_hex("abcd").is_err());
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let kp = Ed25519KeyPair::generate();
        assert_eq!(format!("{kp:?}"), "Ed25519KeyPair(<private>)");
    }
}
