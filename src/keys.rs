//! WireGuard key material.
//!
//! X25519 private/public key pairs and symmetric preshared keys, all carried
//! around as standard (padded) base64 the way `wg genkey` prints them.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use x25519_dalek::StaticSecret;

/// Length in bytes of every key this module handles
pub const KEY_LEN: usize = 32;

/// Encodes with padding, decodes with or without it
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors that can occur while generating or decoding key material
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("no key specified")]
    EmptyKey,

    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(#[from] base64::DecodeError),

    #[error("invalid key material: expected {KEY_LEN} bytes, got {len}")]
    InvalidKeyMaterial { len: usize },

    #[error("entropy source failed: {0}")]
    Entropy(#[from] rand::Error),
}

/// X25519 private key
#[derive(Clone)]
pub struct PrivateKey(StaticSecret);

/// X25519 public key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(x25519_dalek::PublicKey);

/// Symmetric key mixed into the handshake on top of the X25519 exchange
#[derive(Clone, PartialEq, Eq)]
pub struct PresharedKey([u8; KEY_LEN]);

impl PrivateKey {
    /// Generate a new clamped private key from the OS entropy source
    pub fn generate() -> Result<Self, KeyError> {
        let mut bytes = random_bytes()?;
        clamp(&mut bytes);
        Ok(Self(StaticSecret::from(bytes)))
    }

    /// Decode a base64 private key
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        decode_key_bytes(encoded).map(|bytes| Self(StaticSecret::from(bytes)))
    }

    /// Derive the matching public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(x25519_dalek::PublicKey::from(&self.0))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0.to_bytes())
    }
}

impl PublicKey {
    /// Decode a base64 public key
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        decode_key_bytes(encoded).map(|bytes| Self(x25519_dalek::PublicKey::from(bytes)))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0.as_bytes())
    }
}

impl PresharedKey {
    /// Generate 32 random bytes; no clamping applies to symmetric keys
    pub fn generate() -> Result<Self, KeyError> {
        random_bytes().map(Self)
    }

    /// Decode a base64 preshared key
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        decode_key_bytes(encoded).map(Self)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

// Secrets never end up in logs through `{:?}`.
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl fmt::Debug for PresharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PresharedKey(..)")
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_base64())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// Generate a fresh key pair, returned as `(private, public)`
pub fn generate_key_pair() -> Result<(PrivateKey, PublicKey), KeyError> {
    let private = PrivateKey::generate()?;
    let public = private.public_key();
    Ok((private, public))
}

/// Derive the base64 public key for a base64 private key
pub fn derive_public_key_base64(private_key: &str) -> Result<String, KeyError> {
    Ok(PrivateKey::from_base64(private_key)?.public_key().to_base64())
}

fn random_bytes() -> Result<[u8; KEY_LEN], KeyError> {
    let mut bytes = [0u8; KEY_LEN];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}

/// Curve25519 scalar clamping, as applied by `wg genkey`
fn clamp(bytes: &mut [u8; KEY_LEN]) {
    bytes[0] &= 248;
    bytes[31] &= 127;
    bytes[31] |= 64;
}

fn decode_key_bytes(encoded: &str) -> Result<[u8; KEY_LEN], KeyError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(KeyError::EmptyKey);
    }
    let bytes = BASE64.decode(encoded)?;
    <[u8; KEY_LEN]>::try_from(bytes.as_slice())
        .map_err(|_| KeyError::InvalidKeyMaterial { len: bytes.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7748 section 6.1 test vector (Alice)
    const ALICE_PRIVATE_HEX: &str = "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a";
    const ALICE_PUBLIC_HEX: &str = "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a";

    fn hex_to_key(hex: &str) -> [u8; KEY_LEN] {
        let mut out = [0u8; KEY_LEN];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).unwrap();
        }
        out
    }

    #[test]
    fn test_derive_matches_rfc7748_vector() {
        let private = BASE64.encode(hex_to_key(ALICE_PRIVATE_HEX));
        let public = BASE64.encode(hex_to_key(ALICE_PUBLIC_HEX));
        assert_eq!(derive_public_key_base64(&private).unwrap(), public);
    }

    #[test]
    fn test_generated_key_is_clamped() {
        let private = PrivateKey::generate().unwrap();
        let bytes = BASE64.decode(private.to_base64()).unwrap();
        assert_eq!(bytes[0] & 7, 0);
        assert_eq!(bytes[31] & 128, 0);
        assert_eq!(bytes[31] & 64, 64);
    }

    #[test]
    fn test_round_trip_preserves_public_key() {
        let (private, public) = generate_key_pair().unwrap();
        let encoded = private.to_base64();
        assert_eq!(encoded.len(), 44);
        assert!(encoded.ends_with('='));

        let decoded = PrivateKey::from_base64(&encoded).unwrap();
        assert_eq!(decoded.public_key(), public);
        assert_eq!(PublicKey::from_base64(&public.to_base64()).unwrap(), public);
    }

    #[test]
    fn test_unpadded_input_is_accepted() {
        let (private, public) = generate_key_pair().unwrap();
        let unpadded = private.to_base64().trim_end_matches('=').to_string();
        assert_eq!(PrivateKey::from_base64(&unpadded).unwrap().public_key(), public);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(PrivateKey::from_base64(""), Err(KeyError::EmptyKey)));
        assert!(matches!(PublicKey::from_base64("   "), Err(KeyError::EmptyKey)));
        assert!(matches!(
            PrivateKey::from_base64("not base64!!"),
            Err(KeyError::InvalidKeyEncoding(_))
        ));
        assert!(matches!(
            PublicKey::from_base64("AAAA"),
            Err(KeyError::InvalidKeyMaterial { len: 3 })
        ));
        assert!(matches!(
            PresharedKey::from_base64(&BASE64.encode([1u8; 33])),
            Err(KeyError::InvalidKeyMaterial { len: 33 })
        ));
    }

    #[test]
    fn test_preshared_keys_differ() {
        let a = PresharedKey::generate().unwrap();
        let b = PresharedKey::generate().unwrap();
        assert_ne!(a, b);
        assert_eq!(PresharedKey::from_base64(&a.to_base64()).unwrap(), a);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let private = PrivateKey::generate().unwrap();
        assert_eq!(format!("{:?}", private), "PrivateKey(..)");
    }
}
