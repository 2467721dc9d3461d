//! Signing and verification keys
//!
//! Symmetric HMAC secrets are used for session cookies. Ed25519 pairs cover
//! generators whose signing and verification keys differ.

use crate::{Result, SessionGateError};
use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;

/// Shared secret for the HS* algorithms
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        SecretKey(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Short BLAKE3 fingerprint, safe to log
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Ed25519 key pair for signing operations
#[derive(Clone)]
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new Ed25519 key pair
    pub fn generate() -> Self {
        let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        KeyPair {
            signing_key,
            verifying_key,
        }
    }

    /// Create key pair from signing key bytes
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();

        KeyPair {
            signing_key,
            verifying_key,
        }
    }

    /// Get signing key bytes (sensitive operation)
    pub fn signing_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Get verifying key bytes
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Secret followed by public half, the layout jwt-simple expects
    pub(crate) fn keypair_bytes(&self) -> [u8; 64] {
        let mut full_key = [0u8; 64];
        full_key[..32].copy_from_slice(&self.signing_key_bytes());
        full_key[32..].copy_from_slice(&self.verifying_key_bytes());
        full_key
    }

    pub fn sign(&self, data: &[u8]) -> Signature {
        self.signing_key.sign(data)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.verifying_key)
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.verifying_key_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

/// Public key for verification operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    pub fn from_verifying_key(verifying_key: VerifyingKey) -> Self {
        PublicKey { verifying_key }
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let verifying_key = VerifyingKey::from_bytes(bytes)
            .map_err(|e| SessionGateError::Signature(format!("invalid public key: {}", e)))?;

        Ok(PublicKey { verifying_key })
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Verify a raw signature over `data`
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<()> {
        let signature = Signature::from_slice(signature)
            .map_err(|_| SessionGateError::Signature("invalid signature".to_string()))?;

        self.verifying_key
            .verify(data, &signature)
            .map_err(|_| SessionGateError::Signature("invalid signature".to_string()))
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.to_bytes())
    }
}

/// Key used to produce signatures
#[derive(Debug, Clone)]
pub enum SigningKey {
    Secret(SecretKey),
    Ed25519(KeyPair),
}

impl SigningKey {
    pub fn fingerprint(&self) -> String {
        match self {
            SigningKey::Secret(secret) => secret.fingerprint(),
            SigningKey::Ed25519(pair) => pair.fingerprint(),
        }
    }
}

impl From<SecretKey> for SigningKey {
    fn from(secret: SecretKey) -> Self {
        SigningKey::Secret(secret)
    }
}

impl From<KeyPair> for SigningKey {
    fn from(pair: KeyPair) -> Self {
        SigningKey::Ed25519(pair)
    }
}

/// Key used to check signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationKey {
    Secret(SecretKey),
    Ed25519(PublicKey),
}

impl VerificationKey {
    pub fn fingerprint(&self) -> String {
        match self {
            VerificationKey::Secret(secret) => secret.fingerprint(),
            VerificationKey::Ed25519(public_key) => public_key.fingerprint(),
        }
    }
}

impl From<SecretKey> for VerificationKey {
    fn from(secret: SecretKey) -> Self {
        VerificationKey::Secret(secret)
    }
}

impl From<PublicKey> for VerificationKey {
    fn from(public_key: PublicKey) -> Self {
        VerificationKey::Ed25519(public_key)
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    hex::encode(&hash.as_bytes()[..8])
}

mod hex {
    use std::fmt::Write;

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut output, b| {
            let _ = write!(output, "{:02x}", b);
            output
        })
    }
}
