use crate::error::SignatureError;
use ed25519_dalek::Verifier;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use xrpl_hash::Hash;

/// Size in bytes of a serialized public key (both algorithms).
pub const PUBLIC_KEY_SIZE_BYTES: usize = 33;

/// Size in bytes of an account id digest.
pub const ACCOUNT_ID_SIZE_BYTES: usize = 20;

/// First byte of a serialized Ed25519 public key.
const ED25519_KEY_PREFIX: u8 = 0xED;

/// A public key in one of the two supported algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublicKey {
    /// Compressed secp256k1 point (33 bytes, 0x02/0x03 prefix).
    Secp256k1(secp256k1::PublicKey),
    /// Ed25519 verifying key, serialized with a 0xED prefix byte.
    Ed25519(ed25519_dalek::VerifyingKey),
}

impl PublicKey {
    /// Parse a 33-byte serialized public key. The first byte selects the
    /// algorithm; anything other than 0x02, 0x03 or 0xED is rejected.
    pub fn from_bytes(data: &[u8]) -> Result<Self, SignatureError> {
        if data.len() != PUBLIC_KEY_SIZE_BYTES {
            return Err(SignatureError::PublicKeyError(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_SIZE_BYTES,
                data.len()
            )));
        }
        match data[0] {
            0x02 | 0x03 => secp256k1::PublicKey::from_slice(data)
                .map(PublicKey::Secp256k1)
                .map_err(|err| SignatureError::PublicKeyError(format!("{}", err))),
            ED25519_KEY_PREFIX => {
                // data[1..] is exactly 32 bytes here
                let bytes: [u8; 32] = data[1..].try_into().unwrap();
                ed25519_dalek::VerifyingKey::from_bytes(&bytes)
                    .map(PublicKey::Ed25519)
                    .map_err(|err| SignatureError::PublicKeyError(format!("{}", err)))
            }
            prefix => Err(SignatureError::PublicKeyError(format!(
                "unknown public key prefix 0x{:02X}",
                prefix
            ))),
        }
    }

    /// Serialize to the canonical 33-byte form.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE_BYTES] {
        match self {
            PublicKey::Secp256k1(key) => key.serialize(),
            PublicKey::Ed25519(key) => {
                let mut out = [0u8; PUBLIC_KEY_SIZE_BYTES];
                out[0] = ED25519_KEY_PREFIX;
                out[1..].copy_from_slice(key.as_bytes());
                out
            }
        }
    }

    /// Verify `signature` over `message` (already prefix-framed).
    ///
    /// secp256k1 signs the SHA-512-Half digest of the message; Ed25519 signs
    /// the message itself. Both conventions are part of the protocol.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        match (self, signature) {
            (PublicKey::Secp256k1(key), Signature::Secp256k1(sig)) => {
                let digest = Hash::compute_from(message);
                let msg = secp256k1::Message::from_digest(*digest.to_bytes());
                secp256k1::Secp256k1::verification_only()
                    .verify_ecdsa(&msg, sig, key)
                    .map_err(|err| SignatureError::VerifyError(format!("{}", err)))
            }
            (PublicKey::Ed25519(key), Signature::Ed25519(sig)) => key
                .verify(message, sig)
                .map_err(|err| SignatureError::VerifyError(format!("{}", err))),
            _ => Err(SignatureError::VerifyError(
                "signature algorithm does not match public key".to_string(),
            )),
        }
    }
}

/// A signature in one of the two supported algorithms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signature {
    /// DER-encoded ECDSA signature.
    Secp256k1(secp256k1::ecdsa::Signature),
    /// Raw 64-byte Ed25519 signature.
    Ed25519(ed25519_dalek::Signature),
}

impl Signature {
    /// Parse signature bytes in the algorithm the public key declares.
    pub fn from_bytes(public_key: &PublicKey, data: &[u8]) -> Result<Self, SignatureError> {
        match public_key {
            PublicKey::Secp256k1(_) => secp256k1::ecdsa::Signature::from_der(data)
                .map(Signature::Secp256k1)
                .map_err(|err| SignatureError::SignatureParseError(format!("{}", err))),
            PublicKey::Ed25519(_) => {
                let bytes: [u8; 64] = data.try_into().map_err(|_| {
                    SignatureError::SignatureParseError(format!(
                        "expected 64 bytes for an Ed25519 signature, got {}",
                        data.len()
                    ))
                })?;
                Ok(Signature::Ed25519(ed25519_dalek::Signature::from_bytes(
                    &bytes,
                )))
            }
        }
    }

    /// Serialize to wire bytes (DER or raw 64, per algorithm).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Signature::Secp256k1(sig) => sig.serialize_der().to_vec(),
            Signature::Ed25519(sig) => sig.to_bytes().to_vec(),
        }
    }
}

/// A signing key pair. Signing lives behind the same type for both
/// algorithms so test environments can mint accounts of either kind.
pub enum KeyPair {
    /// secp256k1 secret key.
    Secp256k1(secp256k1::SecretKey),
    /// Ed25519 signing key.
    Ed25519(ed25519_dalek::SigningKey),
}

impl KeyPair {
    /// Generate a fresh secp256k1 key pair.
    pub fn generate_secp256k1() -> Self {
        KeyPair::Secp256k1(secp256k1::SecretKey::new(&mut rand::thread_rng()))
    }

    /// Generate a fresh Ed25519 key pair.
    pub fn generate_ed25519() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        KeyPair::Ed25519(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// Derive a deterministic secp256k1 key pair from a seed, for test
    /// fixtures that need stable account ids.
    pub fn from_seed_secp256k1(seed: &[u8]) -> Self {
        // hash the seed until it lands in the curve order; terminates with
        // overwhelming probability after one round
        let mut digest = Sha256::digest(seed);
        loop {
            if let Ok(key) = secp256k1::SecretKey::from_slice(&digest) {
                return KeyPair::Secp256k1(key);
            }
            digest = Sha256::digest(digest);
        }
    }

    /// The matching public key.
    pub fn get_public_key(&self) -> PublicKey {
        match self {
            KeyPair::Secp256k1(secret) => PublicKey::Secp256k1(
                secp256k1::PublicKey::from_secret_key(&secp256k1::Secp256k1::new(), secret),
            ),
            KeyPair::Ed25519(signing) => PublicKey::Ed25519(signing.verifying_key()),
        }
    }

    /// Sign a prefix-framed message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        match self {
            KeyPair::Secp256k1(secret) => {
                let digest = Hash::compute_from(message);
                let msg = secp256k1::Message::from_digest(*digest.to_bytes());
                Signature::Secp256k1(secp256k1::Secp256k1::new().sign_ecdsa(&msg, secret))
            }
            KeyPair::Ed25519(signing) => {
                use ed25519_dalek::Signer;
                Signature::Ed25519(signing.sign(message))
            }
        }
    }
}

/// The 20-byte account id digest of a serialized public key:
/// RIPEMD-160 of SHA-256 of the 33 key bytes.
pub fn account_id_digest(public_key: &PublicKey) -> [u8; ACCOUNT_ID_SIZE_BYTES] {
    let sha = Sha256::digest(public_key.to_bytes());
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; ACCOUNT_ID_SIZE_BYTES];
    out.copy_from_slice(&ripe);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secp256k1_sign_verify() {
        let keypair = KeyPair::generate_secp256k1();
        let public_key = keypair.get_public_key();
        let message = b"STX\0payload";
        let signature = keypair.sign(message);
        assert!(public_key.verify(message, &signature).is_ok());
        assert!(public_key.verify(b"STX\0tampered", &signature).is_err());
    }

    #[test]
    fn test_ed25519_sign_verify() {
        let keypair = KeyPair::generate_ed25519();
        let public_key = keypair.get_public_key();
        let message = b"SMT\0payload";
        let signature = keypair.sign(message);
        assert!(public_key.verify(message, &signature).is_ok());
        assert!(public_key.verify(b"SMT\0tampered", &signature).is_err());
    }

    #[test]
    fn test_public_key_roundtrip() {
        for keypair in [KeyPair::generate_secp256k1(), KeyPair::generate_ed25519()] {
            let public_key = keypair.get_public_key();
            let bytes = public_key.to_bytes();
            assert_eq!(PublicKey::from_bytes(&bytes).unwrap(), public_key);
        }
    }

    #[test]
    fn test_bad_key_prefix_rejected() {
        let mut bytes = [0u8; PUBLIC_KEY_SIZE_BYTES];
        bytes[0] = 0x04;
        assert!(PublicKey::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_signature_bytes_roundtrip() {
        let keypair = KeyPair::generate_secp256k1();
        let public_key = keypair.get_public_key();
        let signature = keypair.sign(b"data");
        let parsed = Signature::from_bytes(&public_key, &signature.to_bytes()).unwrap();
        assert_eq!(parsed, signature);
    }

    #[test]
    fn test_deterministic_seed() {
        let a = KeyPair::from_seed_secp256k1(b"alice");
        let b = KeyPair::from_seed_secp256k1(b"alice");
        assert_eq!(
            account_id_digest(&a.get_public_key()),
            account_id_digest(&b.get_public_key())
        );
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let secp = KeyPair::generate_secp256k1();
        let ed = KeyPair::generate_ed25519();
        let signature = ed.sign(b"data");
        assert!(secp.get_public_key().verify(b"data", &signature).is_err());
    }
}
