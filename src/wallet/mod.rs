use std::fmt;

use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use sha2::{Digest, Sha256};

use crate::error::KeyError;

/// Key pair a node signs its coinbase transactions with.
/// The public half (hex, compressed) doubles as the node's ledger identity.
#[derive(Clone)]
pub struct NodeIdentity {
    secret: SecretKey,
    public_hex: String,
}

impl NodeIdentity {
    /// Generate a fresh secp256k1 key pair.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut OsRng);
        Self {
            secret,
            public_hex: hex::encode(public.serialize()),
        }
    }

    /// Load an identity from a hex-encoded 32-byte secret key.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(secret_hex.trim()).map_err(|_| KeyError::InvalidHex)?;
        let secret = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidSecretKey)?;
        let secp = Secp256k1::signing_only();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self {
            secret,
            public_hex: hex::encode(public.serialize()),
        })
    }

    pub fn public_key_hex(&self) -> &str {
        &self.public_hex
    }

    /// Hex of the 32-byte secret, the form `from_secret_hex` reads back.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret.secret_bytes())
    }

    /// Sign `message` and return the hex DER signature.
    pub fn sign(&self, message: &str) -> String {
        sign_message_hex(&self.secret, message)
    }
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIdentity")
            .field("public_key", &self.public_hex)
            .finish_non_exhaustive()
    }
}

/// SHA-256 digest of the UTF-8 message; this is what actually gets signed.
pub fn message_digest(message: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Parse a hex public key and return its canonical form
/// (lowercase hex of the compressed encoding).
pub fn normalize_public_key(pubkey_hex: &str) -> Result<String, KeyError> {
    let bytes = hex::decode(pubkey_hex).map_err(|_| KeyError::InvalidHex)?;
    let pk = PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
    Ok(hex::encode(pk.serialize()))
}

pub fn sign_message_hex(secret: &SecretKey, message: &str) -> String {
    let secp = Secp256k1::signing_only();
    let msg = Message::from_digest(message_digest(message));
    let sig = secp.sign_ecdsa(&msg, secret);
    hex::encode(&sig.serialize_der()[..])
}

/// Verify a hex DER signature over `message` against a hex public key.
/// `Ok(false)` means well-formed inputs that simply do not verify.
pub fn verify_signature_hex(
    pubkey_hex: &str,
    sig_hex: &str,
    message: &str,
) -> Result<bool, KeyError> {
    let secp = Secp256k1::verification_only();

    let pk_bytes = hex::decode(pubkey_hex).map_err(|_| KeyError::InvalidHex)?;
    let pk = PublicKey::from_slice(&pk_bytes).map_err(|_| KeyError::InvalidPublicKey)?;

    let sig_bytes = hex::decode(sig_hex).map_err(|_| KeyError::InvalidHex)?;
    let sig = Signature::from_der(&sig_bytes).map_err(|_| KeyError::InvalidSignature)?;

    let msg = Message::from_digest(message_digest(message));
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}
