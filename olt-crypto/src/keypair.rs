//! Keypair generation and management for OLT accounts.

use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signature, Signer};
use olt_shared_types::transaction::TxSignature;
use olt_shared_types::{Address, PublicKeyBytes};
use rand::rngs::OsRng;

use crate::CryptoError;

/// An ed25519 key pair owning one account address.
pub struct OltKeyPair {
    keypair: Keypair,
}

impl OltKeyPair {
    /// Generates a new random key pair.
    pub fn generate() -> Self {
        let mut csprng = OsRng {};
        let keypair = Keypair::generate(&mut csprng);
        OltKeyPair { keypair }
    }

    /// Rebuilds a key pair from its 32 byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_bytes(seed)
            .map_err(|e| CryptoError::InvalidSeed(e.to_string()))?;
        let public = PublicKey::from(&secret);
        Ok(OltKeyPair {
            keypair: Keypair { secret, public },
        })
    }

    /// Parses a 64 character hex seed.
    pub fn from_seed_hex(seed: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(seed.trim()).map_err(|e| CryptoError::InvalidSeed(e.to_string()))?;
        let seed: [u8; 32] = raw
            .try_into()
            .map_err(|_| CryptoError::InvalidSeed("seed must be 32 bytes".to_string()))?;
        Self::from_seed(&seed)
    }

    /// The 32 byte secret seed this key pair can be rebuilt from.
    pub fn seed(&self) -> [u8; 32] {
        self.keypair.secret.to_bytes()
    }

    pub fn public_key(&self) -> PublicKeyBytes {
        self.keypair.public.to_bytes()
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Signs the given message with the secret key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.keypair.sign(message)
    }

    /// Signs `message` and packages the result with the public key.
    pub fn tx_signature(&self, message: &[u8]) -> TxSignature {
        TxSignature {
            public_key: self.public_key(),
            signature: self.sign(message).to_bytes(),
        }
    }
}
