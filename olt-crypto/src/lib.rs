//! Cryptographic primitives for OLT governance transactions

use olt_shared_types::Address;
use thiserror::Error;

pub mod keypair;
pub mod signature;

pub use keypair::OltKeyPair;
pub use signature::{
    authenticate, co_sign, sign_tx, sign_vote_as_authenticator, PartiallySignedVote, Signers,
};

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid seed: {0}")]
    InvalidSeed(String),
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("signature verification failed for {0}")]
    InvalidSignature(Address),
    #[error("{tx} requires {expected} authorization")]
    WrongAuthorization {
        tx: &'static str,
        expected: &'static str,
    },
    #[error("signer mismatch: expected {expected}, got {actual}")]
    SignerMismatch { expected: Address, actual: Address },
    #[error("key does not belong to {0}")]
    WrongKey(Address),
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}
