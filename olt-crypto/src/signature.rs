//! Transaction signing and envelope verification.
//!
//! Most transactions carry one signature from their owning party. A vote is
//! signed in two steps: the validator signs first as authenticator, then the
//! fee payer co-signs the same bytes. Both halves cover identical signing
//! bytes, so they can be produced on different machines.

use ed25519_dalek::{PublicKey, Signature, Verifier};
use log::debug;
use olt_shared_types::transaction::{
    Authorization, Fee, GovernanceTx, RequiredSigners, SignedTx, TxSignature, UnsignedTx,
};
use olt_shared_types::Address;
use serde::{Deserialize, Serialize};

use crate::keypair::OltKeyPair;
use crate::CryptoError;

/// The verified identities behind a signed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signers {
    /// Who the transaction speaks for.
    pub authenticator: Address,
    /// Who pays the fee. Equal to the authenticator for single signed messages.
    pub fee_payer: Address,
}

/// A vote signed by its validator and waiting for the fee payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartiallySignedVote {
    pub tx: GovernanceTx,
    pub fee: Fee,
    pub memo: String,
    pub authenticator: TxSignature,
}

impl PartiallySignedVote {
    fn unsigned(&self) -> UnsignedTx {
        UnsignedTx {
            tx: self.tx.clone(),
            fee: self.fee.clone(),
            memo: self.memo.clone(),
        }
    }
}

fn expect_key(keypair: &OltKeyPair, expected: Address) -> Result<(), CryptoError> {
    if keypair.address() != expected {
        return Err(CryptoError::WrongKey(expected));
    }
    Ok(())
}

/// Signs a single-party transaction with its owner's key.
pub fn sign_tx(unsigned: UnsignedTx, keypair: &OltKeyPair) -> Result<SignedTx, CryptoError> {
    let owner = match unsigned.tx.required_signers() {
        RequiredSigners::Single(owner) => owner,
        RequiredSigners::Dual { .. } => {
            return Err(CryptoError::WrongAuthorization {
                tx: unsigned.tx.name(),
                expected: "dual",
            })
        }
    };
    expect_key(keypair, owner)?;
    let signature = keypair.tx_signature(&unsigned.signing_bytes()?);
    Ok(SignedTx {
        tx: unsigned.tx,
        fee: unsigned.fee,
        memo: unsigned.memo,
        authorization: Authorization::Single(signature),
    })
}

/// First half of a vote: the validator signs.
pub fn sign_vote_as_authenticator(
    unsigned: UnsignedTx,
    validator: &OltKeyPair,
) -> Result<PartiallySignedVote, CryptoError> {
    let authenticator = match unsigned.tx.required_signers() {
        RequiredSigners::Dual { authenticator, .. } => authenticator,
        RequiredSigners::Single(_) => {
            return Err(CryptoError::WrongAuthorization {
                tx: unsigned.tx.name(),
                expected: "single",
            })
        }
    };
    expect_key(validator, authenticator)?;
    let signature = validator.tx_signature(&unsigned.signing_bytes()?);
    Ok(PartiallySignedVote {
        tx: unsigned.tx,
        fee: unsigned.fee,
        memo: unsigned.memo,
        authenticator: signature,
    })
}

/// Second half of a vote: the fee payer co-signs.
pub fn co_sign(
    partial: PartiallySignedVote,
    fee_payer: &OltKeyPair,
) -> Result<SignedTx, CryptoError> {
    let expected = match partial.tx.required_signers() {
        RequiredSigners::Dual { fee_payer, .. } => fee_payer,
        RequiredSigners::Single(_) => {
            return Err(CryptoError::WrongAuthorization {
                tx: partial.tx.name(),
                expected: "single",
            })
        }
    };
    expect_key(fee_payer, expected)?;
    let bytes = partial.unsigned().signing_bytes()?;
    verify_signature(&partial.authenticator, &bytes)?;
    let fee_payer_signature = fee_payer.tx_signature(&bytes);
    Ok(SignedTx {
        tx: partial.tx,
        fee: partial.fee,
        memo: partial.memo,
        authorization: Authorization::Dual {
            authenticator: partial.authenticator,
            fee_payer: fee_payer_signature,
        },
    })
}

/// Verifies one signature against `message`.
pub fn verify_signature(signature: &TxSignature, message: &[u8]) -> Result<(), CryptoError> {
    let public_key = PublicKey::from_bytes(&signature.public_key)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    let parsed = Signature::try_from(&signature.signature[..])
        .map_err(|_| CryptoError::InvalidSignature(signature.signer()))?;
    public_key
        .verify(message, &parsed)
        .map_err(|_| CryptoError::InvalidSignature(signature.signer()))
}

fn check_signer(signature: &TxSignature, expected: Address) -> Result<(), CryptoError> {
    let actual = signature.signer();
    if actual != expected {
        return Err(CryptoError::SignerMismatch { expected, actual });
    }
    Ok(())
}

/// Checks that a signed transaction carries exactly the authorization its
/// message requires and that every signature verifies.
pub fn authenticate(signed: &SignedTx) -> Result<Signers, CryptoError> {
    let bytes = signed.unsigned().signing_bytes()?;
    let signers = match (signed.tx.required_signers(), &signed.authorization) {
        (RequiredSigners::Single(owner), Authorization::Single(signature)) => {
            check_signer(signature, owner)?;
            verify_signature(signature, &bytes)?;
            Signers {
                authenticator: owner,
                fee_payer: owner,
            }
        }
        (
            RequiredSigners::Dual { authenticator, fee_payer },
            Authorization::Dual {
                authenticator: auth_sig,
                fee_payer: payer_sig,
            },
        ) => {
            check_signer(auth_sig, authenticator)?;
            check_signer(payer_sig, fee_payer)?;
            verify_signature(auth_sig, &bytes)?;
            verify_signature(payer_sig, &bytes)?;
            Signers {
                authenticator,
                fee_payer,
            }
        }
        (RequiredSigners::Single(_), Authorization::Dual { .. }) => {
            return Err(CryptoError::WrongAuthorization {
                tx: signed.tx.name(),
                expected: "single",
            })
        }
        (RequiredSigners::Dual { .. }, Authorization::Single(_)) => {
            return Err(CryptoError::WrongAuthorization {
                tx: signed.tx.name(),
                expected: "dual",
            })
        }
    };
    debug!(
        "authenticated {} for proposal {} signed by {}",
        signed.tx.name(),
        signed.tx.proposal_id(),
        signers.authenticator
    );
    Ok(signers)
}
