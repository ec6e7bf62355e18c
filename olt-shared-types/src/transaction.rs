//! Governance transaction messages and their signed envelopes.

use serde::{Deserialize, Serialize};

use crate::governance::{ConfigUpdate, ProposalId, ProposalType, VoteOpinion};
use crate::{Address, Amount, Coin, PublicKeyBytes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProposal {
    pub proposal_id: ProposalId,
    pub headline: String,
    pub description: String,
    pub proposer: Address,
    pub proposal_type: ProposalType,
    pub initial_funding: Coin,
    /// Optional echoes of the registry parameters. When present they must
    /// match the values the engine snapshots.
    #[serde(default)]
    pub funding_goal: Option<Amount>,
    #[serde(default)]
    pub funding_deadline: Option<u64>,
    #[serde(default)]
    pub voting_deadline: Option<u64>,
    #[serde(default)]
    pub pass_percentage: Option<u64>,
    #[serde(default)]
    pub config_update: Option<ConfigUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundProposal {
    pub proposal_id: ProposalId,
    pub fund_value: Coin,
    pub funder_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelProposal {
    pub proposal_id: ProposalId,
    pub proposer: Address,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteProposal {
    pub proposal_id: ProposalId,
    pub opinion: VoteOpinion,
    /// Account paying the fee for this vote.
    pub address: Address,
    /// The voting validator.
    pub validator_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeProposal {
    pub proposal_id: ProposalId,
    pub proposer: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawProposalFunds {
    pub proposal_id: ProposalId,
    /// Whose contribution is being withdrawn; must be the signer.
    pub funder_address: Address,
    pub withdraw_value: Coin,
    /// Receives the withdrawn amount. May differ from the funder.
    pub beneficiary_address: Address,
}

/// Every governance transaction message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum GovernanceTx {
    CreateProposal(CreateProposal),
    FundProposal(FundProposal),
    CancelProposal(CancelProposal),
    VoteProposal(VoteProposal),
    FinalizeProposal(FinalizeProposal),
    WithdrawProposalFunds(WithdrawProposalFunds),
}

/// The identities that must sign a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredSigners {
    Single(Address),
    Dual {
        authenticator: Address,
        fee_payer: Address,
    },
}

impl GovernanceTx {
    pub fn name(&self) -> &'static str {
        match self {
            GovernanceTx::CreateProposal(_) => "CreateProposal",
            GovernanceTx::FundProposal(_) => "FundProposal",
            GovernanceTx::CancelProposal(_) => "CancelProposal",
            GovernanceTx::VoteProposal(_) => "VoteProposal",
            GovernanceTx::FinalizeProposal(_) => "FinalizeProposal",
            GovernanceTx::WithdrawProposalFunds(_) => "WithdrawProposalFunds",
        }
    }

    pub fn proposal_id(&self) -> &ProposalId {
        match self {
            GovernanceTx::CreateProposal(tx) => &tx.proposal_id,
            GovernanceTx::FundProposal(tx) => &tx.proposal_id,
            GovernanceTx::CancelProposal(tx) => &tx.proposal_id,
            GovernanceTx::VoteProposal(tx) => &tx.proposal_id,
            GovernanceTx::FinalizeProposal(tx) => &tx.proposal_id,
            GovernanceTx::WithdrawProposalFunds(tx) => &tx.proposal_id,
        }
    }

    pub fn required_signers(&self) -> RequiredSigners {
        match self {
            GovernanceTx::CreateProposal(tx) => RequiredSigners::Single(tx.proposer),
            GovernanceTx::FundProposal(tx) => RequiredSigners::Single(tx.funder_address),
            GovernanceTx::CancelProposal(tx) => RequiredSigners::Single(tx.proposer),
            GovernanceTx::VoteProposal(tx) => RequiredSigners::Dual {
                authenticator: tx.validator_address,
                fee_payer: tx.address,
            },
            GovernanceTx::FinalizeProposal(tx) => RequiredSigners::Single(tx.proposer),
            GovernanceTx::WithdrawProposalFunds(tx) => RequiredSigners::Single(tx.funder_address),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub gas_price: Coin,
    pub gas: u64,
}

/// The signed portion of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTx {
    pub tx: GovernanceTx,
    pub fee: Fee,
    pub memo: String,
}

impl UnsignedTx {
    /// Canonical bytes covered by every signature on this transaction.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// BLAKE3 hash of the signing bytes.
    pub fn hash(&self) -> Result<crate::Hash, bincode::Error> {
        Ok(blake3::hash(&self.signing_bytes()?).into())
    }
}

/// An ed25519 public key together with its signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSignature {
    #[serde(with = "hex::serde")]
    pub public_key: PublicKeyBytes,
    #[serde(with = "hex::serde")]
    pub signature: [u8; 64],
}

impl TxSignature {
    pub fn signer(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Authorization {
    Single(TxSignature),
    /// Vote envelope: the validator authenticates, a possibly different account pays.
    #[serde(rename_all = "camelCase")]
    Dual {
        authenticator: TxSignature,
        fee_payer: TxSignature,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTx {
    pub tx: GovernanceTx,
    pub fee: Fee,
    pub memo: String,
    pub authorization: Authorization,
}

impl SignedTx {
    pub fn unsigned(&self) -> UnsignedTx {
        UnsignedTx {
            tx: self.tx.clone(),
            fee: self.fee.clone(),
            memo: self.memo.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ProposalId {
        ProposalId::derive(&Address([9; 20]), "h", 0)
    }

    #[test]
    fn test_vote_requires_two_signers() {
        let vote = GovernanceTx::VoteProposal(VoteProposal {
            proposal_id: id(),
            opinion: VoteOpinion::Yes,
            address: Address([1; 20]),
            validator_address: Address([2; 20]),
        });
        assert_eq!(
            vote.required_signers(),
            RequiredSigners::Dual {
                authenticator: Address([2; 20]),
                fee_payer: Address([1; 20]),
            }
        );
    }

    #[test]
    fn test_signing_bytes_cover_fee_and_memo() {
        let tx = UnsignedTx {
            tx: GovernanceTx::FinalizeProposal(FinalizeProposal {
                proposal_id: id(),
                proposer: Address([3; 20]),
            }),
            fee: Fee {
                gas_price: Coin::new("OLT", Amount::from_u64(1)),
                gas: 400_000,
            },
            memo: String::new(),
        };
        let mut other = tx.clone();
        other.memo = "x".to_string();
        assert_ne!(tx.signing_bytes().unwrap(), other.signing_bytes().unwrap());
        let mut cheaper = tx.clone();
        cheaper.fee.gas = 1;
        assert_ne!(tx.hash().unwrap(), cheaper.hash().unwrap());
    }

    #[test]
    fn test_signed_tx_json_shape() {
        let signed = SignedTx {
            tx: GovernanceTx::CancelProposal(CancelProposal {
                proposal_id: id(),
                proposer: Address([4; 20]),
                reason: "typo".to_string(),
            }),
            fee: Fee {
                gas_price: Coin::new("OLT", Amount::from_u64(1_000_000_000)),
                gas: 40_000,
            },
            memo: "m".to_string(),
            authorization: Authorization::Single(TxSignature {
                public_key: [5; 32],
                signature: [6; 64],
            }),
        };
        let json = serde_json::to_value(&signed).unwrap();
        assert_eq!(json["tx"]["type"], "cancelProposal");
        assert_eq!(json["fee"]["gasPrice"]["value"], "1000000000");
        assert!(json["authorization"]["single"]["signature"].is_string());
        let back: SignedTx = serde_json::from_value(json).unwrap();
        assert_eq!(back, signed);
    }
}
