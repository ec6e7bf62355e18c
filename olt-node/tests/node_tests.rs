use olt_crypto::{co_sign, sign_tx, sign_vote_as_authenticator, OltKeyPair};
use olt_governance::ProposalFilter;
use olt_node::genesis::{DEV_ACCOUNT_SEEDS, DEV_VALIDATOR_SEEDS};
use olt_node::{parse_blocks, Block, GenesisConfig, Node};
use olt_shared_types::governance::{
    ProposalId, ProposalOutcome, ProposalState, ProposalType, VoteOpinion,
};
use olt_shared_types::transaction::{
    CreateProposal, Fee, FinalizeProposal, GovernanceTx, SignedTx, UnsignedTx, VoteProposal,
};
use olt_shared_types::{Amount, Coin};

fn key(seed: u8) -> OltKeyPair {
    OltKeyPair::from_seed(&[seed; 32]).unwrap()
}

fn unsigned(tx: GovernanceTx) -> UnsignedTx {
    UnsignedTx {
        tx,
        fee: Fee {
            gas_price: Coin::new("OLT", Amount::from_u64(1)),
            gas: 100_000,
        },
        memo: String::new(),
    }
}

fn create_general(proposer: &OltKeyPair, amount: u64) -> (ProposalId, SignedTx) {
    let proposal_id = ProposalId::derive(&proposer.address(), "community grant", 0);
    let tx = GovernanceTx::CreateProposal(CreateProposal {
        proposal_id: proposal_id.clone(),
        headline: "community grant".to_string(),
        description: "fund the explorer rewrite".to_string(),
        proposer: proposer.address(),
        proposal_type: ProposalType::General,
        initial_funding: Coin::new("OLT", Amount::from_u64(amount)),
        funding_goal: None,
        funding_deadline: None,
        voting_deadline: None,
        pass_percentage: None,
        config_update: None,
    });
    (proposal_id, sign_tx(unsigned(tx), proposer).unwrap())
}

fn vote(id: &ProposalId, validator: &OltKeyPair, payer: &OltKeyPair) -> SignedTx {
    let tx = unsigned(GovernanceTx::VoteProposal(VoteProposal {
        proposal_id: id.clone(),
        opinion: VoteOpinion::Yes,
        address: payer.address(),
        validator_address: validator.address(),
    }));
    co_sign(sign_vote_as_authenticator(tx, validator).unwrap(), payer).unwrap()
}

#[test]
fn test_default_genesis_round_trips_through_toml() {
    let genesis = GenesisConfig::default();
    genesis.validate().unwrap();
    let text = genesis.to_toml_string().unwrap();
    let parsed = GenesisConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, genesis);
}

#[test]
fn test_dev_keys_match_genesis_addresses() {
    let genesis = GenesisConfig::default();
    let accounts: Vec<_> = DEV_ACCOUNT_SEEDS.iter().map(|seed| key(*seed).address()).collect();
    let validators: Vec<_> = DEV_VALIDATOR_SEEDS.iter().map(|seed| key(*seed).address()).collect();
    assert_eq!(genesis.accounts.iter().map(|a| a.address).collect::<Vec<_>>(), accounts);
    assert_eq!(genesis.validators.iter().map(|v| v.address).collect::<Vec<_>>(), validators);
}

#[test]
fn test_genesis_rejects_unknown_fields() {
    let text = GenesisConfig::default().to_toml_string().unwrap();
    let text = format!("chainName = \"olt-dev\"\n{}", text);
    assert!(GenesisConfig::from_toml_str(&text).is_err());
}

#[test]
fn test_genesis_rejects_incomplete_distribution() {
    let mut genesis = GenesisConfig::default();
    genesis.options.proposal.general.passed_fund_distribution.burn += 1;
    let text = genesis.to_toml_string().unwrap();
    let err = GenesisConfig::from_toml_str(&text).unwrap_err();
    assert!(err.to_string().contains("passedFundDistribution"), "{}", err);
}

#[test]
fn test_genesis_rejects_duplicate_validator() {
    let mut genesis = GenesisConfig::default();
    let first = genesis.validators[0].clone();
    genesis.validators.push(first);
    assert!(genesis.validate().is_err());
}

#[test]
fn test_replay_runs_a_proposal_to_finalization() {
    let genesis = GenesisConfig::default();
    let proposer = key(DEV_ACCOUNT_SEEDS[0]);
    let payer = key(DEV_ACCOUNT_SEEDS[1]);
    let validators: Vec<_> = DEV_VALIDATOR_SEEDS.iter().map(|seed| key(*seed)).collect();

    // The default general goal is 100000, so creation alone starts voting.
    let (id, create) = create_general(&proposer, 100_000);
    let finalize = sign_tx(
        unsigned(GovernanceTx::FinalizeProposal(FinalizeProposal {
            proposal_id: id.clone(),
            proposer: proposer.address(),
        })),
        &proposer,
    )
    .unwrap();
    let blocks = vec![
        Block {
            height: 1,
            txs: vec![create],
        },
        Block {
            height: 2,
            txs: validators[..3].iter().map(|v| vote(&id, v, &payer)).collect(),
        },
        Block {
            height: 3,
            txs: vec![finalize],
        },
    ];

    // Blocks travel as JSON between the signing tools and the node.
    let json = serde_json::to_string(&blocks).unwrap();
    let blocks = parse_blocks(&json).unwrap();

    let mut node = Node::from_genesis(&genesis);
    let report = node.replay(&blocks).unwrap();
    assert_eq!(report.blocks, 3);
    assert_eq!(report.committed_txs, 5);
    assert_eq!(report.rejected_txs, 0);
    assert_eq!(report.final_height, 3);

    let stat = node.queries().list_proposal(&id).unwrap();
    assert_eq!(stat.proposal.outcome, ProposalOutcome::CompletedYes);
    assert_eq!(stat.proposal.state(), ProposalState::Finalized);

    // 18% burned and 18% to the fee pool.
    assert_eq!(node.ledger().burned(), Amount::from_u64(18_000));
    assert_eq!(node.ledger().fee_pool(), Amount::from_u64(18_000));

    let listed = node.queries().list_proposals(&ProposalFilter {
        state: Some(ProposalState::Finalized),
        ..ProposalFilter::default()
    });
    assert_eq!(listed.height, 3);
    assert_eq!(listed.proposal_stats.len(), 1);
}

#[test]
fn test_replay_counts_rejections_and_rejects_stale_heights() {
    let genesis = GenesisConfig::default();
    let proposer = key(DEV_ACCOUNT_SEEDS[0]);
    let (_, create) = create_general(&proposer, 10_000);

    let mut node = Node::from_genesis(&genesis);
    let report = node
        .replay(&[Block {
            height: 5,
            txs: vec![create.clone(), create.clone()],
        }])
        .unwrap();
    assert_eq!(report.committed_txs, 1);
    assert_eq!(report.rejected_txs, 1);

    let stale = [Block {
        height: 5,
        txs: Vec::new(),
    }];
    assert!(node.replay(&stale).is_err());
    assert_eq!(node.coordinator().committed_height(), 5);
}

#[test]
fn test_blocks_without_txs_parse() {
    let blocks = parse_blocks(r#"[{"height": 1}, {"height": 2, "txs": []}]"#).unwrap();
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].txs.is_empty());
}
