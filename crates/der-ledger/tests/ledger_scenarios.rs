//! # End-to-end Ledger Scenarios
//!
//! Drives [`LedgerService`] only through its public surface.
//!
//! ## Test Categories
//!
//! 1. **Issuance** - registered, unknown and blacklisted nodes
//! 2. **Attacks** - replay, spoofing, flood, unknown kinds
//! 3. **Rollback & Integrity** - truncation bounds, tamper detection
//! 4. **Concurrency** - parallel issuers sharing one ledger

use der_ledger::{
    AttackReport, BlacklistPolicy, CancelToken, CertificateLedgerApi, HashChain, IssueResult,
    LedgerConfig, LedgerError, LedgerService, ManualTimeSource, NodeRole,
};
use std::sync::Arc;
use std::thread;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn make_config() -> LedgerConfig {
    let mut config = LedgerConfig::default();
    config.noise.seed = Some(7);
    config
}

fn make_ledger() -> LedgerService {
    make_ledger_with(make_config())
}

fn make_ledger_with(config: LedgerConfig) -> LedgerService {
    LedgerService::with_time_source(config, Arc::new(ManualTimeSource::new(1_000, 10))).unwrap()
}

// =============================================================================
// ISSUANCE
// =============================================================================

#[test]
fn test_issue_to_registered_node_appends_noised_block() {
    let ledger = make_ledger();

    let outcome = ledger.issue_certificate("Node1", "Certificate A").unwrap();

    assert_eq!(outcome.block.index, 2);
    assert!(outcome.block.payload.starts_with("Certificate A_noise_"));
    assert!(outcome.duration_seconds >= 0.0);
    assert_eq!(outcome.payload_bytes, outcome.block.payload.len());
    assert_eq!(ledger.get_chain().len(), 2);
    assert_eq!(
        ledger.node("Node1").unwrap().certificates,
        vec![outcome.block]
    );
}

#[test]
fn test_issue_to_unknown_node_leaves_chain_untouched() {
    let ledger = make_ledger();

    let err = ledger.issue_certificate("Node99", "cert").unwrap_err();

    assert_eq!(
        err,
        LedgerError::NodeNotFound {
            node_id: "Node99".into()
        }
    );
    assert_eq!(ledger.chain_len(), 1);
}

#[test]
fn test_blacklisted_node_cannot_issue() {
    let ledger = make_ledger();
    ledger.issue_certificate("Node2", "before").unwrap();

    ledger.blacklist_node("Node2");

    assert_eq!(
        ledger.issue_certificate("Node2", "after").unwrap_err(),
        LedgerError::NodeBlacklisted {
            node_id: "Node2".into()
        }
    );
    assert_eq!(ledger.chain_len(), 2);
    // History survives blacklisting
    assert_eq!(ledger.node("Node2").unwrap().certificates.len(), 1);
}

#[test]
fn test_default_blacklist_is_permanent() {
    let ledger = make_ledger();
    ledger.blacklist_node("Node3");

    assert!(matches!(
        ledger.unblacklist_node("Node3"),
        Err(LedgerError::BlacklistIrreversible { .. })
    ));
    assert!(ledger.is_blacklisted("Node3"));
}

#[test]
fn test_reversible_blacklist_can_be_lifted() {
    let mut config = make_config();
    config.blacklist = BlacklistPolicy {
        reversible: true,
        ttl_secs: None,
    };
    let ledger = make_ledger_with(config);

    ledger.blacklist_node("Node1");
    assert_eq!(ledger.unblacklist_node("Node1"), Ok(true));
    assert_eq!(ledger.unblacklist_node("Node1"), Ok(false));
    assert!(ledger.issue_certificate("Node1", "cert").is_ok());
}

#[test]
fn test_register_and_overwrite() {
    let ledger = make_ledger();
    ledger.issue_certificate("Node1", "cert").unwrap();

    assert!(matches!(
        ledger.register_node("Node1", NodeRole::Consumer, false),
        Err(LedgerError::NodeAlreadyRegistered { .. })
    ));

    ledger
        .register_node("Node1", NodeRole::Consumer, true)
        .unwrap();
    let node = ledger.node("Node1").unwrap();
    assert_eq!(node.role, NodeRole::Consumer);
    assert!(node.certificates.is_empty());
}

// =============================================================================
// ATTACKS
// =============================================================================

#[test]
fn test_replay_duplicates_tail_payload() {
    let ledger = make_ledger();
    ledger.issue_certificate("Node1", "cert").unwrap();
    let tail = ledger.get_block(1).unwrap();

    let report = ledger.simulate_attack("replay").unwrap();

    match report {
        AttackReport::Replay(replay) => {
            assert_eq!(replay.replayed_payload, tail.payload);
            assert_eq!(replay.block_added.prev_hash, tail.hash);
            assert_ne!(replay.block_added.hash, tail.hash);
            assert!(replay.chain_valid_after);
        }
        other => panic!("expected replay report, got {:?}", other),
    }
    assert_eq!(ledger.chain_len(), 3);
}

#[test]
fn test_spoofing_registers_malicious_node() {
    let ledger = make_ledger();

    let report = ledger.simulate_attack("spoofing").unwrap();

    let spoof = match report {
        AttackReport::Spoofing(spoof) => spoof,
        other => panic!("expected spoofing report, got {:?}", other),
    };
    assert!(spoof.fake_node_id.starts_with("FakeNode_"));
    assert!(matches!(spoof.issue_result, IssueResult::Issued(_)));
    assert_eq!(
        ledger.node(&spoof.fake_node_id).unwrap().role,
        NodeRole::Malicious
    );

    let activity = ledger.get_node_activity();
    assert_eq!(activity.total, 4);
    assert_eq!(activity.malicious_count, 1);
    assert!((activity.malicious_percentage - 25.0).abs() < 1e-9);
}

#[test]
fn test_repeated_spoofing_uses_distinct_ids() {
    let ledger = make_ledger();
    let mut ids = Vec::new();
    for _ in 0..20 {
        if let AttackReport::Spoofing(spoof) = ledger.simulate_attack("spoofing").unwrap() {
            ids.push(spoof.fake_node_id);
        }
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
    assert_eq!(ledger.get_node_activity().malicious_count, 20);
}

#[test]
fn test_flood_is_bounded_and_chain_stays_valid() {
    let ledger = make_ledger();

    let report = ledger.simulate_attack("flood").unwrap();

    let flood = match report {
        AttackReport::Flood(flood) => flood,
        other => panic!("expected flood report, got {:?}", other),
    };
    assert_eq!(flood.transactions_processed, 1000);
    assert_eq!(flood.per_transaction_times.len(), 1000);
    assert!(flood.total_time >= 0.0);
    assert!(flood.recovery_time >= 0.0);
    assert!(flood.recovery_probes >= 1);
    assert_eq!(ledger.chain_len(), 1 + 1000 + flood.recovery_probes);
    assert!(ledger.validate_chain());
}

#[test]
fn test_ddos_alias_runs_flood() {
    let mut config = make_config();
    config.flood.transactions = 50;
    let ledger = make_ledger_with(config);

    let report = ledger.simulate_attack("ddos").unwrap();
    assert!(matches!(report, AttackReport::Flood(_)));
}

#[test]
fn test_cancelled_flood_reports_cancellation() {
    let ledger = make_ledger();
    let cancel = CancelToken::new();
    cancel.cancel();

    assert!(matches!(
        ledger.simulate_attack_with_cancel("flood", &cancel),
        Err(LedgerError::SimulationCancelled { .. })
    ));
    assert!(ledger.validate_chain());
    assert_eq!(ledger.metrics().attacks_failed, 1);
}

#[test]
fn test_unknown_attack_type_is_rejected() {
    let ledger = make_ledger();
    for kind in ["eclipse", "", "Replay!"] {
        assert!(matches!(
            ledger.simulate_attack(kind),
            Err(LedgerError::UnknownAttackType { .. })
        ));
    }
    assert_eq!(ledger.chain_len(), 1);
}

#[test]
fn test_measure_recovery_reports_valid_chain() {
    let ledger = make_ledger();

    let report = ledger.measure_recovery("replay").unwrap();

    assert_eq!(report.attack_type.as_str(), "replay");
    assert!(report.recovery_duration_seconds >= 0.0);
    assert!(report.chain_valid_after);
    assert!(matches!(report.attack_report, AttackReport::Replay(_)));
}

// =============================================================================
// ROLLBACK & INTEGRITY
// =============================================================================

#[test]
fn test_issue_spoof_rollback_scenario() {
    let ledger = make_ledger();

    ledger.issue_certificate("Node1", "Certificate A").unwrap();
    let kept = ledger.get_chain();
    ledger.simulate_attack("spoofing").unwrap();
    assert_eq!(ledger.chain_len(), 3);

    assert_eq!(ledger.rollback(2), Ok(2));

    assert_eq!(ledger.get_chain(), kept);
    assert!(ledger.validate_chain());
    let snap = ledger.metrics();
    assert_eq!(snap.rollbacks, 1);
    assert_eq!(snap.blocks_rolled_back, 1);
}

#[test]
fn test_rollback_bounds() {
    let ledger = make_ledger();
    ledger.issue_certificate("Node1", "a").unwrap();
    ledger.issue_certificate("Node1", "b").unwrap();

    assert!(matches!(
        ledger.rollback(0),
        Err(LedgerError::InvalidIndex { requested: 0, .. })
    ));
    assert!(matches!(
        ledger.rollback(3),
        Err(LedgerError::InvalidIndex {
            requested: 3,
            length: 3
        })
    ));
    assert_eq!(ledger.chain_len(), 3);
    assert_eq!(ledger.rollback(1), Ok(1));
}

#[test]
fn test_get_block_out_of_range() {
    let ledger = make_ledger();
    assert_eq!(
        ledger.get_block(5).unwrap_err(),
        LedgerError::IndexOutOfRange {
            index: 5,
            length: 1
        }
    );
}

#[test]
fn test_tampered_export_fails_validation() {
    let ledger = make_ledger();
    ledger.issue_certificate("Node1", "a").unwrap();
    ledger.issue_certificate("Node2", "b").unwrap();

    let mut blocks = ledger.get_chain();
    blocks[1].payload = "forged".into();
    let clock = Arc::new(ManualTimeSource::new(0, 1));
    let forged = HashChain::from_blocks(blocks, clock).unwrap();

    assert!(!forged.validate());
    assert_eq!(forged.inspect().first_invalid_index, Some(2));
    assert!(ledger.validate_chain());
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[test]
fn test_parallel_issuers_and_attacks() {
    let mut config = make_config();
    config.flood.transactions = 200;
    let ledger = Arc::new(make_ledger_with(config));

    let mut handles = Vec::new();
    for node in ["Node1", "Node2", "Node3"] {
        let ledger = Arc::clone(&ledger);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                ledger
                    .issue_certificate(node, &format!("{}-{}", node, i))
                    .unwrap();
            }
        }));
    }
    {
        let ledger = Arc::clone(&ledger);
        handles.push(thread::spawn(move || {
            ledger.simulate_attack("replay").unwrap();
            ledger.simulate_attack("flood").unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(ledger.validate_chain());
    let chain = ledger.get_chain();
    for (position, block) in chain.iter().enumerate() {
        assert_eq!(block.index, position as u64 + 1);
    }
    assert_eq!(ledger.metrics().certificates_issued, 150);
}
