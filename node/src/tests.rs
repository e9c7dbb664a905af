use super::*;
use crate::{engine::Node, mempool::SubmitError};
use commonware_codec::{DecodeExt, Encode};
use commonware_cryptography::{ed25519::PrivateKey, Digestible, Signer};
use commonware_runtime::{deterministic, Metrics, Runner};
use quorate_consensus::{template, Acceptance};
use quorate_types::{
    transaction::COIN, Challenge, Input, Output, Transaction, COMMITMENT_PREFIX_LENGTH,
};

#[test]
fn config_redacted_debug_does_not_leak_secrets() {
    let private_key = HexBytes::from_hex_formatted("deadbeef").expect("valid hex");
    let config = Config {
        private_key,
        signers: vec!["aabbcc".to_string()],
        threshold: 1,
        log_level: "info".to_string(),
        mempool_max_transactions: 100_000,
    };

    let rendered = format!("{:?}", config.redacted_debug());
    assert!(
        !rendered.contains("deadbeef"),
        "secret leaked in debug output"
    );
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn config_validation() {
    let signers: Vec<PrivateKey> = (0..2).map(PrivateKey::from_seed).collect();
    let signer_hex: Vec<String> = signers
        .iter()
        .map(|signer| commonware_utils::hex(&signer.public_key().encode()))
        .collect();

    let config = Config {
        private_key: HexBytes::from_hex_formatted(&commonware_utils::hex(&signers[0].encode()))
            .expect("valid hex"),
        signers: signer_hex.clone(),
        threshold: 1,
        log_level: "debug".to_string(),
        mempool_max_transactions: 10,
    };
    let validated = config.validate().expect("valid config");
    assert_eq!(validated.public_key, signers[0].public_key());
    assert_eq!(validated.challenge.threshold(), 1);
    assert_eq!(validated.challenge.signers().len(), 2);

    // Threshold above the signer count is rejected.
    let config = Config {
        private_key: HexBytes::from_hex_formatted(&commonware_utils::hex(&signers[0].encode()))
            .expect("valid hex"),
        signers: signer_hex,
        threshold: 3,
        log_level: "info".to_string(),
        mempool_max_transactions: 10,
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidThreshold {
            threshold: 3,
            signers: 2
        })
    ));
}

#[test]
fn config_load_round_trip() {
    let signer = PrivateKey::from_seed(0);
    let config = Config {
        private_key: HexBytes::from_hex_formatted(&commonware_utils::hex(&signer.encode()))
            .expect("valid hex"),
        signers: vec![commonware_utils::hex(&signer.public_key().encode())],
        threshold: 1,
        log_level: "info".to_string(),
        mempool_max_transactions: 1_000,
    };

    let path = std::env::temp_dir().join("quorate-config-load-round-trip.yaml");
    std::fs::write(&path, serde_yaml::to_string(&config).expect("serialize")).expect("write");
    let loaded = Config::load(&path).expect("load");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.private_key.as_ref(), config.private_key.as_ref());
    assert_eq!(loaded.signers, config.signers);
    assert_eq!(loaded.threshold, 1);
    let validated = loaded.validate().expect("valid config");
    assert_eq!(validated.public_key, signer.public_key());

    assert!(matches!(
        Config::load(std::env::temp_dir().join("quorate-missing.yaml")),
        Err(ConfigError::Io { .. })
    ));
}

/// The federation scenario: single-chain growth to height 2, partition,
/// independent authorization of the same height-3 template on both sides,
/// reconnection with zero reorg, then a spend of the shared coinbase relayed
/// across the federation and deduplicated by txid.
#[test]
fn test_partition_convergence_without_reorg() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let runner = deterministic::Runner::default();
    runner.start(|ctx| async move {
        // 1-of-2 challenge: either signer alone authorizes a block.
        let signers: Vec<PrivateKey> = (0..2).map(PrivateKey::from_seed).collect();
        let challenge = Challenge::new(signers.iter().map(|s| s.public_key()).collect(), 1);

        let mut node_a = Node::new(ctx.with_label("node_a"), challenge.clone(), 1_000);
        let mut node_b = Node::new(ctx.with_label("node_b"), challenge, 1_000);
        node_a.connect(signers[1].public_key());
        node_b.connect(signers[0].public_key());

        // Initial state.
        assert_eq!(node_a.height(), 0);
        assert_eq!(node_b.height(), 0);
        assert_eq!(node_a.tip(), node_b.tip());

        // Blocks 1 and 2: authored and signed at node A, propagated to B.
        for expected in 1..=2 {
            let template = node_a.build_template(b"reward".to_vec());
            let signed = template::solve(&template, &signers[0]);
            assert_eq!(
                node_a.propagate(signed.clone()).expect("accepted at A"),
                Acceptance::Extended
            );
            assert_eq!(
                node_b.propagate(signed).expect("accepted at B"),
                Acceptance::Extended
            );
            assert_eq!(node_a.height(), expected);
            assert_eq!(node_b.height(), expected);
            assert_eq!(node_a.tip(), node_b.tip());
        }

        // Partition at height 2.
        node_a.disconnect(&signers[1].public_key());
        node_b.disconnect(&signers[0].public_key());

        // Both sides hold the same state, so they derive byte-identical
        // height-3 templates.
        let template3 = node_a.build_template(b"reward".to_vec());
        assert_eq!(
            template3.encode(),
            node_b.build_template(b"reward".to_vec()).encode()
        );

        // Each side authorizes the template with its own signer.
        let signed_a = template::solve(&template3, &signers[0]);
        let signed_b = template::solve(&template3, &signers[1]);
        assert_eq!(
            node_a.propagate(signed_a.clone()).expect("accepted at A"),
            Acceptance::Extended
        );
        assert_eq!(
            node_b.propagate(signed_b.clone()).expect("accepted at B"),
            Acceptance::Extended
        );

        // Same height, same tip digest, different raw block bytes.
        assert_eq!(node_a.height(), 3);
        assert_eq!(node_b.height(), 3);
        let tip_before_reconnect = node_a.tip();
        assert_eq!(node_b.tip(), tip_before_reconnect);
        assert_ne!(signed_a.encode(), signed_b.encode());

        // The coinbases share a txid but not bytes.
        let coinbase_txid = signed_a.transactions[0].digest();
        assert_eq!(signed_b.transactions[0].digest(), coinbase_txid);
        let raw_a = node_a.raw_transaction(&coinbase_txid).expect("stored at A");
        let raw_b = node_b.raw_transaction(&coinbase_txid).expect("stored at B");
        assert_ne!(raw_a, raw_b);

        // Stripping the signer solution (commitment script bytes past offset
        // 38) makes the stored coinbases byte-identical.
        let mut stripped_a = Transaction::decode(raw_a.as_slice()).expect("decode A coinbase");
        let mut stripped_b = Transaction::decode(raw_b.as_slice()).expect("decode B coinbase");
        stripped_a.outputs[1].script.truncate(COMMITMENT_PREFIX_LENGTH);
        stripped_b.outputs[1].script.truncate(COMMITMENT_PREFIX_LENGTH);
        assert_eq!(stripped_a.encode(), stripped_b.encode());

        // Reconnect and reconcile in both directions.
        node_a.connect(signers[1].public_key());
        node_b.connect(signers[0].public_key());
        let summary_a = node_a.reconcile(node_b.blocks_since(2));
        let summary_b = node_b.reconcile(node_a.blocks_since(2));
        assert_eq!(summary_a.adopted, 0);
        assert_eq!(summary_a.duplicates, 1);
        assert_eq!(summary_b.adopted, 0);
        assert_eq!(summary_b.duplicates, 1);

        // No reorg: both tips are exactly what they were under partition.
        assert_eq!(node_a.tip(), tip_before_reconnect);
        assert_eq!(node_b.tip(), tip_before_reconnect);

        // Each node kept the coinbase bytes it accepted first.
        assert_eq!(
            node_a.raw_transaction(&coinbase_txid).expect("stored at A"),
            raw_a
        );
        assert_eq!(
            node_b.raw_transaction(&coinbase_txid).expect("stored at B"),
            raw_b
        );

        // Block 4: authored at A, propagated to B; the chains stay in sync
        // even though each side kept its own height-3 coinbase bytes.
        let template4 = node_a.build_template(b"reward".to_vec());
        let signed4 = template::solve(&template4, &signers[0]);
        node_a.propagate(signed4.clone()).expect("accepted at A");
        node_b.propagate(signed4).expect("accepted at B");
        assert_eq!(node_a.height(), 4);
        assert_eq!(node_b.height(), 4);
        assert_eq!(node_a.tip(), node_b.tip());
        assert_eq!(
            node_a.raw_transaction(&coinbase_txid).expect("stored at A"),
            raw_a
        );
        assert_eq!(
            node_b.raw_transaction(&coinbase_txid).expect("stored at B"),
            raw_b
        );

        // Spend the shared coinbase. Submitted at A, relayed to B, accepted
        // once on each side.
        let wallet = PrivateKey::from_seed(42);
        let spend = Transaction::sign(
            &wallet,
            vec![Input {
                source: coinbase_txid,
                index: 0,
            }],
            vec![Output {
                value: 99 * COIN,
                script: b"destination".to_vec(),
            }],
        );
        let txid = node_a.relay(spend.clone()).expect("accepted at A");
        assert_eq!(txid, spend.digest());
        node_b.relay(spend.clone()).expect("accepted at B");

        // A duplicate submission at B is rejected by txid and must not change
        // mempool state.
        let mempool_size = node_b.mempool_size();
        assert_eq!(
            node_b.relay(spend.clone()),
            Err(SubmitError::AlreadyInMempool)
        );
        assert_eq!(node_b.mempool_size(), mempool_size);

        // Even a witness variant of the spend is the same transaction; B's
        // stored bytes stay what it accepted first.
        let mut variant = spend.clone();
        variant.witness[0] ^= 0xff;
        assert_eq!(variant.digest(), txid);
        assert_eq!(
            node_b.relay(variant),
            Err(SubmitError::AlreadyInMempool)
        );
        assert_eq!(node_b.mempool_size(), mempool_size);
        assert_eq!(
            node_b.raw_transaction(&txid).expect("stored at B"),
            spend.encode().to_vec()
        );
    });
}
