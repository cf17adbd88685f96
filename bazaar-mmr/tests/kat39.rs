//! Known-answer tests over the canonical 39-node mountain range
//!
//! The fixture commits 21 leaves, where leaf `e` is `SHA-256(uint64_be(e))`,
//! producing every tree shape up to height 4.

use bazaar_crypto::hash::{Hash, Hasher};
use bazaar_mmr::*;

fn leaf(e: u64) -> Hash<32> {
    Hasher::<256>::hash(&e.to_be_bytes())
}

fn kat39() -> Mmr {
    let mut mmr = Mmr::new();
    for e in 0..21 {
        mmr.push_leaf(leaf(e));
    }
    mmr
}

#[test]
fn known_node_values() {
    let mmr = kat39();
    assert_eq!(mmr.size(), 39);

    let expected = [
        (0, "af5570f5a1810b7af78caf4bc70a660f0df51e42baf91d4de5b2328de0e83dfc"),
        (2, "ad104051c516812ea5874ca3ff06d0258303623d04307c41ec80a7a18b332ef8"),
        (6, "455a53a8540137855742f7326d0fbfb37f77231cf14a3d0e32e7aba29be0c383"),
        (14, "5aa15ba1fa7c2def680835f90dfc60adb26770d77e49b916d137f796fbc2792f"),
        (30, "d380b39b72063c7778a32e57d756a4666af1b093a6263387d9577038eb06dfcf"),
        (38, "22a264ee63bc826a6df778800a62ca8f7033d50f14c7c738ece23b505f2bf3c4"),
    ];

    for (index, hex) in expected {
        assert_eq!(mmr.node(index).unwrap().to_string(), hex, "node {index}");
    }
}

#[test]
fn known_accumulator() {
    let mmr = kat39();

    assert_eq!(peaks(38), vec![30, 37, 38]);
    assert_eq!(leaf_count(38), 21);

    let accumulator = mmr.accumulator();
    assert_eq!(
        accumulator.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
        vec![
            "d380b39b72063c7778a32e57d756a4666af1b093a6263387d9577038eb06dfcf",
            "bbe6d1ade9b5a8a6d286ce30f03a777f0fa32e03fff6f8ce53a305c0d17d26cb",
            "22a264ee63bc826a6df778800a62ca8f7033d50f14c7c738ece23b505f2bf3c4",
        ]
    );
}

#[test]
fn every_node_verifies_in_every_complete_state() {
    let mmr = kat39();

    for size in 1..=mmr.size() {
        if !is_complete(size) {
            continue;
        }

        let accumulator = mmr.accumulator_at(size).unwrap();

        for i in 0..size {
            let path = mmr.inclusion_proof(i, size).unwrap();
            let node = mmr.node(i).unwrap();

            let root = included_root(i, &node, &path);
            assert!(
                accumulator.contains(&root),
                "no peak for node {i} at size {size}"
            );

            let (ok, consumed) = verify_inclusion_path(i, &node, &path, &root);
            assert!(ok, "node {i} at size {size}");
            assert_eq!(consumed, path.len());
        }
    }
}

#[test]
fn leaf_proofs_land_on_the_predicted_peak() {
    let mmr = kat39();
    let size = mmr.size();
    let accumulator = mmr.accumulator();
    let leaves = leaf_count(size - 1);

    for e in 0..leaves {
        let i = mmr_index(e);
        let path = mmr.inclusion_proof(i, size).unwrap();

        // a leaf path of length g proves the accumulator peak of height g
        let peak = accumulator_index(leaves, path.len() as u64) as usize;
        let root = included_root(i, &mmr.node(i).unwrap(), &path);
        assert_eq!(root, accumulator[peak], "leaf {e}");
    }
}

#[test]
fn consistency_between_all_complete_states() {
    let mmr = kat39();

    let complete: Vec<u64> = (1..=mmr.size()).filter(|s| is_complete(*s)).collect();

    for &from in &complete {
        for &to in &complete {
            if from > to {
                continue;
            }

            let proofs = mmr.consistency_proof(from, to).unwrap();
            let accumulator_from = mmr.accumulator_at(from).unwrap();
            let accumulator_to = mmr.accumulator_at(to).unwrap();

            let ok = verify_consistent_roots(
                from - 1,
                &accumulator_from,
                &accumulator_to,
                &proofs,
            )
            .unwrap();
            assert!(ok, "mmr({from}) -> mmr({to})");
        }
    }
}

#[test]
fn tampered_history_fails_consistency() {
    let mmr = kat39();

    let mut forged = Mmr::new();
    for e in 0..21 {
        // same shape, different third leaf
        forged.push_leaf(if e == 2 { leaf(999) } else { leaf(e) });
    }

    let from = 7;
    let to = 39;
    let proofs = forged.consistency_proof(from, to).unwrap();
    let accumulator_from = mmr.accumulator_at(from).unwrap();
    let accumulator_to = forged.accumulator_at(to).unwrap();

    let ok = verify_consistent_roots(from - 1, &accumulator_from, &accumulator_to, &proofs).unwrap();
    assert!(!ok);
}

#[test]
fn proof_count_must_match_peak_count() {
    let mmr = kat39();
    let accumulator = mmr.accumulator_at(7).unwrap();

    let result = consistent_roots(6, &accumulator, &[]);
    assert_eq!(
        result,
        Err(Error::PeakCountMismatch {
            peaks: 1,
            provided: 0
        })
    );
}
