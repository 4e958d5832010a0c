use std::collections::BTreeSet;

use proptest::collection::vec;
use proptest::prelude::any;
use proptest::proptest;
use sourmash_relay::encodings::HashFunctions;
use sourmash_relay::signature::SeqToHashes;
use sourmash_relay::sketch::minhash::{max_hash_for_scaled, KmerMinHash};

#[test]
fn throws_error() {
    let mut mh = KmerMinHash::new(0, 4, HashFunctions::murmur64_DNA, 42, 1);

    assert!(
        mh.add_sequence(b"ATGR", false).is_err(),
        "R is not a valid DNA character"
    );
}

#[test]
fn reference_hashes() {
    // same values sourmash produces for these sequences at k=10
    let mut mh = KmerMinHash::new(0, 10, HashFunctions::murmur64_DNA, 42, 20);

    mh.add_sequence(b"TGCCGCCCAGCA", false).unwrap();
    mh.add_sequence(b"GTCCGCCCAGTGA", false).unwrap();
    mh.add_sequence(b"GTCCGCCCAGTGG", false).unwrap();

    assert_eq!(
        mh.mins(),
        vec![
            2996412506971915891,
            4448613756639084635,
            8373222269469409550,
            9390240264282449587,
            11085758717695534616,
            11668188995231815419,
            11760449009842383350,
            14682565545778736889,
        ]
    );
}

#[test]
fn invalid_dna() {
    let mut a = KmerMinHash::new(0, 3, HashFunctions::murmur64_DNA, 42, 20);

    a.add_sequence(b"AAANNCCCTN", true).unwrap();
    assert_eq!(a.mins().len(), 3);

    let mut b = KmerMinHash::new(0, 3, HashFunctions::murmur64_DNA, 42, 20);
    assert!(b.add_sequence(b"NAAA", false).is_err());
}

#[test]
fn seq_to_hashes_matches_add_sequence() {
    let seq = b"TGCCGCCCAGCACCGGGTGACTAGGTTGAGCCATGATTAACCTGCAATGA";

    let mut mh = KmerMinHash::new(1, 21, HashFunctions::murmur64_DNA, 42, 0);
    mh.add_sequence(seq, false).unwrap();

    let hashes: BTreeSet<u64> = SeqToHashes::new(seq, 21, false, 42)
        .map(|h| h.unwrap())
        .collect();

    assert_eq!(mh.mins(), hashes.into_iter().collect::<Vec<_>>());
}

#[test]
fn seed_changes_hashes() {
    let seq = b"TGCCGCCCAGCACCGGGTGACTAGG";
    let a: Vec<_> = SeqToHashes::new(seq, 21, false, 42)
        .map(|h| h.unwrap())
        .collect();
    let b: Vec<_> = SeqToHashes::new(seq, 21, false, 43)
        .map(|h| h.unwrap())
        .collect();
    assert_eq!(a.len(), b.len());
    assert_ne!(a, b);
}

proptest! {
#[test]
fn oracle_mins_scaled(hashes in vec(any::<u64>(), 1..10000)) {
    let scaled = 100;
    let max_hash = max_hash_for_scaled(scaled);
    let mut a = KmerMinHash::new(scaled, 21, HashFunctions::murmur64_DNA, 42, 0);

    for hash in &hashes {
        a.add_hash(*hash);
    }

    let expected: BTreeSet<u64> = hashes.iter().cloned().filter(|h| *h <= max_hash).collect();
    assert_eq!(a.mins(), expected.into_iter().collect::<Vec<_>>());
}
}

proptest! {
#[test]
fn oracle_mins_num(hashes in vec(any::<u64>(), 1..5000)) {
    let mut a = KmerMinHash::new(0, 21, HashFunctions::murmur64_DNA, 42, 100);

    for hash in &hashes {
        a.add_hash(*hash);
    }

    let expected: Vec<u64> = hashes
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(100)
        .collect();
    assert_eq!(a.mins(), expected);
}
}

proptest! {
#[test]
fn serde_sorts_mins(mut hashes in vec(any::<u64>(), 0..100)) {
    hashes.dedup();
    let json = serde_json::json!({
        "num": 0,
        "ksize": 21,
        "seed": 42,
        "max_hash": u64::MAX,
        "mins": hashes.clone(),
        "md5sum": "",
        "molecule": "DNA",
    });

    let mh: KmerMinHash = serde_json::from_value(json).unwrap();
    let mut sorted = hashes.clone();
    sorted.sort_unstable();
    assert_eq!(mh.mins(), sorted);
}
}
