//! On-disk round-trips and header validation for the index file format.

use std::fs;

use kradix::{
    Kmer, KmerTrie, KradixError, Predicate, RowId, TrieOptions, STRATEGY_EQUAL, STRATEGY_PREFIX,
};

fn kmer(text: &str) -> Kmer {
    text.parse().unwrap()
}

fn pred(strategy: u16, text: &str) -> Predicate {
    Predicate::from_strategy(strategy, text).unwrap()
}

fn sample_trie() -> KmerTrie {
    let mut trie = KmerTrie::with_options(TrieOptions { page_capacity: 96 }).unwrap();
    let keys = [
        "ACGT", "ACGA", "ACGTACGT", "TTTT", "T", "", "ACGT", "CCCCCCCC",
    ];
    for (i, k) in keys.iter().enumerate() {
        trie.insert(&kmer(k), i as RowId).unwrap();
    }
    trie
}

#[test]
fn save_load_round_trip_preserves_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.krdx");

    let trie = sample_trie();
    trie.save(&path).unwrap();

    let loaded = KmerTrie::load(&path).unwrap();
    loaded.check_invariants().unwrap();
    assert_eq!(loaded.len(), trie.len());
    assert_eq!(loaded.page_count(), trie.page_count());
    assert_eq!(
        loaded.options().page_capacity,
        trie.options().page_capacity
    );

    for p in [
        pred(STRATEGY_EQUAL, "ACGT"),
        pred(STRATEGY_EQUAL, ""),
        pred(STRATEGY_PREFIX, "ACG"),
        pred(STRATEGY_PREFIX, "C"),
    ] {
        let mut before: Vec<(String, RowId)> = trie
            .scan(std::slice::from_ref(&p))
            .unwrap()
            .into_iter()
            .map(|h| (h.kmer.to_string(), h.row))
            .collect();
        let mut after: Vec<(String, RowId)> = loaded
            .scan(std::slice::from_ref(&p))
            .unwrap()
            .into_iter()
            .map(|h| (h.kmer.to_string(), h.row))
            .collect();
        before.sort();
        after.sort();
        assert_eq!(before, after, "{}", p);
    }
}

#[test]
fn save_load_empty_trie() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.krdx");

    KmerTrie::new().save(&path).unwrap();
    let loaded = KmerTrie::load(&path).unwrap();
    assert!(loaded.is_empty());
    assert!(loaded.scan(&[]).unwrap().is_empty());
}

#[test]
fn load_rejects_bad_magic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.krdx");
    fs::write(&path, b"NOPE\x01\x00\x00\x00").unwrap();

    match KmerTrie::load(&path) {
        Err(KradixError::Format { detail, .. }) => {
            assert!(detail.contains("magic"), "{}", detail)
        }
        other => panic!("Expected Format error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn load_rejects_wrong_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("versioned.krdx");

    let trie = sample_trie();
    trie.save(&path).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[4..8].copy_from_slice(&999u32.to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    let err = KmerTrie::load(&path).unwrap_err();
    assert!(
        err.to_string().contains("unsupported index version"),
        "{}",
        err
    );
}

#[test]
fn load_rejects_truncated_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truncated.krdx");

    sample_trie().save(&path).unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    assert!(KmerTrie::load(&path).is_err());
}

#[test]
fn load_rejects_trailing_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trailing.krdx");

    sample_trie().save(&path).unwrap();
    let mut bytes = fs::read(&path).unwrap();
    bytes.extend_from_slice(b"junk");
    fs::write(&path, &bytes).unwrap();

    match KmerTrie::load(&path) {
        Err(KradixError::Format { detail, .. }) => {
            assert!(detail.contains("trailing"), "{}", detail)
        }
        other => panic!("Expected Format error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn load_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.krdx");
    match KmerTrie::load(&path) {
        Err(KradixError::Io { operation, .. }) => assert_eq!(operation, "open"),
        other => panic!("Expected Io error, got {:?}", other.map(|_| ())),
    }
}
