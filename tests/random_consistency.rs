//! Randomized consistency tests: the index must agree with a plain
//! linear scan-and-filter over the same keys, for every predicate kind,
//! across random key sets, insertion orders, and page capacities.

use rand::prelude::*;
use rand::rngs::StdRng;

use kradix::{Kmer, KmerTrie, Predicate, QKmer, RowId, TrieOptions};

const NUCLEOTIDES: &[u8] = b"ACGT";
const IUPAC: &[u8] = b"ACGTRYSWKMBDHVN";

fn random_kmer(rng: &mut StdRng, max_len: usize) -> Kmer {
    let len = rng.gen_range(0..=max_len);
    let bytes: Vec<u8> = (0..len)
        .map(|_| *NUCLEOTIDES.choose(rng).unwrap())
        .collect();
    Kmer::new(&bytes).unwrap()
}

fn random_pattern(rng: &mut StdRng, len: usize) -> QKmer {
    let bytes: Vec<u8> = (0..len).map(|_| *IUPAC.choose(rng).unwrap()).collect();
    QKmer::new(&bytes).unwrap()
}

fn build_trie(keys: &[Kmer], page_capacity: usize) -> KmerTrie {
    let mut trie = KmerTrie::with_options(TrieOptions { page_capacity }).unwrap();
    for (i, key) in keys.iter().enumerate() {
        trie.insert(key, i as RowId).unwrap();
    }
    trie
}

/// Multiset of (key, row) pairs from an index scan.
fn indexed_hits(trie: &KmerTrie, pred: &Predicate) -> Vec<(String, RowId)> {
    let mut hits: Vec<(String, RowId)> = trie
        .scan(std::slice::from_ref(pred))
        .unwrap()
        .into_iter()
        .map(|h| (h.kmer.to_string(), h.row))
        .collect();
    hits.sort();
    hits
}

/// Multiset of (key, row) pairs from a linear scan + exact filter.
fn filtered_hits(keys: &[Kmer], pred: &Predicate) -> Vec<(String, RowId)> {
    let mut hits: Vec<(String, RowId)> = keys
        .iter()
        .enumerate()
        .filter(|(_, k)| pred.matches_leaf(k.as_bytes()))
        .map(|(i, k)| (k.to_string(), i as RowId))
        .collect();
    hits.sort();
    hits
}

fn assert_agreement(trie: &KmerTrie, keys: &[Kmer], pred: &Predicate) {
    assert_eq!(
        indexed_hits(trie, pred),
        filtered_hits(keys, pred),
        "index and linear scan disagree on {}",
        pred
    );
}

#[test]
fn round_trip_every_inserted_key() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0001);
    let keys: Vec<Kmer> = (0..2_000).map(|_| random_kmer(&mut rng, 32)).collect();
    let trie = build_trie(&keys, 128);
    trie.check_invariants().unwrap();

    for (i, key) in keys.iter().enumerate() {
        let pred = Predicate::Equal(key.clone());
        let hits = indexed_hits(&trie, &pred);
        assert!(
            hits.contains(&(key.to_string(), i as RowId)),
            "lost key {} at row {}",
            key,
            i
        );
    }
}

#[test]
fn equal_queries_agree_with_linear_scan() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0002);
    // Short keys give plenty of duplicates.
    let keys: Vec<Kmer> = (0..1_500).map(|_| random_kmer(&mut rng, 6)).collect();
    let trie = build_trie(&keys, 96);
    trie.check_invariants().unwrap();

    for _ in 0..200 {
        let query = if rng.gen_bool(0.7) {
            keys.choose(&mut rng).unwrap().clone()
        } else {
            random_kmer(&mut rng, 6)
        };
        assert_agreement(&trie, &keys, &Predicate::Equal(query));
    }
}

#[test]
fn prefix_queries_agree_with_linear_scan() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0003);
    let keys: Vec<Kmer> = (0..1_500).map(|_| random_kmer(&mut rng, 12)).collect();
    let trie = build_trie(&keys, 96);
    trie.check_invariants().unwrap();

    for _ in 0..200 {
        let query = random_kmer(&mut rng, 8);
        assert_agreement(&trie, &keys, &Predicate::Prefix(query));
    }
}

#[test]
fn contains_queries_agree_with_linear_scan() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0004);
    let keys: Vec<Kmer> = (0..1_500).map(|_| random_kmer(&mut rng, 8)).collect();
    let trie = build_trie(&keys, 96);
    trie.check_invariants().unwrap();

    for _ in 0..200 {
        let len = rng.gen_range(0..=8);
        let pattern = random_pattern(&mut rng, len);
        assert_agreement(&trie, &keys, &Predicate::Contains(pattern));
    }
}

#[test]
fn insertion_order_does_not_change_results() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0005);
    let keys: Vec<Kmer> = (0..600).map(|_| random_kmer(&mut rng, 10)).collect();

    // Row ids follow the original position so reorderings are
    // comparable as multisets of (key, row).
    let mut indexed: Vec<(usize, Kmer)> = keys.iter().cloned().enumerate().collect();

    let queries: Vec<Predicate> = (0..50)
        .map(|_| match rng.gen_range(0..3) {
            0 => Predicate::Equal(random_kmer(&mut rng, 10)),
            1 => Predicate::Prefix(random_kmer(&mut rng, 5)),
            _ => {
                let len = rng.gen_range(0..=10);
                Predicate::Contains(random_pattern(&mut rng, len))
            }
        })
        .collect();

    let mut reference: Option<Vec<Vec<(String, RowId)>>> = None;
    for _ in 0..3 {
        indexed.shuffle(&mut rng);
        let mut trie = KmerTrie::with_options(TrieOptions { page_capacity: 96 }).unwrap();
        for (row, key) in &indexed {
            trie.insert(key, *row as RowId).unwrap();
        }
        trie.check_invariants().unwrap();

        let results: Vec<Vec<(String, RowId)>> =
            queries.iter().map(|p| indexed_hits(&trie, p)).collect();
        match &reference {
            None => reference = Some(results),
            Some(expected) => assert_eq!(&results, expected),
        }
    }
}

#[test]
fn large_batch_with_duplicates_and_small_pages() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0006);
    let keys: Vec<Kmer> = (0..10_000).map(|_| random_kmer(&mut rng, 32)).collect();
    let trie = build_trie(&keys, 128);
    trie.check_invariants().unwrap();
    assert_eq!(trie.len(), 10_000);

    // Spot-check agreement on a sample of predicates.
    for _ in 0..50 {
        let query = keys.choose(&mut rng).unwrap().clone();
        assert_agreement(&trie, &keys, &Predicate::Equal(query));
    }
    for _ in 0..25 {
        assert_agreement(
            &trie,
            &keys,
            &Predicate::Prefix(random_kmer(&mut rng, 4)),
        );
    }
}

#[test]
fn conjunctions_agree_with_linear_scan() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0007);
    let keys: Vec<Kmer> = (0..800).map(|_| random_kmer(&mut rng, 8)).collect();
    let trie = build_trie(&keys, 96);

    for _ in 0..100 {
        let preds = [
            Predicate::Prefix(random_kmer(&mut rng, 3)),
            {
                let len = rng.gen_range(0..=8);
                Predicate::Contains(random_pattern(&mut rng, len))
            },
        ];
        let mut indexed: Vec<(String, RowId)> = trie
            .scan(&preds)
            .unwrap()
            .into_iter()
            .map(|h| (h.kmer.to_string(), h.row))
            .collect();
        indexed.sort();

        let mut filtered: Vec<(String, RowId)> = keys
            .iter()
            .enumerate()
            .filter(|(_, k)| preds.iter().all(|p| p.matches_leaf(k.as_bytes())))
            .map(|(i, k)| (k.to_string(), i as RowId))
            .collect();
        filtered.sort();

        assert_eq!(indexed, filtered);
    }
}
