//! kradix: a radix-trie index for DNA k-mers.
//!
//! The index partitions keys by shared prefixes and single discriminator
//! bytes, keeping every inner node on one storage page, and answers
//! three query predicates: exact equality, prefix match, and IUPAC
//! ambiguity-pattern containment. Pattern matching is a per-position
//! bitwise intersection of 4-bit nucleotide sets, so pruning a subtree
//! costs one AND per decoded byte.
//!
//! The building blocks are layered bottom-up:
//! - [`core`]: the alphabet codec and the key buffer
//! - [`sequence`]: validated `Kmer` / `QKmer` / `DnaSequence` types
//! - [`trie`]: node model, page layout, insertion and search engines,
//!   predicates, and the [`KmerTrie`] driver with persistence
//!
//! ```
//! use kradix::{KmerTrie, Predicate, STRATEGY_PREFIX};
//!
//! let mut trie = KmerTrie::new();
//! trie.insert(&"ACGT".parse().unwrap(), 1).unwrap();
//! trie.insert(&"ACGTA".parse().unwrap(), 2).unwrap();
//!
//! let pred = Predicate::from_strategy(STRATEGY_PREFIX, "ACG").unwrap();
//! let hits = trie.scan(&[pred]).unwrap();
//! assert_eq!(hits.len(), 2);
//! ```

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod logging;
pub mod sequence;
pub mod trie;

// Re-export the primary API at the crate root.
pub use crate::core::{common_prefix_len, iupac_bits, nuc_bits, pattern_matches, KeyBuf};
pub use error::{KradixError, Result};
pub use sequence::{DnaSequence, Kmer, QKmer};
pub use trie::{
    KmerTrie, Predicate, RowId, ScanHit, TrieLayout, TrieOptions, TrieStats, STRATEGY_CONTAINS,
    STRATEGY_EQUAL, STRATEGY_PREFIX,
};
