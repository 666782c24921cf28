//! Query predicates and their strategy numbers.
//!
//! Each predicate carries two checks: a pruning check against a
//! partially reconstructed key at an inner node (may only say
//! "impossible" or "still possible") and an exact check against the
//! fully reconstructed key at a leaf. The traversal core never inspects
//! the predicate kind beyond calling these two.

use std::fmt;
use std::str::FromStr;

use crate::core::alphabet::pattern_matches;
use crate::error::{KradixError, Result};
use crate::sequence::{Kmer, QKmer};

/// Strategy number of the equality predicate.
pub const STRATEGY_EQUAL: u16 = 1;
/// Strategy number of the prefix predicate.
pub const STRATEGY_PREFIX: u16 = 2;
/// Strategy number of the IUPAC containment predicate.
pub const STRATEGY_CONTAINS: u16 = 3;

/// A query predicate over indexed k-mers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The indexed key equals the literal key.
    Equal(Kmer),
    /// The indexed key starts with the literal prefix.
    Prefix(Kmer),
    /// The literal pattern contains the indexed key (equal-length
    /// overlay; every pattern position's set admits the key's byte).
    Contains(QKmer),
}

impl Predicate {
    /// Resolve an external strategy number and its query text.
    pub fn from_strategy(strategy: u16, text: &str) -> Result<Predicate> {
        match strategy {
            STRATEGY_EQUAL => Ok(Predicate::Equal(Kmer::from_str(text)?)),
            STRATEGY_PREFIX => Ok(Predicate::Prefix(Kmer::from_str(text)?)),
            STRATEGY_CONTAINS => Ok(Predicate::Contains(QKmer::from_str(text)?)),
            other => Err(KradixError::UnsupportedStrategy(other)),
        }
    }

    /// The strategy number this predicate answers to.
    pub fn strategy(&self) -> u16 {
        match self {
            Predicate::Equal(_) => STRATEGY_EQUAL,
            Predicate::Prefix(_) => STRATEGY_PREFIX,
            Predicate::Contains(_) => STRATEGY_CONTAINS,
        }
    }

    /// Can some completion of `partial` still satisfy this predicate?
    ///
    /// `partial` is the key decoded so far along a descent; the true
    /// indexed keys below extend it by zero or more bytes.
    pub fn matches_partial(&self, partial: &[u8]) -> bool {
        match self {
            Predicate::Equal(q) => {
                let q = q.as_bytes();
                partial.len() <= q.len() && &q[..partial.len()] == partial
            }
            Predicate::Prefix(q) => {
                let q = q.as_bytes();
                let n = partial.len().min(q.len());
                partial[..n] == q[..n]
            }
            Predicate::Contains(p) => {
                // The residual can only lengthen the key, so a partial
                // already longer than the pattern can never match.
                let p = p.as_bytes();
                partial.len() <= p.len()
                    && partial
                        .iter()
                        .zip(p)
                        .all(|(&k, &pb)| pattern_matches(pb, k))
            }
        }
    }

    /// Exact verdict for a fully reconstructed key.
    pub fn matches_leaf(&self, full: &[u8]) -> bool {
        match self {
            Predicate::Equal(q) => full == q.as_bytes(),
            Predicate::Prefix(q) => {
                let q = q.as_bytes();
                full.len() >= q.len() && &full[..q.len()] == q
            }
            Predicate::Contains(p) => {
                let p = p.as_bytes();
                full.len() == p.len()
                    && full.iter().zip(p).all(|(&k, &pb)| pattern_matches(pb, k))
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equal(q) => write!(f, "equal({})", q),
            Predicate::Prefix(q) => write!(f, "prefix({})", q),
            Predicate::Contains(p) => write!(f, "contains({})", p),
        }
    }
}
