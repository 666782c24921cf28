//! DNA sequence types: `DnaSequence`, `Kmer`, and `QKmer`.
//!
//! All three validate their alphabet on construction and store bytes in
//! upper-case canonical form. `Kmer` and `QKmer` are capped at 32
//! nucleotides; `DnaSequence` is unbounded and can be sliced into k-mer
//! windows for indexing.

use std::fmt;
use std::str::FromStr;

use crate::constants::{MAX_KMER_LEN, MAX_QKMER_LEN};
use crate::core::alphabet::{is_iupac, is_nucleotide, pattern_matches};
use crate::error::{KradixError, Result};

/// A DNA string over {A,C,G,T} of length 0–32, upper-case canonical.
///
/// Ordering is byte-wise lexicographic; identity is structural.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kmer {
    bytes: Vec<u8>,
}

impl Kmer {
    /// Validate and upper-case a k-mer.
    pub fn new(text: &[u8]) -> Result<Self> {
        if text.len() > MAX_KMER_LEN {
            return Err(KradixError::KeyTooLong(text.len()));
        }
        let mut bytes = Vec::with_capacity(text.len());
        for &c in text {
            if !is_nucleotide(c) {
                return Err(KradixError::InvalidNucleotide(c));
            }
            bytes.push(c.to_ascii_uppercase());
        }
        Ok(Kmer { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Watson-Crick reverse complement.
    pub fn reverse_complement(&self) -> Kmer {
        let bytes = self
            .bytes
            .iter()
            .rev()
            .map(|&c| match c {
                b'A' => b'T',
                b'T' => b'A',
                b'C' => b'G',
                _ => b'C',
            })
            .collect();
        Kmer { bytes }
    }

    /// The lexicographically smaller of this k-mer and its reverse
    /// complement, so both strands index to one representative.
    pub fn canonical(&self) -> Kmer {
        let rc = self.reverse_complement();
        if rc.bytes < self.bytes {
            rc
        } else {
            self.clone()
        }
    }
}

impl fmt::Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Construction guarantees ASCII.
        f.write_str(std::str::from_utf8(&self.bytes).expect("kmer is ASCII"))
    }
}

impl FromStr for Kmer {
    type Err = KradixError;

    fn from_str(s: &str) -> Result<Self> {
        Kmer::new(s.as_bytes())
    }
}

/// An ambiguity pattern over the 15-letter IUPAC alphabet, length 0–32.
///
/// A pattern contains a k-mer when both have the same length and every
/// pattern position's allowed set includes the k-mer's nucleotide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QKmer {
    bytes: Vec<u8>,
}

impl QKmer {
    /// Validate and upper-case a pattern.
    pub fn new(text: &[u8]) -> Result<Self> {
        if text.len() > MAX_QKMER_LEN {
            return Err(KradixError::KeyTooLong(text.len()));
        }
        let mut bytes = Vec::with_capacity(text.len());
        for &c in text {
            if !is_iupac(c) {
                return Err(KradixError::InvalidIupac(c));
            }
            bytes.push(c.to_ascii_uppercase());
        }
        Ok(QKmer { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Equal-length overlay containment.
    pub fn contains(&self, kmer: &Kmer) -> bool {
        self.bytes.len() == kmer.len()
            && self
                .bytes
                .iter()
                .zip(kmer.as_bytes())
                .all(|(&p, &k)| pattern_matches(p, k))
    }
}

impl fmt::Display for QKmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(std::str::from_utf8(&self.bytes).expect("qkmer is ASCII"))
    }
}

impl FromStr for QKmer {
    type Err = KradixError;

    fn from_str(s: &str) -> Result<Self> {
        QKmer::new(s.as_bytes())
    }
}

/// An unbounded DNA string over {A,C,G,T}, upper-case canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnaSequence {
    bytes: Vec<u8>,
}

impl DnaSequence {
    pub fn new(text: &[u8]) -> Result<Self> {
        let mut bytes = Vec::with_capacity(text.len());
        for &c in text {
            if !is_nucleotide(c) {
                return Err(KradixError::InvalidNucleotide(c));
            }
            bytes.push(c.to_ascii_uppercase());
        }
        Ok(DnaSequence { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterator over every length-`k` window as a `Kmer`.
    ///
    /// Empty when `k` is zero, over the 32-nt k-mer cap, or longer than
    /// the sequence.
    pub fn kmers(&self, k: usize) -> Kmers<'_> {
        let valid = k > 0 && k <= MAX_KMER_LEN && k <= self.bytes.len();
        Kmers {
            seq: &self.bytes,
            k,
            pos: 0,
            end: if valid { self.bytes.len() - k + 1 } else { 0 },
        }
    }
}

impl fmt::Display for DnaSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(std::str::from_utf8(&self.bytes).expect("sequence is ASCII"))
    }
}

impl FromStr for DnaSequence {
    type Err = KradixError;

    fn from_str(s: &str) -> Result<Self> {
        DnaSequence::new(s.as_bytes())
    }
}

/// Sliding-window k-mer iterator over a `DnaSequence`.
pub struct Kmers<'a> {
    seq: &'a [u8],
    k: usize,
    pos: usize,
    end: usize,
}

impl Iterator for Kmers<'_> {
    type Item = Kmer;

    fn next(&mut self) -> Option<Kmer> {
        if self.pos >= self.end {
            return None;
        }
        // The parent sequence is already validated and upper-cased.
        let window = &self.seq[self.pos..self.pos + self.k];
        self.pos += 1;
        Some(Kmer {
            bytes: window.to_vec(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}
