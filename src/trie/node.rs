//! Trie node model: child labels, inner nodes, and leaf tuples.
//!
//! An inner node partitions the keys below it by the byte that follows
//! its common prefix. Two sentinel labels exist besides plain bytes: the
//! terminator marks keys that end exactly at the prefix, and the
//! all-the-same marker is reserved for splits of nodes whose children
//! are indistinguishable. Keeping the sentinels as enum variants (rather
//! than negative integers) makes the label ordering and the sort
//! invariant checkable at the type level; the signed 16-bit form exists
//! only in the page layout.

use crate::core::key::KeyBuf;
use crate::error::{KradixError, Result};
use crate::trie::store::PageId;

/// A child-slot label.
///
/// The derived ordering is the page ordering: `AllTheSame` (−2) sorts
/// before `Terminator` (−1), which sorts before every byte label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeLabel {
    /// Reserved marker used when splitting a node whose child slots all
    /// carry identical downlinks.
    AllTheSame,
    /// The indexed key terminates at this node's prefix.
    Terminator,
    /// The next key byte after the node's prefix.
    Byte(u8),
}

impl NodeLabel {
    /// Signed 16-bit page encoding.
    pub fn to_i16(self) -> i16 {
        match self {
            NodeLabel::AllTheSame => -2,
            NodeLabel::Terminator => -1,
            NodeLabel::Byte(b) => b as i16,
        }
    }

    /// Decode the page encoding; anything outside −2..=255 is corrupt.
    pub fn from_i16(raw: i16) -> Result<Self> {
        match raw {
            -2 => Ok(NodeLabel::AllTheSame),
            -1 => Ok(NodeLabel::Terminator),
            0..=255 => Ok(NodeLabel::Byte(raw as u8)),
            _ => Err(KradixError::corrupt(format!(
                "node label {} outside the legal range -2..=255",
                raw
            ))),
        }
    }

    /// The key byte this label consumes, if any. Sentinels consume none.
    pub fn consumed_byte(self) -> Option<u8> {
        match self {
            NodeLabel::Byte(b) => Some(b),
            _ => None,
        }
    }
}

/// Opaque row reference supplied by the caller alongside each key.
pub type RowId = u64;

/// One labeled downlink of an inner node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSlot {
    pub label: NodeLabel,
    pub downlink: PageId,
}

/// An inner trie node: optional common prefix plus sorted child slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerNode {
    prefix: KeyBuf,
    children: Vec<ChildSlot>,
    all_the_same: bool,
}

impl InnerNode {
    /// Build an inner node, enforcing the label-sort invariant: labels
    /// strictly ascending (hence unique, with at most one of each
    /// sentinel) and at least one child slot.
    pub fn new(prefix: KeyBuf, children: Vec<ChildSlot>, all_the_same: bool) -> Result<Self> {
        if children.is_empty() {
            return Err(KradixError::invariant("inner node with no child slots"));
        }
        for pair in children.windows(2) {
            if pair[0].label >= pair[1].label {
                return Err(KradixError::invariant(format!(
                    "labels out of order: {:?} before {:?}",
                    pair[0].label, pair[1].label
                )));
            }
        }
        Ok(InnerNode {
            prefix,
            children,
            all_the_same,
        })
    }

    pub fn prefix(&self) -> &KeyBuf {
        &self.prefix
    }

    pub fn children(&self) -> &[ChildSlot] {
        &self.children
    }

    pub fn all_the_same(&self) -> bool {
        self.all_the_same
    }

    /// Binary-search the sorted label array.
    pub fn find_label(&self, label: NodeLabel) -> Option<usize> {
        self.children
            .binary_search_by(|slot| slot.label.cmp(&label))
            .ok()
    }

    /// Insertion index that keeps the label array sorted.
    pub fn insert_position(&self, label: NodeLabel) -> usize {
        match self.children.binary_search_by(|slot| slot.label.cmp(&label)) {
            Ok(i) | Err(i) => i,
        }
    }

    /// Add a slot at `position`, which must be the sorted insertion
    /// point for its label.
    pub fn insert_slot(&mut self, position: usize, slot: ChildSlot) -> Result<()> {
        let fits_left = position == 0 || self.children[position - 1].label < slot.label;
        let fits_right =
            position == self.children.len() || slot.label < self.children[position].label;
        if !fits_left || !fits_right {
            return Err(KradixError::invariant(format!(
                "slot {:?} inserted at position {} breaks label order",
                slot.label, position
            )));
        }
        self.children.insert(position, slot);
        Ok(())
    }
}

/// One indexed key's remainder at a leaf, plus its row reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafTuple {
    pub residual: KeyBuf,
    pub row: RowId,
}
