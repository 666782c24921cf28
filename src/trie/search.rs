//! Search engine: subtree pruning at inner nodes and exact checks at
//! leaves.
//!
//! The reconstruction buffer is an append-only value passed down the
//! traversal; every surviving child slot gets its own copy extended by
//! the node's prefix and the slot's label byte. Backtracking therefore
//! never has to undo anything.

use crate::core::key::KeyBuf;
use crate::trie::node::{InnerNode, LeafTuple, NodeLabel};
use crate::trie::predicate::Predicate;

/// One child slot that survived pruning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMatch {
    /// Index into the node's child-slot array.
    pub slot: usize,
    /// How far the descent level advances through this slot.
    pub level_add: usize,
    /// The key decoded so far, extended through this slot.
    pub reconstruction: KeyBuf,
}

/// Prune an inner node's child slots against the predicate set.
///
/// `reconstructed` is the key decoded from the root down to (and not
/// including) this node. A slot survives only if every predicate could
/// still hold for some key below it.
pub fn inner_consistent(
    reconstructed: &KeyBuf,
    node: &InnerNode,
    predicates: &[Predicate],
) -> Vec<SlotMatch> {
    let base = KeyBuf::concat(reconstructed, node.prefix());

    let mut out = Vec::with_capacity(node.children().len());
    for (slot, child) in node.children().iter().enumerate() {
        let partial = match child.label {
            NodeLabel::Byte(b) => {
                let mut p = base.clone();
                p.push_byte(b);
                p
            }
            // Terminator and all-the-same consume no key byte.
            NodeLabel::Terminator | NodeLabel::AllTheSame => base.clone(),
        };

        if predicates.iter().all(|p| p.matches_partial(partial.as_bytes())) {
            out.push(SlotMatch {
                slot,
                level_add: partial.len() - reconstructed.len(),
                reconstruction: partial,
            });
        }
    }
    out
}

/// Exact predicate check for one leaf tuple.
///
/// Returns the fully reconstructed key when every predicate holds.
pub fn leaf_consistent(
    reconstructed: &KeyBuf,
    tuple: &LeafTuple,
    predicates: &[Predicate],
) -> Option<KeyBuf> {
    let full = KeyBuf::concat(reconstructed, &tuple.residual);
    if predicates.iter().all(|p| p.matches_leaf(full.as_bytes())) {
        Some(full)
    } else {
        None
    }
}
