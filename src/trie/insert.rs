//! Insertion engine: the per-node `choose` decision and the leaf-batch
//! `picksplit`.
//!
//! Both are pure decision functions. `choose` inspects one inner node
//! and the descending key and reports what the driver should do;
//! `picksplit` turns an overflowing batch of leaf residuals into the
//! shape of a new inner node. Neither touches the store.

use crate::core::key::{common_prefix_len, KeyBuf};
use crate::trie::node::{InnerNode, NodeLabel};

/// Outcome of `choose` at one inner node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChooseDecision {
    /// The key's next byte (or its end) matches an existing child slot.
    /// Advance `level_add` bytes and descend into `slot`.
    Descend { slot: usize, level_add: usize },

    /// The node's prefix matches but no child slot does: add a slot with
    /// `label` at `position` (the sorted insertion point), then reissue.
    AddChild { label: NodeLabel, position: usize },

    /// The node's prefix diverges from the key (or the node is
    /// all-the-same and cannot take a new slot): replace the node with a
    /// fresh upper node and reissue the insertion there.
    Split(SplitPlan),
}

/// Shape of the two nodes produced by a split-upward.
///
/// The upper node takes `upper_prefix` and a single child slot labeled
/// `upper_label`; the old node becomes that slot's child and its prefix
/// shrinks to `lower_prefix`. The descending key is not consumed here;
/// the driver reissues `choose` on the upper node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPlan {
    pub upper_prefix: KeyBuf,
    pub upper_label: NodeLabel,
    pub lower_prefix: KeyBuf,
}

/// Decide how to insert `key` (already consumed up to `level`) at `node`.
pub fn choose(key: &[u8], level: usize, node: &InnerNode) -> ChooseDecision {
    let remainder = &key[level..];
    let prefix = node.prefix().as_bytes();
    let common = common_prefix_len(remainder, prefix);

    if common < prefix.len() {
        // Prefix divergence: the shared part becomes the upper node's
        // prefix, the first diverging prefix byte becomes its sole
        // label, and the old node keeps what follows that byte.
        return ChooseDecision::Split(SplitPlan {
            upper_prefix: KeyBuf::from_slice(&prefix[..common]),
            upper_label: NodeLabel::Byte(prefix[common]),
            lower_prefix: KeyBuf::from_slice(&prefix[common + 1..]),
        });
    }

    let next = match remainder.get(common) {
        Some(&b) => NodeLabel::Byte(b),
        None => NodeLabel::Terminator,
    };

    if let Some(slot) = node.find_label(next) {
        let level_add = prefix.len() + if next.consumed_byte().is_some() { 1 } else { 0 };
        return ChooseDecision::Descend { slot, level_add };
    }

    if node.all_the_same() {
        // An all-the-same node cannot take a distinguishing slot; hoist
        // its prefix into a fresh upper node whose sole label is the
        // reserved marker, then reissue there.
        return ChooseDecision::Split(SplitPlan {
            upper_prefix: node.prefix().clone(),
            upper_label: NodeLabel::AllTheSame,
            lower_prefix: KeyBuf::new(),
        });
    }

    ChooseDecision::AddChild {
        label: next,
        position: node.insert_position(next),
    }
}

/// Shape of the inner node built from an overflowing leaf batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickSplit {
    /// Common prefix of the batch, capped at the page's prefix limit.
    pub prefix: KeyBuf,
    /// Sorted distinct child labels.
    pub labels: Vec<NodeLabel>,
    /// For each input key, the index of its child slot in `labels`.
    pub mapping: Vec<usize>,
    /// For each input key, its residual below the new node.
    pub residuals: Vec<KeyBuf>,
}

/// Partition a non-empty batch of leaf keys into the child slots of a
/// new inner node.
///
/// With two or more distinct discriminator bytes the result has that
/// many slots; an all-identical batch collapses to a single slot, which
/// the driver realizes as an all-the-same node.
pub fn picksplit(batch: &[KeyBuf], max_prefix: usize) -> PickSplit {
    debug_assert!(!batch.is_empty());

    let first = batch[0].as_bytes();
    let mut common = first.len();
    for key in &batch[1..] {
        common = common.min(common_prefix_len(first, key.as_bytes()));
        if common == 0 {
            break;
        }
    }
    common = common.min(max_prefix);

    let discriminator = |key: &KeyBuf| match key.as_bytes().get(common) {
        Some(&b) => NodeLabel::Byte(b),
        None => NodeLabel::Terminator,
    };

    let mut labels: Vec<NodeLabel> = batch.iter().map(discriminator).collect();
    labels.sort_unstable();
    labels.dedup();

    let mut mapping = Vec::with_capacity(batch.len());
    let mut residuals = Vec::with_capacity(batch.len());
    for key in batch {
        let disc = discriminator(key);
        let slot = labels
            .binary_search(&disc)
            .expect("discriminator must be present in the label set");
        mapping.push(slot);
        residuals.push(match disc {
            NodeLabel::Byte(_) => key.suffix(common + 1),
            _ => KeyBuf::new(),
        });
    }

    PickSplit {
        prefix: KeyBuf::from_slice(&first[..common]),
        labels,
        mapping,
        residuals,
    }
}
