//! The k-mer trie: an in-memory page store plus the insert and scan
//! drivers that execute the engine's decisions.
//!
//! The insertion engine only ever reports a typed decision; this module
//! applies it to the store. A split rewrites the upper node in place on
//! the old node's page so the parent's downlink stays valid, and moves
//! the demoted node to a freshly allocated page.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::info;

use crate::constants::{
    max_prefix, DEFAULT_PAGE_CAPACITY, INDEX_MAGIC, INDEX_VERSION, MAX_KMER_LEN, MAX_LOADED_PAGES,
    MIN_PAGE_CAPACITY,
};
use crate::core::alphabet::is_nucleotide;
use crate::core::key::KeyBuf;
use crate::error::{KradixError, Result};
use crate::sequence::Kmer;
use crate::trie::insert::{choose, picksplit, ChooseDecision, SplitPlan};
use crate::trie::node::{ChildSlot, InnerNode, LeafTuple, NodeLabel, RowId};
use crate::trie::page;
use crate::trie::predicate::Predicate;
use crate::trie::search::{inner_consistent, leaf_consistent};
use crate::trie::store::{Page, PageId, PageStore};

/// Tunables for a trie instance.
#[derive(Debug, Clone, Copy)]
pub struct TrieOptions {
    /// Storage page capacity in bytes. Every inner node must serialize
    /// within this; leaf pages overflow into splits (or chains for
    /// duplicate runs).
    pub page_capacity: usize,
}

impl Default for TrieOptions {
    fn default() -> Self {
        TrieOptions {
            page_capacity: DEFAULT_PAGE_CAPACITY,
        }
    }
}

impl TrieOptions {
    fn validate(&self) -> Result<()> {
        if self.page_capacity < MIN_PAGE_CAPACITY {
            return Err(KradixError::validation(format!(
                "page capacity {} below the minimum of {}",
                self.page_capacity, MIN_PAGE_CAPACITY
            )));
        }
        Ok(())
    }
}

/// Node-layout contract advertised to the host store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieLayout {
    /// Inner-node prefixes are length-prefixed key buffers.
    pub prefix_is_key_buffer: bool,
    /// Child labels serialize as signed 16-bit integers.
    pub label_bits: u32,
    /// Leaves can reconstruct the indexed key exactly.
    pub can_return_data: bool,
    /// Values longer than a page are not supported.
    pub long_values_ok: bool,
}

/// One search result: the reconstructed key and its row reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHit {
    pub kmer: Kmer,
    pub row: RowId,
}

/// Page and tuple counts reported by `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieStats {
    pub inner_pages: usize,
    pub leaf_pages: usize,
    pub tuples: u64,
    pub depth: usize,
}

/// A radix-trie index over DNA k-mers.
#[derive(Debug)]
pub struct KmerTrie {
    store: PageStore,
    root: PageId,
    options: TrieOptions,
    tuple_count: u64,
}

impl Default for KmerTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl KmerTrie {
    /// Empty trie with default options.
    pub fn new() -> Self {
        Self::with_options(TrieOptions::default()).expect("default options are valid")
    }

    /// Empty trie with explicit options.
    pub fn with_options(options: TrieOptions) -> Result<Self> {
        options.validate()?;
        let mut store = PageStore::new();
        let root = store.alloc(Page::Leaves(Vec::new()))?;
        Ok(KmerTrie {
            store,
            root,
            options,
            tuple_count: 0,
        })
    }

    /// The node-layout contract.
    pub const fn layout() -> TrieLayout {
        TrieLayout {
            prefix_is_key_buffer: true,
            label_bits: 16,
            can_return_data: true,
            long_values_ok: false,
        }
    }

    /// Number of indexed tuples (duplicates counted).
    pub fn len(&self) -> u64 {
        self.tuple_count
    }

    pub fn is_empty(&self) -> bool {
        self.tuple_count == 0
    }

    pub fn options(&self) -> TrieOptions {
        self.options
    }

    pub fn page_count(&self) -> usize {
        self.store.len()
    }

    /// The root page id.
    pub fn root(&self) -> PageId {
        self.root
    }

    /// Read-only access to one page, for introspection and tests.
    pub fn page(&self, id: PageId) -> Result<&Page> {
        self.store.get(id)
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Insert one k-mer with its row reference.
    pub fn insert(&mut self, kmer: &Kmer, row: RowId) -> Result<()> {
        let key = kmer.as_bytes();
        let mut level = 0usize;
        let mut page_id = self.root;

        loop {
            let decision = match self.store.get(page_id)? {
                Page::Leaves(_) => None,
                Page::Inner(node) => Some(choose(key, level, node)),
            };

            match decision {
                None => {
                    let residual = KeyBuf::from_slice(&key[level..]);
                    match self.store.get_mut(page_id)? {
                        Page::Leaves(tuples) => tuples.push(LeafTuple { residual, row }),
                        Page::Inner(_) => {
                            return Err(KradixError::invariant("leaf append on an inner page"))
                        }
                    }
                    if let Err(e) = self.split_oversized_leaves(page_id) {
                        // Keep the operation all-or-nothing: drop the
                        // tuple appended above before surfacing.
                        if let Ok(Page::Leaves(tuples)) = self.store.get_mut(page_id) {
                            tuples.pop();
                        }
                        return Err(e);
                    }
                    self.tuple_count += 1;
                    return Ok(());
                }

                Some(ChooseDecision::Descend { slot, level_add }) => {
                    let downlink = match self.store.get(page_id)? {
                        Page::Inner(node) => node.children()[slot].downlink,
                        Page::Leaves(_) => {
                            return Err(KradixError::invariant("descend into a leaf page"))
                        }
                    };
                    level += level_add;
                    page_id = downlink;
                }

                Some(ChooseDecision::AddChild { label, position }) => {
                    let grown = page::encoded_len(self.store.get(page_id)?) + 6;
                    if grown > self.options.page_capacity {
                        return Err(KradixError::invariant(format!(
                            "inner node on page {} would grow to {} bytes, over the page capacity of {}",
                            page_id.as_u32(),
                            grown,
                            self.options.page_capacity
                        )));
                    }
                    let leaf = self.store.alloc(Page::Leaves(Vec::new()))?;
                    match self.store.get_mut(page_id)? {
                        Page::Inner(node) => {
                            node.insert_slot(position, ChildSlot { label, downlink: leaf })?
                        }
                        Page::Leaves(_) => {
                            return Err(KradixError::invariant("add-child on a leaf page"))
                        }
                    }
                    // Reissue: the next round descends into the new slot.
                }

                Some(ChooseDecision::Split(plan)) => {
                    self.split_upward(page_id, plan)?;
                    // Reissue at the same page and level.
                }
            }
        }
    }

    /// Replace the node on `page_id` by the upper node of `plan`; the
    /// old node moves to a new page as the upper node's only child.
    ///
    /// Both produced nodes are strictly smaller than the node they came
    /// from (the prefix shrinks, the slot count does not grow), so a
    /// split never creates an oversized page.
    fn split_upward(&mut self, page_id: PageId, plan: SplitPlan) -> Result<()> {
        let old = match self.store.get(page_id)? {
            Page::Inner(node) => node.clone(),
            Page::Leaves(_) => return Err(KradixError::invariant("split of a leaf page")),
        };

        let lower = InnerNode::new(plan.lower_prefix, old.children().to_vec(), old.all_the_same())?;
        let lower_id = self.store.alloc(Page::Inner(lower))?;

        let upper = InnerNode::new(
            plan.upper_prefix,
            vec![ChildSlot {
                label: plan.upper_label,
                downlink: lower_id,
            }],
            false,
        )?;
        self.store.replace(page_id, Page::Inner(upper))
    }

    /// Convert an over-capacity leaf page into an inner node with new
    /// leaf pages per child slot. Identical empty residuals cannot be
    /// split any further and stay on the page as a chain.
    ///
    /// The capacity check runs before any page is touched, so a failure
    /// leaves the tree exactly as it was.
    fn split_oversized_leaves(&mut self, page_id: PageId) -> Result<()> {
        let page = self.store.get(page_id)?;
        let oversized =
            matches!(page, Page::Leaves(_)) && page::encoded_len(page) > self.options.page_capacity;
        if !oversized {
            return Ok(());
        }

        let residuals: Vec<KeyBuf> = match page {
            Page::Leaves(tuples) => tuples.iter().map(|t| t.residual.clone()).collect(),
            Page::Inner(_) => return Ok(()),
        };
        let ps = picksplit(&residuals, max_prefix(self.options.page_capacity));

        let single_slot = ps.labels.len() == 1;
        if single_slot && ps.prefix.is_empty() && ps.labels[0] == NodeLabel::Terminator {
            // A batch of identical empty residuals: no discriminator is
            // left, so the page chains instead of splitting.
            return Ok(());
        }

        // Validate the whole cascade before mutating anything, so a
        // capacity failure leaves the store untouched.
        self.validate_split(&residuals)?;

        let tuples = match self.store.get_mut(page_id)? {
            Page::Leaves(t) => std::mem::take(t),
            Page::Inner(_) => return Err(KradixError::invariant("leaf split of an inner page")),
        };

        let mut slot_pages = Vec::with_capacity(ps.labels.len());
        for _ in &ps.labels {
            slot_pages.push(self.store.alloc(Page::Leaves(Vec::new()))?);
        }

        for (i, tuple) in tuples.iter().enumerate() {
            let target = slot_pages[ps.mapping[i]];
            match self.store.get_mut(target)? {
                Page::Leaves(v) => v.push(LeafTuple {
                    residual: ps.residuals[i].clone(),
                    row: tuple.row,
                }),
                Page::Inner(_) => {
                    return Err(KradixError::invariant("fresh slot page is not a leaf"))
                }
            }
        }

        let children = ps
            .labels
            .iter()
            .zip(&slot_pages)
            .map(|(&label, &downlink)| ChildSlot { label, downlink })
            .collect();
        let node = InnerNode::new(ps.prefix, children, single_slot)?;
        self.store.replace(page_id, Page::Inner(node))?;

        // Heavy groups (duplicate runs) may still overflow their slot.
        for child in slot_pages {
            self.split_oversized_leaves(child)?;
        }
        Ok(())
    }

    /// Check, without touching the store, that splitting this batch can
    /// cascade to completion with every inner node within capacity.
    fn validate_split(&self, residuals: &[KeyBuf]) -> Result<()> {
        let cap = self.options.page_capacity;
        let ps = picksplit(residuals, max_prefix(cap));

        if ps.labels.len() == 1 && ps.prefix.is_empty() && ps.labels[0] == NodeLabel::Terminator {
            return Ok(()); // chains, never splits
        }

        let prefix_bytes = if ps.prefix.is_empty() {
            0
        } else {
            ps.prefix.encoded_len()
        };
        let inner_size = 1 + prefix_bytes + 2 + ps.labels.len() * 6;
        if inner_size > cap {
            return Err(KradixError::invariant(format!(
                "split needs a {}-byte inner node, over the page capacity of {}",
                inner_size, cap
            )));
        }

        for slot in 0..ps.labels.len() {
            let group: Vec<KeyBuf> = ps
                .mapping
                .iter()
                .zip(&ps.residuals)
                .filter(|(&m, _)| m == slot)
                .map(|(_, r)| r.clone())
                .collect();
            let page_size = 3 + group.iter().map(|r| r.encoded_len() + 8).sum::<usize>();
            if page_size > cap {
                self.validate_split(&group)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Return every indexed tuple satisfying all `predicates`.
    ///
    /// Duplicates surface as separate hits; order is unspecified.
    pub fn scan(&self, predicates: &[Predicate]) -> Result<Vec<ScanHit>> {
        let mut out = Vec::new();
        let mut stack = vec![(self.root, KeyBuf::new())];

        while let Some((page_id, reconstructed)) = stack.pop() {
            match self.store.get(page_id)? {
                Page::Inner(node) => {
                    for m in inner_consistent(&reconstructed, node, predicates) {
                        stack.push((node.children()[m.slot].downlink, m.reconstruction));
                    }
                }
                Page::Leaves(tuples) => {
                    for tuple in tuples {
                        if let Some(full) = leaf_consistent(&reconstructed, tuple, predicates) {
                            let kmer = Kmer::new(full.as_bytes()).map_err(|_| {
                                KradixError::corrupt("reconstructed key is not a valid k-mer")
                            })?;
                            out.push(ScanHit {
                                kmer,
                                row: tuple.row,
                            });
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Page and tuple counts plus the maximum node depth.
    pub fn stats(&self) -> Result<TrieStats> {
        let mut inner_pages = 0;
        let mut leaf_pages = 0;
        let mut depth = 0;
        let mut stack = vec![(self.root, 1usize)];

        while let Some((page_id, d)) = stack.pop() {
            depth = depth.max(d);
            match self.store.get(page_id)? {
                Page::Inner(node) => {
                    inner_pages += 1;
                    for slot in node.children() {
                        stack.push((slot.downlink, d + 1));
                    }
                }
                Page::Leaves(_) => leaf_pages += 1,
            }
        }

        Ok(TrieStats {
            inner_pages,
            leaf_pages,
            tuples: self.tuple_count,
            depth,
        })
    }

    /// Verify the structural invariants of the whole tree.
    ///
    /// Checks label order, page capacities, the prefix cap, key
    /// reconstruction validity, single ownership of every page, and the
    /// absence of cycles and orphans.
    pub fn check_invariants(&self) -> Result<()> {
        let cap = self.options.page_capacity;
        let prefix_cap = max_prefix(cap);
        let mut visited = vec![false; self.store.len()];
        let mut tuples_seen = 0u64;
        let mut stack = vec![(self.root, KeyBuf::new())];

        while let Some((page_id, reconstructed)) = stack.pop() {
            let seen = visited
                .get_mut(page_id.as_u32() as usize)
                .ok_or_else(|| KradixError::corrupt("downlink outside the page store"))?;
            if *seen {
                return Err(KradixError::invariant(format!(
                    "page {} is reachable through two paths",
                    page_id.as_u32()
                )));
            }
            *seen = true;

            let page = self.store.get(page_id)?;
            match page {
                Page::Inner(node) => {
                    for pair in node.children().windows(2) {
                        if pair[0].label >= pair[1].label {
                            return Err(KradixError::invariant(format!(
                                "page {}: labels out of order",
                                page_id.as_u32()
                            )));
                        }
                    }
                    if node.prefix().len() > prefix_cap {
                        return Err(KradixError::invariant(format!(
                            "page {}: prefix of {} bytes exceeds the cap of {}",
                            page_id.as_u32(),
                            node.prefix().len(),
                            prefix_cap
                        )));
                    }
                    if page::encoded_len(page) > cap {
                        return Err(KradixError::invariant(format!(
                            "page {}: inner node of {} bytes exceeds the page capacity of {}",
                            page_id.as_u32(),
                            page::encoded_len(page),
                            cap
                        )));
                    }
                    for slot in node.children() {
                        let mut below = KeyBuf::concat(&reconstructed, node.prefix());
                        if let Some(b) = slot.label.consumed_byte() {
                            below.push_byte(b);
                        }
                        stack.push((slot.downlink, below));
                    }
                }
                Page::Leaves(tuples) => {
                    for tuple in tuples {
                        let full = KeyBuf::concat(&reconstructed, &tuple.residual);
                        if full.len() > MAX_KMER_LEN {
                            return Err(KradixError::invariant(format!(
                                "page {}: reconstructed key of {} bytes exceeds the k-mer cap",
                                page_id.as_u32(),
                                full.len()
                            )));
                        }
                        if !full.as_bytes().iter().all(|&b| is_nucleotide(b)) {
                            return Err(KradixError::invariant(format!(
                                "page {}: reconstructed key contains a non-nucleotide byte",
                                page_id.as_u32()
                            )));
                        }
                        tuples_seen += 1;
                    }
                    // Over-capacity leaf pages are legal only as chains
                    // of identical residuals.
                    if page::encoded_len(page) > cap {
                        let identical = tuples.windows(2).all(|w| w[0].residual == w[1].residual);
                        if !identical {
                            return Err(KradixError::invariant(format!(
                                "page {}: oversized leaf page with distinct residuals",
                                page_id.as_u32()
                            )));
                        }
                    }
                }
            }
        }

        if let Some(orphan) = visited.iter().position(|v| !v) {
            return Err(KradixError::invariant(format!(
                "page {} is not reachable from the root",
                orphan
            )));
        }
        if tuples_seen != self.tuple_count {
            return Err(KradixError::invariant(format!(
                "tuple count {} disagrees with {} reachable tuples",
                self.tuple_count, tuples_seen
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the index to `path`.
    ///
    /// Layout: magic, version, page capacity, root page, page count,
    /// then each page length-prefixed in its wire form.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path).map_err(|e| KradixError::io(path, "create", e))?;
        let mut buf = Vec::new();

        buf.extend_from_slice(INDEX_MAGIC);
        buf.extend_from_slice(&INDEX_VERSION.to_le_bytes());
        buf.extend_from_slice(&(self.options.page_capacity as u32).to_le_bytes());
        buf.extend_from_slice(&self.root.as_u32().to_le_bytes());
        buf.extend_from_slice(&(self.store.len() as u32).to_le_bytes());

        let mut page_buf = Vec::new();
        for (id, page) in self.store.iter() {
            if let Page::Leaves(tuples) = page {
                if tuples.len() > u16::MAX as usize {
                    return Err(KradixError::invariant(format!(
                        "leaf page {} holds {} tuples, over the 16-bit wire limit",
                        id.as_u32(),
                        tuples.len()
                    )));
                }
            }
            page_buf.clear();
            page::encode(page, &mut page_buf);
            buf.extend_from_slice(&(page_buf.len() as u32).to_le_bytes());
            buf.extend_from_slice(&page_buf);
        }

        file.write_all(&buf)
            .map_err(|e| KradixError::io(path, "write", e))?;
        file.flush().map_err(|e| KradixError::io(path, "flush", e))?;

        info!(
            "Saved index: {} tuples on {} pages to '{}'",
            self.tuple_count,
            self.store.len(),
            path.display()
        );
        Ok(())
    }

    /// Read an index previously written by `save`.
    pub fn load(path: &Path) -> Result<KmerTrie> {
        let mut file = File::open(path).map_err(|e| KradixError::io(path, "open", e))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| KradixError::io(path, "read", e))?;

        let mut pos = 0usize;
        let magic = take(&buf, &mut pos, 4)
            .ok_or_else(|| KradixError::format(path, "truncated header"))?;
        if magic != INDEX_MAGIC {
            return Err(KradixError::format(path, "invalid magic bytes"));
        }
        let version = read_header_u32(&buf, &mut pos, path)?;
        if version != INDEX_VERSION {
            return Err(KradixError::format(
                path,
                format!(
                    "unsupported index version: {} (expected {})",
                    version, INDEX_VERSION
                ),
            ));
        }
        let page_capacity = read_header_u32(&buf, &mut pos, path)? as usize;
        let options = TrieOptions { page_capacity };
        options.validate().map_err(|e| {
            KradixError::format(path, format!("implausible page capacity: {}", e))
        })?;
        let root_raw = read_header_u32(&buf, &mut pos, path)?;
        let page_count = read_header_u32(&buf, &mut pos, path)?;
        if page_count == 0 || page_count > MAX_LOADED_PAGES {
            return Err(KradixError::format(
                path,
                format!("implausible page count: {}", page_count),
            ));
        }
        if root_raw >= page_count {
            return Err(KradixError::format(
                path,
                format!("root page {} outside {} pages", root_raw, page_count),
            ));
        }

        let mut store = PageStore::new();
        let mut tuple_count = 0u64;
        for _ in 0..page_count {
            let len = read_header_u32(&buf, &mut pos, path)? as usize;
            let raw = take(&buf, &mut pos, len)
                .ok_or_else(|| KradixError::corrupt("truncated page body"))?;
            let page = page::decode(raw)?;
            match &page {
                Page::Inner(node) => {
                    for slot in node.children() {
                        if slot.downlink.as_u32() >= page_count {
                            return Err(KradixError::corrupt(format!(
                                "downlink to page {} outside {} pages",
                                slot.downlink.as_u32(),
                                page_count
                            )));
                        }
                    }
                }
                Page::Leaves(tuples) => tuple_count += tuples.len() as u64,
            }
            store.alloc(page)?;
        }
        if pos != buf.len() {
            return Err(KradixError::format(
                path,
                format!("{} trailing bytes after the last page", buf.len() - pos),
            ));
        }

        info!(
            "Loaded index: {} tuples on {} pages from '{}'",
            tuple_count,
            page_count,
            path.display()
        );
        Ok(KmerTrie {
            store,
            root: PageId::new(root_raw),
            options,
            tuple_count,
        })
    }
}

fn take<'a>(buf: &'a [u8], pos: &mut usize, n: usize) -> Option<&'a [u8]> {
    let end = pos.checked_add(n)?;
    let slice = buf.get(*pos..end)?;
    *pos = end;
    Some(slice)
}

fn read_header_u32(buf: &[u8], pos: &mut usize, path: &Path) -> Result<u32> {
    let raw = take(buf, pos, 4).ok_or_else(|| KradixError::format(path, "truncated header"))?;
    Ok(u32::from_le_bytes(raw.try_into().unwrap()))
}
