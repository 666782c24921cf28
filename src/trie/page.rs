//! Persisted page layout.
//!
//! A node page stores, in order:
//! - a 1-byte flag (is-leaf, has-prefix, all-the-same),
//! - if has-prefix: the length-prefixed prefix bytes,
//! - if inner: a 16-bit child count, then that many (16-bit label,
//!   32-bit downlink) pairs in ascending label order,
//! - if leaf: a 16-bit tuple count, then per tuple the length-prefixed
//!   residual and the 64-bit row reference.
//!
//! All integers are little-endian. Decoding validates structure and
//! surfaces `CorruptNode` on anything malformed.

use crate::core::key::KeyBuf;
use crate::error::{KradixError, Result};
use crate::trie::node::{ChildSlot, InnerNode, LeafTuple, NodeLabel};
use crate::trie::store::{Page, PageId};

const FLAG_IS_LEAF: u8 = 0b0000_0001;
const FLAG_HAS_PREFIX: u8 = 0b0000_0010;
const FLAG_ALL_THE_SAME: u8 = 0b0000_0100;
const FLAG_KNOWN: u8 = FLAG_IS_LEAF | FLAG_HAS_PREFIX | FLAG_ALL_THE_SAME;

/// Serialized size of a page in bytes.
pub fn encoded_len(page: &Page) -> usize {
    match page {
        Page::Inner(node) => {
            let prefix = if node.prefix().is_empty() {
                0
            } else {
                node.prefix().encoded_len()
            };
            1 + prefix + 2 + node.children().len() * 6
        }
        Page::Leaves(tuples) => {
            1 + 2
                + tuples
                    .iter()
                    .map(|t| t.residual.encoded_len() + 8)
                    .sum::<usize>()
        }
    }
}

/// Append the wire form of `page` to `out`.
pub fn encode(page: &Page, out: &mut Vec<u8>) {
    match page {
        Page::Inner(node) => {
            let mut flags = 0u8;
            if !node.prefix().is_empty() {
                flags |= FLAG_HAS_PREFIX;
            }
            if node.all_the_same() {
                flags |= FLAG_ALL_THE_SAME;
            }
            out.push(flags);
            if !node.prefix().is_empty() {
                node.prefix().write_to(out);
            }
            out.extend_from_slice(&(node.children().len() as u16).to_le_bytes());
            for slot in node.children() {
                out.extend_from_slice(&slot.label.to_i16().to_le_bytes());
                out.extend_from_slice(&slot.downlink.as_u32().to_le_bytes());
            }
        }
        Page::Leaves(tuples) => {
            out.push(FLAG_IS_LEAF);
            out.extend_from_slice(&(tuples.len() as u16).to_le_bytes());
            for tuple in tuples {
                tuple.residual.write_to(out);
                out.extend_from_slice(&tuple.row.to_le_bytes());
            }
        }
    }
}

/// Decode one page from its complete wire form.
pub fn decode(buf: &[u8]) -> Result<Page> {
    let mut pos = 0;
    let flags = *buf
        .get(pos)
        .ok_or_else(|| KradixError::corrupt("empty page"))?;
    pos += 1;

    if flags & !FLAG_KNOWN != 0 {
        return Err(KradixError::corrupt(format!(
            "unknown page flag bits 0x{:02x}",
            flags
        )));
    }

    let page = if flags & FLAG_IS_LEAF != 0 {
        if flags & (FLAG_HAS_PREFIX | FLAG_ALL_THE_SAME) != 0 {
            return Err(KradixError::corrupt("leaf page with inner-node flags"));
        }
        let count = read_u16(buf, &mut pos)? as usize;
        let mut tuples = Vec::with_capacity(count);
        for _ in 0..count {
            let residual = KeyBuf::read_from(buf, &mut pos)?;
            let row = read_u64(buf, &mut pos)?;
            tuples.push(LeafTuple { residual, row });
        }
        Page::Leaves(tuples)
    } else {
        let prefix = if flags & FLAG_HAS_PREFIX != 0 {
            let p = KeyBuf::read_from(buf, &mut pos)?;
            if p.is_empty() {
                return Err(KradixError::corrupt("has-prefix flag with empty prefix"));
            }
            p
        } else {
            KeyBuf::new()
        };
        let count = read_u16(buf, &mut pos)? as usize;
        let mut children = Vec::with_capacity(count);
        for _ in 0..count {
            let label = NodeLabel::from_i16(read_i16(buf, &mut pos)?)?;
            let downlink = PageId::new(read_u32(buf, &mut pos)?);
            children.push(ChildSlot { label, downlink });
        }
        // InnerNode::new re-checks the label-sort invariant; report a
        // sorting violation read off disk as corruption, not as a bug in
        // an in-memory mutation.
        let node = InnerNode::new(prefix, children, flags & FLAG_ALL_THE_SAME != 0)
            .map_err(|e| KradixError::corrupt(e.to_string()))?;
        Page::Inner(node)
    };

    if pos != buf.len() {
        return Err(KradixError::corrupt(format!(
            "{} trailing bytes after page content",
            buf.len() - pos
        )));
    }
    Ok(page)
}

fn read_u16(buf: &[u8], pos: &mut usize) -> Result<u16> {
    let end = *pos + 2;
    let raw = buf
        .get(*pos..end)
        .ok_or_else(|| KradixError::corrupt("truncated u16 field"))?;
    *pos = end;
    Ok(u16::from_le_bytes(raw.try_into().unwrap()))
}

fn read_i16(buf: &[u8], pos: &mut usize) -> Result<i16> {
    Ok(read_u16(buf, pos)? as i16)
}

fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32> {
    let end = *pos + 4;
    let raw = buf
        .get(*pos..end)
        .ok_or_else(|| KradixError::corrupt("truncated u32 field"))?;
    *pos = end;
    Ok(u32::from_le_bytes(raw.try_into().unwrap()))
}

fn read_u64(buf: &[u8], pos: &mut usize) -> Result<u64> {
    let end = *pos + 8;
    let raw = buf
        .get(*pos..end)
        .ok_or_else(|| KradixError::corrupt("truncated u64 field"))?;
    *pos = end;
    Ok(u64::from_le_bytes(raw.try_into().unwrap()))
}
