//! Stats command: structural summary of a built index.

use anyhow::Result;
use std::path::Path;

use kradix::KmerTrie;

/// Entry point for `kradix stats`.
pub fn run_stats(index_path: &Path) -> Result<()> {
    let trie = KmerTrie::load(index_path)?;
    trie.check_invariants()?;
    let stats = trie.stats()?;

    println!("index:        {}", index_path.display());
    println!("tuples:       {}", stats.tuples);
    println!("pages:        {}", trie.page_count());
    println!("inner pages:  {}", stats.inner_pages);
    println!("leaf pages:   {}", stats.leaf_pages);
    println!("depth:        {}", stats.depth);
    println!("page capacity: {} bytes", trie.options().page_capacity);
    Ok(())
}
