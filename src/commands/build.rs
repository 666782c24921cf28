//! Build command: index the k-mer windows of reference files.

use anyhow::{anyhow, Context, Result};
use log::info;
use needletail::parse_fastx_file;
use std::path::{Path, PathBuf};
use std::time::Instant;

use kradix::config::{parse_config, resolve_path, validate_config};
use kradix::constants::{MAX_KMER_LEN, MIN_PAGE_CAPACITY};
use kradix::core::is_nucleotide;
use kradix::sequence::Kmer;
use kradix::{KmerTrie, TrieOptions};

pub struct BuildParams {
    pub output: PathBuf,
    pub references: Vec<PathBuf>,
    pub k: usize,
    pub page_capacity: Option<usize>,
}

/// Entry point for `kradix build`.
pub fn run_build(params: BuildParams) -> Result<()> {
    if params.references.is_empty() {
        return Err(anyhow!("At least one reference file is required"));
    }
    if params.k == 0 || params.k > MAX_KMER_LEN {
        return Err(anyhow!(
            "k must be between 1 and {} (got {})",
            MAX_KMER_LEN,
            params.k
        ));
    }
    if let Some(cap) = params.page_capacity {
        if cap < MIN_PAGE_CAPACITY {
            return Err(anyhow!(
                "page capacity must be at least {} (got {})",
                MIN_PAGE_CAPACITY,
                cap
            ));
        }
    }

    let options = match params.page_capacity {
        Some(page_capacity) => TrieOptions { page_capacity },
        None => TrieOptions::default(),
    };
    let mut trie = KmerTrie::with_options(options)?;

    let started = Instant::now();
    let mut row: u64 = 0;
    for ref_path in &params.references {
        info!("Indexing {}", ref_path.display());
        row = add_reference_file(&mut trie, ref_path, params.k, row)?;
    }

    info!(
        "Indexed {} k-mer occurrences on {} pages in {:.1}s",
        trie.len(),
        trie.page_count(),
        started.elapsed().as_secs_f64()
    );

    trie.save(&params.output)?;
    Ok(())
}

/// Entry point for `kradix build --config`.
pub fn run_build_from_config(config_path: &Path) -> Result<()> {
    let config = parse_config(config_path)?;
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    validate_config(&config, config_dir)?;

    let references = config
        .sources
        .values()
        .flat_map(|source| source.files.iter())
        .map(|file| resolve_path(config_dir, file))
        .collect();

    run_build(BuildParams {
        output: resolve_path(config_dir, &config.index.output),
        references,
        k: config.index.k,
        page_capacity: Some(config.index.page_capacity),
    })
}

/// Slide a k-wide window over every record of one FASTX file, inserting
/// each all-ACGT window. Rows number the accepted windows consecutively
/// across files. Returns the next free row id.
fn add_reference_file(trie: &mut KmerTrie, path: &Path, k: usize, first_row: u64) -> Result<u64> {
    let mut reader = parse_fastx_file(path)
        .with_context(|| format!("Failed to open reference file: {}", path.display()))?;

    let mut row = first_row;
    let mut records = 0usize;
    let mut skipped_bases = 0usize;

    while let Some(record) = reader.next() {
        let record =
            record.with_context(|| format!("Failed to parse record in {}", path.display()))?;
        let seq = record.seq();
        records += 1;

        if seq.len() < k {
            continue;
        }

        // Track the length of the current run of valid bases so a
        // single ambiguous base only invalidates the windows over it.
        let mut valid_run = 0usize;
        for (i, &base) in seq.iter().enumerate() {
            if is_nucleotide(base) {
                valid_run += 1;
            } else {
                valid_run = 0;
                skipped_bases += 1;
                continue;
            }
            if valid_run >= k {
                let window = &seq[i + 1 - k..=i];
                let kmer = Kmer::new(window)?;
                trie.insert(&kmer, row)?;
                row += 1;
            }
        }
    }

    info!(
        "{}: {} records, {} k-mers indexed{}",
        path.display(),
        records,
        row - first_row,
        if skipped_bases > 0 {
            format!(", {} ambiguous bases skipped", skipped_bases)
        } else {
            String::new()
        }
    );
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kradix::{Predicate, STRATEGY_EQUAL};
    use std::io::Write;

    fn write_fasta(dir: &Path, name: &str, sequences: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for (i, seq) in sequences.iter().enumerate() {
            writeln!(file, ">seq{}", i).unwrap();
            writeln!(file, "{}", seq).unwrap();
        }
        path
    }

    #[test]
    fn test_add_reference_file_windows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path(), "ref.fa", &["ACGTA"]);

        let mut trie = KmerTrie::new();
        let next_row = add_reference_file(&mut trie, &path, 3, 0).unwrap();
        assert_eq!(next_row, 3); // ACG, CGT, GTA
        assert_eq!(trie.len(), 3);

        let pred = Predicate::from_strategy(STRATEGY_EQUAL, "CGT").unwrap();
        assert_eq!(trie.scan(&[pred]).unwrap().len(), 1);
    }

    #[test]
    fn test_add_reference_file_skips_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path(), "ref.fa", &["ACGNACG"]);

        let mut trie = KmerTrie::new();
        add_reference_file(&mut trie, &path, 3, 0).unwrap();
        // Only ACG on each side of the N; windows crossing it are gone.
        assert_eq!(trie.len(), 2);
        let pred = Predicate::from_strategy(STRATEGY_EQUAL, "ACG").unwrap();
        assert_eq!(trie.scan(&[pred]).unwrap().len(), 2);
    }

    #[test]
    fn test_add_reference_file_short_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(dir.path(), "ref.fa", &["AC", "ACGT"]);

        let mut trie = KmerTrie::new();
        add_reference_file(&mut trie, &path, 4, 0).unwrap();
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_run_build_rejects_bad_k() {
        let err = run_build(BuildParams {
            output: PathBuf::from("out.krdx"),
            references: vec![PathBuf::from("ref.fa")],
            k: 0,
            page_capacity: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("k must be"));
    }

    #[test]
    fn test_run_build_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let ref_path = write_fasta(dir.path(), "ref.fa", &["ACGTACGTAC"]);
        let out_path = dir.path().join("out.krdx");

        run_build(BuildParams {
            output: out_path.clone(),
            references: vec![ref_path],
            k: 5,
            page_capacity: None,
        })
        .unwrap();

        let trie = KmerTrie::load(&out_path).unwrap();
        assert_eq!(trie.len(), 6);
        trie.check_invariants().unwrap();
    }
}
