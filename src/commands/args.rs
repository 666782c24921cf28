//! Command-line argument definitions for the kradix CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kradix")]
#[command(about = "Radix-trie index for DNA k-mers (equality, prefix, IUPAC queries)")]
#[command(
    long_about = "Kradix: index the k-mers of reference sequences in a radix trie and
answer exact, prefix, and IUPAC ambiguity-pattern queries against it.

WORKFLOW:
  1. Build an index:   kradix build -o index.krdx -r refs.fasta -k 21
  2. Query it:         kradix query -i index.krdx equal ACGTACGT

INPUT FORMATS:
  FASTA (.fa, .fasta, .fna) and FASTQ (.fq, .fastq) files are supported.
  Gzip-compressed files (.gz) are automatically detected and decompressed.
  Windows containing non-ACGT bases are skipped.

OUTPUT FORMAT (query):
  Tab-separated columns: query<TAB>kmer<TAB>row"
)]
#[command(after_help = "EXAMPLES:
  # Build an index of every 21-mer in a genome
  kradix build -o genome.krdx -r genome.fna -k 21

  # Build from a TOML config instead
  kradix build --config build.toml

  # Exact and prefix lookups
  kradix query -i genome.krdx equal ACGTACGTACGTACGTACGTA
  kradix query -i genome.krdx prefix ACGTAC

  # IUPAC pattern containment (N matches any base)
  kradix query -i genome.krdx contains ACGTNNGTACGTACGTACGTA

  # Batch queries from a file, one 'kind text' pair per line
  kradix query -i genome.krdx --queries queries.txt -o hits.tsv")]
pub struct Cli {
    /// Enable verbose progress output with timestamps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a new index from reference sequences
    Build {
        /// Output index path
        #[arg(short, long, required_unless_present = "config")]
        output: Option<PathBuf>,

        /// Reference sequence files (FASTA/FASTQ, optionally gzipped).
        /// Can specify multiple times: -r file1.fa -r file2.fa
        #[arg(short, long)]
        reference: Vec<PathBuf>,

        /// K-mer length (1-32)
        #[arg(short, long, default_value_t = 21)]
        k: usize,

        /// Storage page capacity in bytes
        #[arg(long)]
        page_capacity: Option<usize>,

        /// TOML config file; replaces the other options
        #[arg(long, conflicts_with_all = ["output", "reference"])]
        config: Option<PathBuf>,
    },

    /// Query an index with one predicate or a batch of them
    Query {
        /// Index path written by `kradix build`
        #[arg(short, long)]
        index: PathBuf,

        /// Predicate kind: equal, prefix, contains (or strategy number 1-3)
        #[arg(required_unless_present = "queries")]
        kind: Option<String>,

        /// Query text: a k-mer, a prefix, or an IUPAC pattern
        #[arg(required_unless_present = "queries")]
        text: Option<String>,

        /// File with one query per line: 'kind text'
        #[arg(long, conflicts_with_all = ["kind", "text"])]
        queries: Option<PathBuf>,

        /// Output TSV path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print structural statistics of an index
    Stats {
        /// Index path written by `kradix build`
        #[arg(short, long)]
        index: PathBuf,
    },
}
