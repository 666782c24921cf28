//! Query command: evaluate predicates against a built index.

use anyhow::{anyhow, Context, Result};
use log::info;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use kradix::{
    KmerTrie, Predicate, STRATEGY_CONTAINS, STRATEGY_EQUAL, STRATEGY_PREFIX,
};

pub struct QueryParams {
    pub index: PathBuf,
    pub kind: Option<String>,
    pub text: Option<String>,
    pub queries: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Entry point for `kradix query`.
pub fn run_query(params: QueryParams) -> Result<()> {
    let trie = KmerTrie::load(&params.index)?;

    let queries: Vec<(String, Predicate)> = match (&params.queries, &params.kind, &params.text) {
        (Some(path), _, _) => parse_query_file(path)?,
        (None, Some(kind), Some(text)) => {
            vec![(format!("{} {}", kind, text), parse_predicate(kind, text)?)]
        }
        _ => return Err(anyhow!("Either a kind/text pair or --queries is required")),
    };
    info!("Running {} queries against {}", queries.len(), params.index.display());

    // Queries are independent read-only scans over the shared tree.
    let results: Vec<(String, Result<Vec<kradix::ScanHit>, kradix::KradixError>)> = queries
        .into_par_iter()
        .map(|(label, pred)| {
            let hits = trie.scan(&[pred]);
            (label, hits)
        })
        .collect();

    let mut writer: Box<dyn Write> = match &params.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut total = 0usize;
    for (label, hits) in results {
        let hits = hits.with_context(|| format!("Query '{}' failed", label))?;
        total += hits.len();
        for hit in hits {
            writeln!(writer, "{}\t{}\t{}", label, hit.kmer, hit.row)?;
        }
    }
    writer.flush()?;

    info!("{} hits total", total);
    Ok(())
}

/// Resolve a predicate from its textual kind (or strategy number) and
/// query text.
pub fn parse_predicate(kind: &str, text: &str) -> Result<Predicate> {
    let strategy = match kind.to_ascii_lowercase().as_str() {
        "equal" | "eq" => STRATEGY_EQUAL,
        "prefix" => STRATEGY_PREFIX,
        "contains" => STRATEGY_CONTAINS,
        other => other
            .parse::<u16>()
            .map_err(|_| anyhow!("Unknown predicate kind: '{}'", other))?,
    };
    Ok(Predicate::from_strategy(strategy, text)?)
}

/// Read a batch file: one 'kind text' pair per line, blank lines and
/// '#' comments ignored.
fn parse_query_file(path: &Path) -> Result<Vec<(String, Predicate)>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read queries file: {}", path.display()))?;

    let mut queries = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (kind, text) = match (parts.next(), parts.next(), parts.next()) {
            (Some(kind), Some(text), None) => (kind, text),
            _ => {
                return Err(anyhow!(
                    "{}:{}: expected 'kind text', got '{}'",
                    path.display(),
                    lineno + 1,
                    line
                ))
            }
        };
        queries.push((
            format!("{} {}", kind, text),
            parse_predicate(kind, text)
                .with_context(|| format!("{}:{}", path.display(), lineno + 1))?,
        ));
    }

    if queries.is_empty() {
        return Err(anyhow!("No queries in {}", path.display()));
    }
    Ok(queries)
}
