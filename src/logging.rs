//! Logger setup for the CLI: elapsed-time stamps on stderr.

use std::io::Write;
use std::time::Instant;

/// Initialize the logger.
///
/// Verbose mode enables Info-level progress lines; otherwise only
/// warnings and errors appear. Each line is stamped with the seconds
/// elapsed since startup, e.g. `[   12.4s] INFO: ...`. `RUST_LOG`
/// still overrides the filter.
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    let start = Instant::now();
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{:>7.1}s] {}: {}",
                start.elapsed().as_secs_f64(),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}
