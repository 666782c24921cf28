//! Command-line interface definitions and handlers for the kradix CLI.

pub mod args;
pub mod build;
pub mod query;
pub mod stats;

pub use args::{Cli, Commands};
pub use build::{run_build, run_build_from_config, BuildParams};
pub use query::{run_query, QueryParams};
pub use stats::run_stats;
