use anyhow::{anyhow, Result};
use clap::Parser;

mod commands;

use commands::{
    run_build, run_build_from_config, run_query, run_stats, BuildParams, Cli, Commands,
    QueryParams,
};
use kradix::logging::init_logger;

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logger(args.verbose);

    match args.command {
        Commands::Build {
            output,
            reference,
            k,
            page_capacity,
            config,
        } => match config {
            Some(config_path) => run_build_from_config(&config_path),
            None => run_build(BuildParams {
                output: output.ok_or_else(|| anyhow!("--output is required without --config"))?,
                references: reference,
                k,
                page_capacity,
            }),
        },

        Commands::Query {
            index,
            kind,
            text,
            queries,
            output,
        } => run_query(QueryParams {
            index,
            kind,
            text,
            queries,
            output,
        }),

        Commands::Stats { index } => run_stats(&index),
    }
}
