use anyhow::Result;
use clap::Parser;

use tripvec::cli::{Cli, Commands};
use tripvec::commands;
use tripvec::registry::{CsvLookupSource, Registry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let registry = Registry::new(CsvLookupSource::new(&cli.lookups));

    match &cli.command {
        Commands::Build(args) => commands::build(args, &registry),
        Commands::Aggregate(args) => commands::aggregate(args, &registry),
        Commands::Translate(args) => commands::translate(args, &registry),
        Commands::Report(args) => commands::report(args, &registry),
    }
}
