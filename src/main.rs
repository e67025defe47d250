mod aggregator;
mod cli;
mod error;
mod fmt;
mod importer;
mod models;
mod reference;
mod settings;
mod workbook;
mod writer;

use clap::Parser;
use tracing_subscriber::{prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run { config, today } => cli::run::run(config, today),
        Commands::Show { config, today } => cli::show::run(config, today),
        Commands::Init { path } => cli::init::run(path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
