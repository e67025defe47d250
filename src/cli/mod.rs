pub mod init;
pub mod run;
pub mod show;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "workcost",
    version,
    about = "Consolidate monthly timesheets and cost tables into a report workbook."
)]
pub struct Cli {
    /// Log debug detail, including every extracted and aggregated record
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read all inputs, aggregate, and rewrite the report sheets of the output workbook.
    Run {
        /// Settings file (default: ./appsettings.json, then ~/.config/workcost/settings.json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Report date for the actuals cutover rule: YYYY-MM-DD (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Aggregate and print the summaries without writing the workbook.
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Write a settings template.
    Init {
        /// Where to write it (default: ./appsettings.json)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}
