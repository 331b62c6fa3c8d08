//! CLI Module
//!
//! Command-line surface for the broadband update workflow. Layer references
//! are paths to JSON layer files; the host's parameter form maps onto the
//! `run` subcommand's flags.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Broadband provider coverage dataset updater
#[derive(Parser, Debug)]
#[command(name = "bbupdate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full update: archive, then replace in both destinations
    #[command(name = "run")]
    Run(RunArgs),

    /// Assign identifiers to a dataset without updating any layer
    #[command(name = "assign-ids")]
    AssignIds {
        /// Dataset layer file
        dataset: PathBuf,

        /// Use random (UUIDv4) identifiers instead of deterministic ones
        #[arg(long)]
        random: bool,
    },

    /// Print a layer's schema and row counts
    #[command(name = "show")]
    Show {
        /// Layer file to inspect
        layer: PathBuf,

        /// Only count rows for this provider
        #[arg(short, long)]
        provider: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Replacement dataset: all of the provider's features, new and existing
    #[arg(long)]
    pub new_data: PathBuf,

    /// Archive layer file receiving superseded features
    #[arg(long)]
    pub archive: PathBuf,

    /// UBB destination layer file (also the archive source)
    #[arg(long)]
    pub ubb: PathBuf,

    /// SGID destination layer file
    #[arg(long)]
    pub sgid: PathBuf,

    /// Data round label, e.g. 2024Q1
    #[arg(long)]
    pub round: String,

    /// Max download tier stamped on archived rows; derived from MaxDown
    /// per row when omitted
    #[arg(long)]
    pub max_tier: Option<String>,

    /// Provider name; read from the new dataset when omitted
    #[arg(long)]
    pub provider: Option<String>,

    /// Field holding the provider name
    #[arg(long, default_value = "ProviderName")]
    pub provider_field: String,

    /// Archive step mode: once | per-destination
    #[arg(long, default_value = "once")]
    pub archive_mode: String,

    /// Use random (UUIDv4) identifiers instead of deterministic ones
    #[arg(long)]
    pub random_ids: bool,
}
