pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cafe")]
#[command(about = "Pin content and search for thread snapshots")]
pub struct Args {
    /// Path to the cafe config directory (defaults to ~/.cafe)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
