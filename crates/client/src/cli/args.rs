pub use clap::Parser;

use std::path::PathBuf;

use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "drs-client")]
#[command(about = "Upload, register and share Crypt4GH-encrypted files through a DRS server")]
#[command(version)]
pub struct Args {
    /// Path to the config file (defaults to ~/.drs-client/config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config_path: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: crate::Command,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        }
    }
}
