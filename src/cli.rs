//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

#[derive(Parser, Debug, Clone)]
#[command(name = "meshshot")]
#[command(about = "Render mesh files to PNG screenshots", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the YAML configuration file (a missing file means defaults)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Mesh to render, overriding `mesh_path` from the configuration
    #[arg(long)]
    pub mesh: Option<PathBuf>,

    /// Output image path (defaults to fig/<mesh-stem>.png)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Open an interactive viewer instead of writing an image
    #[arg(long)]
    pub interactive: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter for the requested verbosity
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
