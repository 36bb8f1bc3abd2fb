use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::api::Source;

#[derive(Parser, Debug)]
#[command(name = "vcomments")]
#[command(about = "Fetch the comment thread of a video", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Video ID to load comments for
    pub video_id: Option<String>,

    /// Custom config directory (default: ~/.config/vcomments)
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging (prints log path, sets DEBUG level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Backend to try first (overrides settings)
    #[arg(short, long, value_name = "local|remote")]
    pub backend: Option<Source>,

    /// Do not retry on the other backend when the preferred one fails
    #[arg(long)]
    pub no_fallback: bool,

    /// Proxy API instance URL (overrides settings)
    #[arg(long, value_name = "URL")]
    pub instance: Option<String>,

    /// Number of top-level pages to load
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Expand every comment that has replies
    #[arg(short, long)]
    pub replies: bool,

    /// Print comments as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Copy error details to the clipboard when a backend fails
    #[arg(long)]
    pub copy_errors: bool,

    /// Text width for wrapping
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect settings
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show path of the settings file
    Path,
    /// Print the effective settings as TOML
    Show,
    /// Write a settings file with default values
    Init,
}
