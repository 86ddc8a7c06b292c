use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

/// Arguments of the standalone `steptrack-daemon` binary.
#[derive(Parser, Debug)]
#[command(name = "steptrack-daemon", about = "Background step collector")]
pub struct DaemonArgs {
    /// Run in the current process instead of detaching.
    #[arg(long)]
    pub force: bool,
    /// Application directory holding prefs.json, config.json and logs.
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Mirror the log into the console.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
