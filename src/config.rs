use crate::debugger::{SessionOptions, DEFAULT_WINDOW_HEIGHT};
use clap::Parser;
use std::path::PathBuf;

/// Step an editor macro forward and backward. Meant to be spawned by the
/// editor, which talks to it over stdin/stdout.
#[derive(Parser, Debug, Clone)]
#[command(name = "macrobug")]
#[command(version)]
pub struct Config {
    /// Log file (stdout is reserved for the editor)
    #[arg(long, env = "MACROBUG_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "macrobug=trace". RUST_LOG wins if set.
    #[arg(long, env = "MACROBUG_LOG", default_value = "info")]
    pub log_level: String,

    /// Disable logging entirely
    #[arg(long)]
    pub no_log: bool,

    /// Height of the macro input window
    #[arg(long, default_value_t = DEFAULT_WINDOW_HEIGHT, value_parser = clap::value_parser!(u32).range(1..))]
    pub window_height: u32,
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("macrobug.log"))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            window_height: self.window_height,
        }
    }
}
