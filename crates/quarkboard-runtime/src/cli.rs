//! Command-line arguments shared by Quarkboard host binaries.

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;

use crate::options::{Options, parse_option};

#[derive(Debug, Clone, Parser)]
#[command(name = "quarkboard")]
#[command(about = "Run a Quarkboard host")]
pub struct Cli {
    /// Configuration file to load instead of searching for `quarkboard.toml`.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Configuration profile, e.g. `production`.
    #[arg(long, env = "QUARKBOARD_PROFILE")]
    pub profile: Option<String>,

    /// Option passed to plugins as `key[=value]`. Repeatable.
    #[arg(long = "opt", short = 'o', value_name = "KEY[=VALUE]", value_parser = parse_option)]
    pub options: Vec<(String, Value)>,
}

impl Cli {
    /// The `--opt` values as an option table.
    pub fn option_table(&self) -> Options {
        self.options.iter().cloned().collect()
    }
}
