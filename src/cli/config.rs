use clap::{Parser, Subcommand};
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::Result;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "formscope",
    version,
    about = "Detect form fields in saved pages and fill them offline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: formscope.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the fields detected in an HTML file
    Detect {
        /// HTML file to scan
        #[arg(long)]
        html: String,

        /// CSS selector of the region to scan (default: best form-like region)
        #[arg(long)]
        container: Option<String>,

        /// Attach sample values to every field
        #[arg(long, default_value_t = false)]
        test_mode: bool,

        /// Output format: console, json
        #[arg(long, default_value = "console")]
        format: String,
    },

    /// Detect fields, apply values to them and report what happened
    Fill {
        /// HTML file to fill
        #[arg(long)]
        html: String,

        /// YAML or JSON map of field id, name or label to value
        #[arg(long)]
        values: String,

        /// JSONL file receiving injection state transitions
        #[arg(long)]
        trace: Option<String>,

        /// Write the filled page here
        #[arg(short, long)]
        output: Option<String>,
    },
}

// ============================================================================
// Config File Loading
// ============================================================================

pub const DEFAULT_CONFIG_PATH: &str = "formscope.yaml";

/// Parse an engine config from YAML text.
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    if content.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> EngineConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "malformed config, using defaults");
            EngineConfig::default()
        }),
        Err(_) => EngineConfig::default(),
    }
}
