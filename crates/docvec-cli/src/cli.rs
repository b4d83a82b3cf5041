//! CLI argument parsing for docvec.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand};

/// docvec
///
/// Embedded document collections with similarity search.
#[derive(Parser, Debug)]
#[command(name = "docvec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/docvec/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override the directory collections are persisted to
    #[arg(long, global = true)]
    pub persist_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Collection commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add documents from a JSON-lines file (one document per line)
    Add {
        /// Collection name (created if missing)
        #[arg(long)]
        collection: String,

        /// JSON-lines file with {"id", "content", "embedding", "metadata"} objects
        #[arg(short, long)]
        file: String,

        /// Documents embedded concurrently (default from config)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Collection metadata used when the collection is created (key=value)
        #[arg(long = "meta", value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,
    },

    /// Query a collection by text similarity
    Query {
        /// Collection name
        #[arg(long)]
        collection: String,

        /// Query text
        text: String,

        /// Maximum results (default from config)
        #[arg(short = 'n', long)]
        n_results: Option<usize>,

        /// Metadata equality filter (key=value), repeatable
        #[arg(long = "where", value_parser = parse_key_val)]
        where_metadata: Vec<(String, String)>,

        /// Only documents whose content contains this text
        #[arg(long)]
        contains: Option<String>,

        /// Only documents whose content does not contain this text
        #[arg(long)]
        not_contains: Option<String>,
    },

    /// Print the number of documents in a collection
    Count {
        /// Collection name
        #[arg(long)]
        collection: String,
    },

    /// Print the effective configuration
    Config,
}

/// Parse a `key=value` pair.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
