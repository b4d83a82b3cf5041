//! docvec CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (add, query, count, config)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    build_embedder, content_filter, handle_add, handle_count, handle_query, init_logging,
    read_documents, resolve_settings, show_config,
};
