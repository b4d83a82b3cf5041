//! docvec
//!
//! Embedded document collections with similarity search.
//!
//! # Usage
//!
//! ```bash
//! docvec add --collection notes --file docs.jsonl [--concurrency N]
//! docvec query --collection notes "what is rust" [-n 5] [--where lang=en]
//! docvec count --collection notes
//! docvec config
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/docvec/config.toml)
//! 3. Environment variables (DOCVEC_*)
//! 4. CLI flags

use std::path::Path;

use anyhow::Result;
use clap::Parser;

use docvec_cli::{
    build_embedder, content_filter, handle_add, handle_count, handle_query, init_logging,
    resolve_settings, show_config, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = resolve_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.persist_dir.as_deref(),
    )?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::Add {
            collection,
            file,
            concurrency,
            metadata,
        } => {
            let embedder = build_embedder(&settings)?;
            let count = handle_add(
                &settings,
                embedder,
                &collection,
                Path::new(&file),
                concurrency,
                metadata,
            )
            .await?;
            println!("{count}");
        }
        Commands::Query {
            collection,
            text,
            n_results,
            where_metadata,
            contains,
            not_contains,
        } => {
            let embedder = build_embedder(&settings)?;
            let results = handle_query(
                &settings,
                embedder,
                &collection,
                &text,
                n_results,
                where_metadata,
                content_filter(contains, not_contains),
            )
            .await?;
            for result in results {
                println!("{result}");
            }
        }
        Commands::Count { collection } => {
            let embedder = build_embedder(&settings)?;
            println!("{}", handle_count(&settings, embedder, &collection).await?);
        }
        Commands::Config => {
            print!("{}", show_config(&settings)?);
        }
    }

    Ok(())
}
