//! Seed command - one-time import of the challenge and conversation documents

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};

use kataboard_server::db::create_pool_with_options;
use kataboard_server::seed::{self, SeedSources};

use crate::config::KataboardConfig;

/// Arguments for the seed command
#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("documents")
        .required(true)
        .multiple(true)
        .args(["challenges", "conversations"])
))]
pub struct SeedArgs {
    /// JSON document with a `coding_challenges` array
    #[arg(long, value_name = "PATH")]
    pub challenges: Option<PathBuf>,

    /// JSON document with a `support_conversations` array
    #[arg(long, value_name = "PATH")]
    pub conversations: Option<PathBuf>,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Create the schema and import the documents
pub async fn run_seed(args: SeedArgs, config: KataboardConfig) -> Result<()> {
    let (database_url, max_connections) = config.database_target(args.database_url, None);

    let pool = create_pool_with_options(&database_url, max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", database_url))?;

    let sources = SeedSources {
        challenges: args.challenges,
        conversations: args.conversations,
    };

    let summary = seed::run(&pool, &sources)
        .await
        .context("Seeding failed")?;

    pool.close().await;

    println!(
        "Imported {} challenges, {} conversations ({} posts)",
        summary.challenges, summary.conversations, summary.posts
    );
    Ok(())
}
