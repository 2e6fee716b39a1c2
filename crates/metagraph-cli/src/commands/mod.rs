//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use metagraph_core::schema::Scope;
use metagraph_db::{DbPool, SqliteAncestors};
use metagraph_graph::{GraphClient, ModelStore};

use crate::config::MetagraphConfig;

pub mod link;
pub mod model;
pub mod package;
pub mod query;
pub mod schema;
pub mod scope;

/// Metagraph - schema-on-read metadata over a property graph
#[derive(Parser)]
#[command(name = "metagraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file (defaults to ./metagraph.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Dataset id
    #[arg(short, long, global = true, env = "METAGRAPH_DATASET_ID")]
    pub dataset: Option<i64>,

    /// Organization id
    #[arg(short, long, global = true, env = "METAGRAPH_ORGANIZATION_ID")]
    pub organization: Option<i64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Graph constraints and indexes
    #[command(subcommand)]
    Schema(schema::SchemaCommands),

    /// Organization and dataset nodes
    #[command(subcommand)]
    Scope(scope::ScopeCommands),

    /// Model registry
    #[command(subcommand)]
    Model(model::ModelCommands),

    /// Query records of a model
    Query(query::QueryArgs),

    /// Suggest values of a model property
    Autocomplete(query::AutocompleteArgs),

    /// Link records through a model relationship
    Link(link::LinkArgs),

    /// Package hierarchy
    #[command(subcommand)]
    Package(package::PackageCommands),
}

/// Everything a command needs besides its own arguments.
pub struct App {
    pub config: MetagraphConfig,
    pub json: bool,
    dataset: Option<i64>,
    organization: Option<i64>,
}

impl App {
    /// Dataset and organization given on the command line or in the environment.
    pub fn scope(&self) -> Result<Scope> {
        let dataset = self
            .dataset
            .context("No dataset given. Pass --dataset or set METAGRAPH_DATASET_ID.")?;
        let organization = self
            .organization
            .context("No organization given. Pass --organization or set METAGRAPH_ORGANIZATION_ID.")?;
        Ok(Scope::new(dataset, organization))
    }

    /// Connect to the graph and build a store over it.
    pub async fn store(&self) -> Result<ModelStore<GraphClient>> {
        let client = GraphClient::connect(&self.config.graph)
            .await
            .with_context(|| format!("Failed to connect to {}", self.config.graph.uri))?;
        Ok(ModelStore::new(client)
            .with_default_limit(self.config.query.default_limit)
            .with_max_hops(self.config.query.max_hops))
    }

    /// Open the package database, creating and migrating it as needed.
    pub fn packages(&self) -> Result<DbPool> {
        let path = &self.config.packages.path;
        metagraph_db::init_pool(path).with_context(|| format!("Failed to open package database {}", path.display()))
    }

    /// A store that can also resolve package ancestry.
    pub async fn store_with_packages(&self) -> Result<ModelStore<GraphClient>> {
        let ancestors = SqliteAncestors::new(self.packages()?);
        Ok(self.store().await?.with_ancestors(Arc::new(ancestors)))
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let app = App {
            config: MetagraphConfig::load(self.config.as_deref())?,
            json: self.json,
            dataset: self.dataset,
            organization: self.organization,
        };

        match self.command {
            Commands::Schema(cmd) => schema::execute(cmd, &app).await,
            Commands::Scope(cmd) => scope::execute(cmd, &app).await,
            Commands::Model(cmd) => model::execute(cmd, &app).await,
            Commands::Query(args) => query::execute_query(args, &app).await,
            Commands::Autocomplete(args) => query::execute_autocomplete(args, &app).await,
            Commands::Link(args) => link::execute(args, &app).await,
            Commands::Package(cmd) => package::execute(cmd, &app).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_scope_flags() {
        let cli = Cli::try_parse_from([
            "metagraph", "model", "list", "--dataset", "7", "--organization", "3", "--json",
        ])
        .unwrap();
        assert_eq!(cli.dataset, Some(7));
        assert_eq!(cli.organization, Some(3));
        assert!(cli.json);
    }
}
