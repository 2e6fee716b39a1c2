//! Organization/dataset bootstrap.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::App;

#[derive(Subcommand)]
pub enum ScopeCommands {
    /// Create the organization and dataset nodes if missing
    Init {
        /// Organization node id to record
        #[arg(long)]
        organization_node_id: Option<String>,

        /// Dataset node id to record
        #[arg(long)]
        dataset_node_id: Option<String>,
    },
}

pub async fn execute(cmd: ScopeCommands, app: &App) -> Result<()> {
    match cmd {
        ScopeCommands::Init {
            organization_node_id,
            dataset_node_id,
        } => {
            let scope = app.scope()?;
            let store = app.store().await?;
            store
                .init_org_and_dataset(scope, organization_node_id.as_deref(), dataset_node_id.as_deref())
                .await?;

            if app.json {
                crate::output::print_json(&scope)
            } else {
                println!(
                    "{} Dataset {} ready in organization {}",
                    "✓".green(),
                    scope.dataset_id.to_string().cyan(),
                    scope.organization_id.to_string().cyan()
                );
                Ok(())
            }
        }
    }
}
