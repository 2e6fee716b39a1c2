//! Package hierarchy commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use metagraph_db::queries::packages;

use super::App;
use crate::output;

#[derive(Subcommand)]
pub enum PackageCommands {
    /// Records attached to a package or any folder above it
    Records {
        /// Package node id
        node_id: String,

        /// Inbound hops searched from each package
        #[arg(long, default_value = "3")]
        depth: u32,
    },

    /// Show a package, its path and its children
    Show {
        /// Package node id
        node_id: String,
    },

    /// Add or move a package in the hierarchy
    Add {
        /// Package node id
        node_id: String,

        /// Package name
        name: String,

        /// Node id of the parent folder
        #[arg(long)]
        parent: Option<String>,
    },
}

pub async fn execute(cmd: PackageCommands, app: &App) -> Result<()> {
    match cmd {
        PackageCommands::Records { node_id, depth } => {
            let scope = app.scope()?;
            let store = app.store_with_packages().await?;
            let records = store.records_for_package(scope, &node_id, depth).await?;
            if app.json {
                output::print_json(&records)
            } else {
                output::print_package_records(&node_id, &records);
                Ok(())
            }
        }
        PackageCommands::Show { node_id } => {
            let pool = app.packages()?;
            let package = packages::get_package(&pool, &node_id)?;
            let chain = packages::get_package_ancestors(&pool, &node_id)?;
            let children = packages::list_children(&pool, &node_id)?;
            let path: Vec<_> = chain.iter().rev().map(|p| p.name.as_str()).collect();
            if app.json {
                output::print_json(&serde_json::json!({
                    "id": package.id,
                    "parentId": package.parent_id,
                    "name": package.name,
                    "nodeId": package.node_id,
                    "path": path,
                    "children": children.iter().map(|c| &c.node_id).collect::<Vec<_>>(),
                }))
            } else {
                println!("{} {}", package.name.cyan().bold(), format!("({})", package.node_id).dimmed());
                println!("{}", "─".repeat(50));
                println!("{}: {}", "Path".bold(), path.join(" / "));
                println!("{}: {}", "Updated".bold(), package.updated_at);
                if children.is_empty() {
                    println!("{}", "No children.".dimmed());
                } else {
                    for child in &children {
                        println!("  {} {} {}", "→".dimmed(), child.name, child.node_id.dimmed());
                    }
                }
                Ok(())
            }
        }
        PackageCommands::Add { node_id, name, parent } => {
            let pool = app.packages()?;
            let package = packages::upsert_package(&pool, &node_id, &name, parent.as_deref())?;
            let chain = packages::get_package_ancestors(&pool, &node_id)?;
            if app.json {
                output::print_json(&serde_json::json!({
                    "id": package.id,
                    "parentId": package.parent_id,
                    "name": package.name,
                    "nodeId": package.node_id,
                    "path": chain.iter().rev().map(|p| p.name.as_str()).collect::<Vec<_>>(),
                }))
            } else {
                let path: Vec<_> = chain.iter().rev().map(|p| p.name.as_str()).collect();
                println!("{} {} {}", "✓".green(), package.node_id.cyan(), format!("({})", package.id).dimmed());
                println!("  {}", path.join(" / "));
                Ok(())
            }
        }
    }
}
