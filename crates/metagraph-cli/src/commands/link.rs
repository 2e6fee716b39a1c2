//! Record linking.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use metagraph_core::schema::RelationshipKey;

use super::App;
use crate::output;

#[derive(Args)]
pub struct LinkArgs {
    /// Model of the `--from` records
    pub from_model: String,

    /// Relationship name
    pub relationship: String,

    /// Model of the `--to` records
    pub to_model: String,

    /// Record ids on the from side, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub from: Vec<String>,

    /// Record ids on the to side, paired by position with `--from`
    #[arg(long, value_delimiter = ',', required = true)]
    pub to: Vec<String>,

    /// Node id of the acting user
    #[arg(long, env = "METAGRAPH_ACTOR")]
    pub actor: String,
}

pub async fn execute(args: LinkArgs, app: &App) -> Result<()> {
    let scope = app.scope()?;
    let key = RelationshipKey::new(args.from_model, args.relationship, args.to_model);
    let store = app.store().await?;
    let links = store
        .create_relationships(scope, &args.actor, &key, &args.from, &args.to)
        .await?;

    if app.json {
        output::print_json(&links)
    } else {
        println!(
            "{} Linked {} record pair(s) through {}",
            "✓".green(),
            links.len().to_string().bold(),
            key.relationship.cyan()
        );
        output::print_relationships(&links);
        Ok(())
    }
}
