//! Graph schema commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::App;

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// Create constraints and indexes (idempotent)
    Init,
}

pub async fn execute(cmd: SchemaCommands, app: &App) -> Result<()> {
    match cmd {
        SchemaCommands::Init => {
            let store = app.store().await?;
            store.initialize_schema().await?;
            if app.json {
                crate::output::print_json(&serde_json::json!({ "initialized": true }))
            } else {
                println!("{} Graph schema initialized", "✓".green());
                Ok(())
            }
        }
    }
}
