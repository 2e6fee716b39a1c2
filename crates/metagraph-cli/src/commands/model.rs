//! Model registry commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::App;
use crate::output;

#[derive(Subcommand)]
pub enum ModelCommands {
    /// List the dataset's models
    List,

    /// Show one model
    Show {
        /// Model name
        name: String,
    },

    /// Create a model
    Create {
        /// Model name ([A-Za-z_][A-Za-z0-9_]*)
        name: String,

        /// Display name (defaults to the name)
        #[arg(long)]
        display_name: Option<String>,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Node id of the acting user
        #[arg(long, env = "METAGRAPH_ACTOR")]
        actor: String,
    },

    /// List a model's properties
    Props {
        /// Model name
        name: String,
    },
}

pub async fn execute(cmd: ModelCommands, app: &App) -> Result<()> {
    let scope = app.scope()?;
    let store = app.store().await?;

    match cmd {
        ModelCommands::List => {
            let models = store.get_models(scope).await?;
            let models: Vec<_> = models.into_values().collect();
            if app.json {
                output::print_json(&models)
            } else {
                output::print_models_table(&models);
                Ok(())
            }
        }
        ModelCommands::Show { name } => {
            let model = store.get_model_by_name(scope, &name).await?;
            if app.json {
                output::print_json(&model)
            } else {
                output::print_model(&model);
                Ok(())
            }
        }
        ModelCommands::Create {
            name,
            display_name,
            description,
            actor,
        } => {
            let display_name = display_name.unwrap_or_else(|| name.clone());
            let model = store
                .create_model(scope, &name, &display_name, &description, &actor)
                .await?;
            if app.json {
                output::print_json(&model)
            } else {
                println!("{} Created model {}", "✓".green(), model.name.cyan().bold());
                println!();
                output::print_model(&model);
                Ok(())
            }
        }
        ModelCommands::Props { name } => {
            let properties = store.get_model_properties(scope, &name).await?;
            if app.json {
                output::print_json(&properties)
            } else {
                output::print_properties_table(&name, &properties);
                Ok(())
            }
        }
    }
}
