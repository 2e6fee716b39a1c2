//! Record query and autocomplete commands.

use anyhow::{bail, Result};
use clap::Args;

use metagraph_core::query::{AutocompleteRequest, FilterRequest, Operator, QueryRequest};
use metagraph_core::Value;

use super::App;
use crate::output;

#[derive(Args)]
pub struct QueryArgs {
    /// Source model
    pub model: String,

    /// Filter as `model.property OP value`, e.g. `patient.age > 40`
    #[arg(short, long = "filter")]
    pub filters: Vec<String>,

    /// Sort property of the source model
    #[arg(long)]
    pub order_by: Option<String>,

    /// Page size
    #[arg(long)]
    pub limit: Option<u32>,

    /// Records to skip
    #[arg(long)]
    pub offset: Option<u32>,
}

#[derive(Args)]
pub struct AutocompleteArgs {
    /// Model owning the property
    pub model: String,

    /// Property to suggest values for
    pub property: String,

    /// Text the values must contain
    pub text: String,

    /// Filter as `model.property OP value`
    #[arg(short, long = "filter")]
    pub filters: Vec<String>,
}

pub async fn execute_query(args: QueryArgs, app: &App) -> Result<()> {
    let request = QueryRequest {
        model: args.model,
        filters: parse_filters(&args.filters)?,
        order_by: args.order_by,
        limit: args.limit,
        offset: args.offset,
    };

    let scope = app.scope()?;
    let page = app.store().await?.query_page(scope, &request).await?;
    if app.json {
        output::print_json(&page)
    } else {
        output::print_page(&page);
        Ok(())
    }
}

pub async fn execute_autocomplete(args: AutocompleteArgs, app: &App) -> Result<()> {
    let request = AutocompleteRequest {
        model: args.model,
        property: args.property,
        text: args.text,
        filters: parse_filters(&args.filters)?,
    };

    let scope = app.scope()?;
    let values = app.store().await?.autocomplete(scope, &request).await?;
    if app.json {
        output::print_json(&values)
    } else {
        output::print_values(&values);
        Ok(())
    }
}

fn parse_filters(filters: &[String]) -> Result<Vec<FilterRequest>> {
    filters.iter().map(String::as_str).map(parse_filter).collect()
}

/// Parse `model.property OP value`.
///
/// The operator may span several words (`STARTS WITH`); the longest match
/// wins. The value is read as JSON when it parses, otherwise as a string.
fn parse_filter(input: &str) -> Result<FilterRequest> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let Some((target, rest)) = tokens.split_first() else {
        bail!("Empty filter");
    };
    let Some((model, property)) = target.split_once('.') else {
        bail!("Filter must start with model.property: {input}");
    };
    if model.is_empty() || property.is_empty() {
        bail!("Filter must start with model.property: {input}");
    }

    let Some(width) = (1..=rest.len().min(3))
        .rev()
        .find(|&n| rest[..n].join(" ").parse::<Operator>().is_ok())
    else {
        bail!("No supported operator in filter: {input}");
    };

    let operator = rest[..width].join(" ");
    let raw = rest[width..].join(" ");
    if raw.is_empty() {
        bail!("Filter has no value: {input}");
    }

    Ok(FilterRequest {
        model: model.to_string(),
        property: property.to_string(),
        operator,
        value: parse_value(&raw),
    })
}

fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Value::from(json),
        Err(_) => Value::from(raw),
    }
}
