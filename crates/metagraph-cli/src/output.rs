//! Terminal output formatting.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use metagraph_core::query::QueryPage;
use metagraph_core::record::{PackageRecord, Record, RecordRelationship};
use metagraph_core::schema::{Model, ModelProperty};
use metagraph_core::Value;

/// Print any result as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print models as a table.
pub fn print_models_table(models: &[Model]) {
    if models.is_empty() {
        println!("{}", "No models found.".dimmed());
        return;
    }

    println!("{:<24} {:<28} {:>8} {:>10}", "Name", "Display name", "Records", "Properties");
    println!("{}", "─".repeat(73));

    for model in models {
        println!(
            "{:<24} {:<28} {:>8} {:>10}",
            truncate(&model.name, 22).cyan(),
            truncate(&model.display_name, 26),
            model.count,
            model.property_count
        );
    }

    println!();
    println!("{} model(s) total", models.len());
}

/// Print a single model.
pub fn print_model(model: &Model) {
    println!("{} {}", model.display_name.cyan().bold(), format!("({})", model.id).dimmed());
    if !model.description.is_empty() {
        println!("{}", model.description);
    }
    println!("{}", "─".repeat(50));
    println!("{}: {}", "Name".bold(), model.name);
    println!("{}: {}", "Records".bold(), model.count);
    println!(
        "{}: {} ({} linked)",
        "Properties".bold(),
        model.property_count,
        model.linked_property_count
    );
    println!("{}: {} at {}", "Created".bold(), model.created_by, model.created_at.to_rfc3339());
    println!("{}: {} at {}", "Updated".bold(), model.updated_by, model.updated_at.to_rfc3339());
}

/// Print a model's properties in display order.
pub fn print_properties_table(model: &str, properties: &[ModelProperty]) {
    if properties.is_empty() {
        println!("{}", format!("Model {} has no properties.", model).dimmed());
        return;
    }

    println!("{:>5} {:<24} {:<28} {:<12}", "#", "Name", "Display name", "Type");
    println!("{}", "─".repeat(72));

    for property in properties {
        let name = if property.is_title {
            property.name.yellow().bold()
        } else {
            property.name.normal()
        };
        println!(
            "{:>5} {:<24} {:<28} {:<12}",
            property.index,
            name,
            truncate(&property.display_name, 26),
            property.data_type.to_string()
        );
    }
}

/// Print one page of query results.
pub fn print_page(page: &QueryPage) {
    println!(
        "{} {} {}",
        page.model.cyan().bold(),
        format!("records {}-{}", page.offset + 1, page.offset as usize + page.records.len()).dimmed(),
        format!("of {}", page.total).dimmed()
    );
    println!("{}", "─".repeat(50));

    if page.records.is_empty() {
        println!("{}", "No records found.".dimmed());
        return;
    }

    for record in &page.records {
        print_record(record);
    }
}

fn print_record(record: &Record) {
    println!("{}", record.id.yellow());
    for (name, value) in &record.props {
        println!("  {}: {}", name.bold(), value);
    }
}

/// Print autocomplete suggestions.
pub fn print_values(values: &[Value]) {
    if values.is_empty() {
        println!("{}", "No matching values.".dimmed());
        return;
    }
    for value in values {
        println!("  {} {}", "→".dimmed(), value);
    }
}

/// Print record links.
pub fn print_relationships(links: &[RecordRelationship]) {
    for link in links {
        println!(
            "  {} {} {} {}",
            link.from.yellow(),
            format!("-[{}]->", link.relationship_type).dimmed(),
            link.to.yellow(),
            format!("({})", link.id).dimmed()
        );
    }
}

/// Print records reached from a package, grouped by origin.
pub fn print_package_records(package: &str, records: &[PackageRecord]) {
    println!("{} {}", "Records for package".bold(), package.cyan());
    println!("{}", "─".repeat(50));

    if records.is_empty() {
        println!("{}", "No records found.".dimmed());
        return;
    }

    let mut origin = None;
    for item in records {
        if origin != Some(item.origin.id) {
            origin = Some(item.origin.id);
            println!("{} {}", "from".dimmed(), item.origin.node_id.cyan());
        }
        println!("  {} {}", item.record.model.bold(), item.record.id.yellow());
    }

    println!();
    println!("{} record(s) total", records.len());
}

/// Truncate a string to `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("samples", 10), "samples");
        assert_eq!(truncate("blood_samples_collected", 10), "blood_s...");
        assert_eq!(truncate("ñandú_visits", 8), "ñandú...");
    }
}
