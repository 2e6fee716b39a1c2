//! Neo4j schema initialization (constraints and indexes).

use tracing::info;

use metagraph_core::{MetagraphResult, Statement};

use crate::engine::GraphEngine;

/// Cypher statements for schema initialization.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // Uniqueness constraints
    "CREATE CONSTRAINT model_id IF NOT EXISTS FOR (m:Model) REQUIRE m.id IS UNIQUE",
    "CREATE CONSTRAINT model_scoped_name IF NOT EXISTS FOR (m:Model) REQUIRE m.`@scoped_name` IS UNIQUE",
    "CREATE CONSTRAINT model_property_id IF NOT EXISTS FOR (p:ModelProperty) REQUIRE p.id IS UNIQUE",
    "CREATE CONSTRAINT record_id IF NOT EXISTS FOR (r:Record) REQUIRE r.`@id` IS UNIQUE",
    "CREATE CONSTRAINT organization_id IF NOT EXISTS FOR (o:Organization) REQUIRE o.id IS UNIQUE",
    "CREATE CONSTRAINT user_node_id IF NOT EXISTS FOR (u:User) REQUIRE u.node_id IS UNIQUE",
    // Lookup indexes
    "CREATE INDEX dataset_id IF NOT EXISTS FOR (d:Dataset) ON (d.id)",
    "CREATE INDEX package_id IF NOT EXISTS FOR (p:Package) ON (p.package_id)",
];

/// Initialize Neo4j schema with constraints and indexes.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses.
pub async fn initialize_schema<E: GraphEngine>(engine: &E) -> MetagraphResult<()> {
    info!("Initializing Neo4j schema...");

    for statement in SCHEMA_STATEMENTS {
        engine.run(Statement::new(*statement)).await?;
    }

    info!("Neo4j schema initialized ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}
