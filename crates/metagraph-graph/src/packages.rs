//! Records attached to a package or any of its ancestor folders.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use metagraph_core::record::{shape_record, OriginPackage, PackageRecord};
use metagraph_core::schema::Scope;
use metagraph_core::{AncestorLookup, MetagraphResult, Statement, Value};

use crate::engine::GraphEngine;

/// Every record within `max_depth` inbound hops of the package or one of
/// its ancestors, tagged with the closest package it was reached from.
///
/// A record is never attached at zero hops, so a `max_depth` of 0 searches
/// one hop like a `max_depth` of 1.
pub async fn records_for_package<E: GraphEngine>(
    engine: &E,
    ancestors: &dyn AncestorLookup,
    scope: Scope,
    package_node_id: &str,
    max_depth: u32,
) -> MetagraphResult<Vec<PackageRecord>> {
    let chain = ancestors.package_ancestors(package_node_id).await?;
    if chain.is_empty() {
        debug!(package = %package_node_id, "Package has no known hierarchy");
        return Ok(Vec::new());
    }

    // Closest package first.
    let rank: HashMap<i64, usize> = chain.iter().enumerate().map(|(i, p)| (p.id, i)).collect();

    let statement = Statement::new(format!(
        "MATCH (p:Package)<-[*1..{depth}]-(r:Record)-[:`@INSTANCE_OF`]->(m:Model)\
         -[:`@IN_DATASET`]->(:Dataset {{id: $dataset_id}})\
         -[:`@IN_ORGANIZATION`]->(:Organization {{id: $organization_id}}) \
         WHERE p.package_id IN $package_ids \
         RETURN DISTINCT properties(r) AS props, m.name AS model, \
                p.package_id AS origin_id, p.package_node_id AS origin_node_id",
        depth = max_depth.max(1),
    ))
    .param("dataset_id", scope.dataset_id)
    .param("organization_id", scope.organization_id)
    .param(
        "package_ids",
        Value::List(chain.iter().map(|p| Value::Integer(p.id)).collect()),
    );

    let mut rows = engine.run(statement).await?;
    rows.sort_by_key(|row| {
        row.get("origin_id")
            .and_then(Value::as_i64)
            .and_then(|id| rank.get(&id).copied())
            .unwrap_or(usize::MAX)
    });

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for mut row in rows {
        let model = row.string("model")?;
        let origin = OriginPackage {
            id: row.int("origin_id")?,
            node_id: row.string("origin_node_id")?,
        };
        let record = shape_record(&model, row.map("props")?)?;
        if seen.insert(record.id.clone()) {
            records.push(PackageRecord { record, origin });
        }
    }

    debug!(package = %package_node_id, records = records.len(), "Loaded package records");
    Ok(records)
}
