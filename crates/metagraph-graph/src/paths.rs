//! Shortest-path resolution between models of one dataset.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use metagraph_core::query::{Path, Waypoint};
use metagraph_core::schema::Model;
use metagraph_core::{MetagraphError, MetagraphResult, Statement, Value};

use crate::engine::{GraphEngine, Row};

/// One shortest path from `source` to each model in `targets` (name -> id),
/// at most `max_hops` long, over schema relationships in either direction.
///
/// Paths come back in target-name order. An unreachable target fails the
/// whole call. No targets means no engine call.
pub async fn resolve_paths<E: GraphEngine>(
    engine: &E,
    source: &Model,
    targets: &BTreeMap<String, String>,
    max_hops: u32,
) -> MetagraphResult<Vec<Path>> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let statement = Statement::new(format!(
        "MATCH (m:Model {{id: $source_id}})-[:`@IN_DATASET`]->(d:Dataset) \
         MATCH (n:Model)-[:`@IN_DATASET`]->(d) WHERE n.id IN $target_ids \
         MATCH p = shortestPath((m)-[:`@RELATED_TO`*..{max_hops}]-(n)) \
         RETURN n.id AS target_id, \
                [x IN nodes(p) | x.id] AS model_ids, \
                [x IN nodes(p) | x.name] AS model_names, \
                [r IN relationships(p) | r.type] AS hops"
    ))
    .param("source_id", source.id.as_str())
    .param(
        "target_ids",
        Value::List(targets.values().map(Value::from).collect()),
    );

    let rows = engine.run(statement).await?;
    let mut found = rows
        .iter()
        .map(|row| Ok((row.string("target_id")?, path_from_row(row)?)))
        .collect::<MetagraphResult<HashMap<_, _>>>()?;

    let mut paths = Vec::with_capacity(targets.len());
    for (name, id) in targets {
        let path = found.remove(id).ok_or_else(|| MetagraphError::PathNotFound {
            source_model: source.name.clone(),
            target: name.clone(),
            max_hops,
        })?;
        paths.push(path);
    }

    debug!(source = %source.name, paths = paths.len(), "Resolved shortest paths");
    Ok(paths)
}

fn path_from_row(row: &Row) -> MetagraphResult<Path> {
    let ids = row.strings("model_ids")?;
    let names = row.strings("model_names")?;
    if ids.len() != names.len() {
        return Err(MetagraphError::decode("path ids and names differ in length"));
    }
    let waypoints = ids
        .into_iter()
        .zip(names)
        .map(|(id, name)| Waypoint::new(id, name))
        .collect();
    Path::new(waypoints, row.strings("hops")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, FakeEngine};
    use chrono::Utc;

    fn model(id: &str, name: &str) -> Model {
        Model {
            id: id.into(),
            name: name.into(),
            display_name: name.into(),
            description: String::new(),
            count: 0,
            property_count: 0,
            linked_property_count: 0,
            created_by: "N:user:1".into(),
            created_at: Utc::now(),
            updated_by: "N:user:1".into(),
            updated_at: Utc::now(),
        }
    }

    fn strings(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[tokio::test]
    async fn test_no_targets_no_engine_call() {
        let engine = FakeEngine::empty();
        let paths = resolve_paths(&engine, &model("s", "samples"), &BTreeMap::new(), 4)
            .await
            .unwrap();
        assert!(paths.is_empty());
        assert!(engine.events().is_empty());
    }

    #[tokio::test]
    async fn test_paths_in_target_order() {
        let engine = FakeEngine::new(|_| {
            Ok(vec![
                row([
                    ("target_id", Value::from("st")),
                    ("model_ids", strings(&["s", "v", "st"])),
                    ("model_names", strings(&["samples", "visits", "study"])),
                    ("hops", strings(&["IN_VISIT", "IN_STUDY"])),
                ]),
                row([
                    ("target_id", Value::from("p")),
                    ("model_ids", strings(&["s", "v", "p"])),
                    ("model_names", strings(&["samples", "visits", "patient"])),
                    ("hops", strings(&["IN_VISIT", "OF_PATIENT"])),
                ]),
            ])
        });
        let targets = BTreeMap::from([
            ("study".to_string(), "st".to_string()),
            ("patient".to_string(), "p".to_string()),
        ]);
        let paths = resolve_paths(&engine, &model("s", "samples"), &targets, 4)
            .await
            .unwrap();
        assert_eq!(paths[0].target().model_name, "patient");
        assert_eq!(paths[1].target().model_name, "study");
        assert_eq!(paths[1].hops(), ["IN_VISIT", "IN_STUDY"]);

        let stmt = &engine.statements()[0];
        assert!(stmt.text().contains("*..4]"));
        assert_eq!(stmt.get_param("target_ids"), Some(&strings(&["p", "st"])));
    }

    #[tokio::test]
    async fn test_unreachable_target_fails() {
        let engine = FakeEngine::empty();
        let targets = BTreeMap::from([("patient".to_string(), "p".to_string())]);
        let err = resolve_paths(&engine, &model("s", "samples"), &targets, 4)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MetagraphError::PathNotFound { source_model, target, max_hops: 4 }
                if source_model == "samples" && target == "patient"
        ));
    }
}
