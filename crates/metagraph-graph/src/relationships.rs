//! Relationship writer: typed, idempotent edges between existing records.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use metagraph_core::record::RecordRelationship;
use metagraph_core::schema::{ModelRelationship, RelationshipKey, Scope};
use metagraph_core::statement::escape_identifier;
use metagraph_core::{MetagraphError, MetagraphResult, Statement};

use crate::engine::{finish, GraphEngine, GraphTransaction, Row};

/// Link `from_ids[i]` to `to_ids[i]` for every `i` through the model
/// relationship named by `key`.
///
/// Edges always point from records of the model the schema declares as the
/// relationship start, whatever order the request names the models in.
/// Re-linking an existing pair only refreshes its update stamp.
pub async fn create_relationships<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    actor: &str,
    key: &RelationshipKey,
    from_ids: &[String],
    to_ids: &[String],
) -> MetagraphResult<Vec<RecordRelationship>> {
    if from_ids.len() != to_ids.len() {
        return Err(MetagraphError::MismatchedListLengths {
            from: from_ids.len(),
            to: to_ids.len(),
        });
    }

    let relationship = resolve_relationship(engine, scope, key).await?;
    if from_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut txn = engine.begin().await?;
    let outcome = link(&mut txn, actor, &relationship, from_ids, to_ids).await;
    let edges = finish(txn, outcome).await?;

    info!(
        relationship = %relationship.relationship_type,
        edges = edges.len(),
        "Linked records"
    );
    Ok(edges)
}

/// Find the model relationship `key` names, stored in either direction.
///
/// When the name is declared both ways between the two models, the one
/// starting at `key.from_model` wins.
pub async fn resolve_relationship<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    key: &RelationshipKey,
) -> MetagraphResult<ModelRelationship> {
    let statement = Statement::new(
        "MATCH (m0:Model {name: $from_model})-[r0:`@RELATED_TO` {display_name: $relationship}]-(m1:Model {name: $to_model}) \
         MATCH (m0)-[:`@IN_DATASET`]->(d:Dataset {id: $dataset_id})-[:`@IN_ORGANIZATION`]->(:Organization {id: $organization_id}) \
         MATCH (m1)-[:`@IN_DATASET`]->(d) \
         WITH r0, m0, m1, startNode(r0) = m0 AS forward \
         ORDER BY forward DESC, r0.id \
         LIMIT 1 \
         RETURN r0.id AS id, r0.type AS type, r0.display_name AS display_name, \
                startNode(r0).id AS start_model_id, m0.id AS from_model_id, m1.id AS to_model_id",
    )
    .param("from_model", key.from_model.as_str())
    .param("relationship", key.relationship.as_str())
    .param("to_model", key.to_model.as_str())
    .param("dataset_id", scope.dataset_id)
    .param("organization_id", scope.organization_id);

    let rows = engine.run(statement).await?;
    let forward = rows.iter().find(|row| {
        matches!(
            (row.opt_string("start_model_id"), row.opt_string("from_model_id")),
            (Ok(Some(start)), Ok(Some(from))) if start == from
        )
    });
    let row = forward.or(rows.first()).ok_or_else(|| MetagraphError::RelationshipNotFound {
        from_model: key.from_model.clone(),
        relationship: key.relationship.clone(),
        to_model: key.to_model.clone(),
    })?;

    Ok(ModelRelationship {
        id: row.string("id")?,
        relationship_type: row.string("type")?,
        display_name: row.string("display_name")?,
        start_model_id: row.string("start_model_id")?,
        from_model_id: row.string("from_model_id")?,
        to_model_id: row.string("to_model_id")?,
    })
}

async fn link<T: GraphTransaction>(
    txn: &mut T,
    actor: &str,
    relationship: &ModelRelationship,
    from_ids: &[String],
    to_ids: &[String],
) -> MetagraphResult<Vec<RecordRelationship>> {
    require_records(txn, relationship, from_ids, to_ids).await?;

    let (origins, targets) = if relationship.is_reversed() {
        (to_ids, from_ids)
    } else {
        (from_ids, to_ids)
    };

    let ids: Vec<String> = origins.iter().map(|_| Uuid::new_v4().to_string()).collect();
    let statement = Statement::new(format!(
        "UNWIND range(0, size($origins) - 1) AS i \
         MATCH (from:Record {{`@id`: $origins[i]}}) \
         MATCH (to:Record {{`@id`: $targets[i]}}) \
         MERGE (from)-[rel:{rel_type}]->(to) \
         ON CREATE SET rel.id = $ids[i], rel.model_relationship_id = $model_relationship_id, \
                       rel.created_by = $actor, rel.created_at = datetime($now), \
                       rel.updated_by = $actor, rel.updated_at = datetime($now) \
         ON MATCH SET rel.updated_by = $actor, rel.updated_at = datetime($now) \
         RETURN rel.id AS id, from.`@id` AS from, to.`@id` AS to, \
                rel.model_relationship_id AS model_relationship_id, \
                rel.created_by AS created_by, toString(rel.created_at) AS created_at, \
                rel.updated_by AS updated_by, toString(rel.updated_at) AS updated_at",
        rel_type = escape_identifier(&relationship.relationship_type),
    ))
    .param("origins", origins.to_vec())
    .param("targets", targets.to_vec())
    .param("ids", ids)
    .param("model_relationship_id", relationship.id.as_str())
    .param("actor", actor)
    .param("now", Utc::now());

    let rows = txn.run(statement).await?;
    rows.iter()
        .map(|row| edge_from_row(row, &relationship.relationship_type))
        .collect()
}

/// Fail with the first id that is not a record of its side's model.
async fn require_records<T: GraphTransaction>(
    txn: &mut T,
    relationship: &ModelRelationship,
    from_ids: &[String],
    to_ids: &[String],
) -> MetagraphResult<()> {
    let statement = Statement::new(
        "OPTIONAL MATCH (r:Record)-[:`@INSTANCE_OF`]->(:Model {id: $from_model_id}) \
         WHERE r.`@id` IN $from_ids \
         RETURN 'from' AS side, collect(DISTINCT r.`@id`) AS ids \
         UNION ALL \
         OPTIONAL MATCH (r:Record)-[:`@INSTANCE_OF`]->(:Model {id: $to_model_id}) \
         WHERE r.`@id` IN $to_ids \
         RETURN 'to' AS side, collect(DISTINCT r.`@id`) AS ids",
    )
    .param("from_model_id", relationship.from_model_id.as_str())
    .param("to_model_id", relationship.to_model_id.as_str())
    .param("from_ids", from_ids.to_vec())
    .param("to_ids", to_ids.to_vec());

    let rows = txn.run(statement).await?;
    let mut found_from = Vec::new();
    let mut found_to = Vec::new();
    for row in &rows {
        match row.string("side")?.as_str() {
            "from" => found_from = row.strings("ids")?,
            _ => found_to = row.strings("ids")?,
        }
    }

    let missing = from_ids
        .iter()
        .find(|id| !found_from.contains(id))
        .or_else(|| to_ids.iter().find(|id| !found_to.contains(id)));
    if let Some(id) = missing {
        return Err(MetagraphError::RecordNotFound(id.clone()));
    }

    debug!(records = from_ids.len() + to_ids.len(), "All records present");
    Ok(())
}

fn edge_from_row(row: &Row, relationship_type: &str) -> MetagraphResult<RecordRelationship> {
    Ok(RecordRelationship {
        id: row.string("id")?,
        from: row.string("from")?,
        to: row.string("to")?,
        relationship_type: relationship_type.to_string(),
        model_relationship_id: row.string("model_relationship_id")?,
        created_by: row.string("created_by")?,
        created_at: row.timestamp("created_at")?,
        updated_by: row.string("updated_by")?,
        updated_at: row.timestamp("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::testing::{row, Event, FakeEngine};
    use metagraph_core::Value;

    fn strings(items: &[String]) -> Value {
        Value::List(items.iter().map(Value::from).collect())
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// `belongs_to_subject` declared between visit and patient, starting at
    /// `start_model_id`, with records p1, p2 and v1, v2. Edges are kept so
    /// repeated runs can be observed.
    fn linking_engine_from(start_model_id: &'static str) -> FakeEngine {
        type Edge = (String, String, String, String);
        let edges: Mutex<BTreeMap<(String, String), Edge>> = Mutex::new(BTreeMap::new());

        FakeEngine::new(move |stmt: &Statement| {
            let text = stmt.text();
            if text.contains("startNode(r0)") {
                Ok(vec![row([
                    ("id", Value::from("mr-1")),
                    ("type", Value::from("belongs_to_subject")),
                    ("display_name", Value::from("belongs_to_subject")),
                    ("start_model_id", Value::from(start_model_id)),
                    ("from_model_id", Value::from("visit-id")),
                    ("to_model_id", Value::from("patient-id")),
                ])])
            } else if text.contains("UNION ALL") {
                let known = |key: &str, pool: &[&str]| {
                    list_param(stmt, key)
                        .into_iter()
                        .filter(|id| pool.contains(&id.as_str()))
                        .collect::<Vec<_>>()
                };
                Ok(vec![
                    row([("side", Value::from("from")), ("ids", strings(&known("from_ids", &["v1", "v2"])))]),
                    row([("side", Value::from("to")), ("ids", strings(&known("to_ids", &["p1", "p2"])))]),
                ])
            } else if text.contains("MERGE (from)") {
                let origins = list_param(stmt, "origins");
                let targets = list_param(stmt, "targets");
                let new_ids = list_param(stmt, "ids");
                let now = stmt.get_param("now").unwrap().as_timestamp().unwrap().to_rfc3339();
                let mut edges = edges.lock().unwrap();
                let rows = origins
                    .iter()
                    .zip(&targets)
                    .zip(&new_ids)
                    .map(|((from, to), new_id)| {
                        let edge = edges
                            .entry((from.clone(), to.clone()))
                            .and_modify(|e| e.3 = now.clone())
                            .or_insert_with(|| (new_id.clone(), "mr-1".into(), now.clone(), now.clone()));
                        row([
                            ("id", Value::from(edge.0.as_str())),
                            ("from", Value::from(from.as_str())),
                            ("to", Value::from(to.as_str())),
                            ("model_relationship_id", Value::from(edge.1.as_str())),
                            ("created_by", Value::from("N:user:1")),
                            ("created_at", Value::from(edge.2.as_str())),
                            ("updated_by", Value::from("N:user:1")),
                            ("updated_at", Value::from(edge.3.as_str())),
                        ])
                    })
                    .collect();
                Ok(rows)
            } else {
                Ok(Vec::new())
            }
        })
    }

    /// Patient -> Visit, the reverse of the request order used below.
    fn linking_engine() -> FakeEngine {
        linking_engine_from("patient-id")
    }

    fn relationship_row(id: &str, start_model_id: &str) -> crate::engine::Row {
        row([
            ("id", Value::from(id)),
            ("type", Value::from(format!("linked_{id}"))),
            ("display_name", Value::from("linked")),
            ("start_model_id", Value::from(start_model_id)),
            ("from_model_id", Value::from("visit-id")),
            ("to_model_id", Value::from("patient-id")),
        ])
    }

    fn list_param(statement: &Statement, key: &str) -> Vec<String> {
        statement
            .get_param(key)
            .and_then(Value::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    fn key() -> RelationshipKey {
        RelationshipKey::new("visit", "belongs_to_subject", "patient")
    }

    #[tokio::test]
    async fn test_mismatched_lengths_make_no_engine_call() {
        let engine = FakeEngine::empty();
        let err = create_relationships(&engine, Scope::new(1, 1), "N:user:1", &key(), &ids(&["v1", "v2"]), &ids(&["p1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, MetagraphError::MismatchedListLengths { from: 2, to: 1 }));
        assert!(engine.events().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_relationship() {
        let engine = FakeEngine::empty();
        let err = create_relationships(&engine, Scope::new(1, 1), "N:user:1", &key(), &ids(&["v1"]), &ids(&["p1"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MetagraphError::RelationshipNotFound { from_model, relationship, to_model }
                if from_model == "visit" && relationship == "belongs_to_subject" && to_model == "patient"
        ));
    }

    #[tokio::test]
    async fn test_edges_follow_declared_start_model() {
        let engine = linking_engine();
        let edges = create_relationships(
            &engine,
            Scope::new(1, 1),
            "N:user:1",
            &key(),
            &ids(&["v1", "v2"]),
            &ids(&["p1", "p2"]),
        )
        .await
        .unwrap();

        assert_eq!(edges.len(), 2);
        assert_eq!((edges[0].from.as_str(), edges[0].to.as_str()), ("p1", "v1"));
        assert_eq!((edges[1].from.as_str(), edges[1].to.as_str()), ("p2", "v2"));
        assert_eq!(edges[0].relationship_type, "belongs_to_subject");
        assert_eq!(edges[0].model_relationship_id, "mr-1");

        let upsert = engine.statements().pop().unwrap();
        assert!(upsert.text().contains("MERGE (from)-[rel:`belongs_to_subject`]->(to)"));
        assert_eq!(list_param(&upsert, "origins"), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_relinking_is_idempotent() {
        let engine = linking_engine();
        let scope = Scope::new(1, 1);
        let first = create_relationships(&engine, scope, "N:user:1", &key(), &ids(&["v1"]), &ids(&["p1"]))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = create_relationships(&engine, scope, "N:user:1", &key(), &ids(&["v1"]), &ids(&["p1"]))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[0].created_at, second[0].created_at);
        assert!(second[0].updated_at > first[0].updated_at);
    }

    #[tokio::test]
    async fn test_missing_record_rolls_back() {
        let engine = linking_engine();
        let err = create_relationships(
            &engine,
            Scope::new(1, 1),
            "N:user:1",
            &key(),
            &ids(&["v1", "v9"]),
            &ids(&["p1", "p2"]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MetagraphError::RecordNotFound(id) if id == "v9"));

        let events = engine.events();
        assert_eq!(events.last(), Some(&Event::Rollback));
        assert!(!engine.statements().iter().any(|s| s.text().contains("MERGE (from)")));
        assert!(!events.contains(&Event::Commit));
    }

    #[tokio::test]
    async fn test_to_side_checked_against_to_model() {
        let engine = linking_engine();
        let err = create_relationships(
            &engine,
            Scope::new(1, 1),
            "N:user:1",
            &key(),
            &ids(&["v1"]),
            &ids(&["v2"]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MetagraphError::RecordNotFound(id) if id == "v2"));
    }

    #[tokio::test]
    async fn test_forward_declaration_keeps_request_order() {
        let engine = linking_engine_from("visit-id");
        let edges = create_relationships(
            &engine,
            Scope::new(1, 1),
            "N:user:1",
            &key(),
            &ids(&["v1", "v2"]),
            &ids(&["p1", "p2"]),
        )
        .await
        .unwrap();

        assert_eq!((edges[0].from.as_str(), edges[0].to.as_str()), ("v1", "p1"));
        assert_eq!((edges[1].from.as_str(), edges[1].to.as_str()), ("v2", "p2"));
        let upsert = engine.statements().pop().unwrap();
        assert_eq!(list_param(&upsert, "origins"), vec!["v1", "v2"]);
        assert_eq!(list_param(&upsert, "targets"), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_name_declared_both_ways_prefers_request_direction() {
        let engine = FakeEngine::new(|_| {
            Ok(vec![
                relationship_row("mr-rev", "patient-id"),
                relationship_row("mr-fwd", "visit-id"),
            ])
        });
        let key = RelationshipKey::new("visit", "linked", "patient");

        let relationship = resolve_relationship(&engine, Scope::new(1, 1), &key).await.unwrap();
        assert_eq!(relationship.id, "mr-fwd");
        assert!(!relationship.is_reversed());

        let stmt = &engine.statements()[0];
        assert!(stmt.text().contains("startNode(r0) = m0 AS forward"));
        assert!(stmt.text().contains("ORDER BY forward DESC"));
    }

    #[tokio::test]
    async fn test_reverse_declaration_used_when_only_one() {
        let engine = FakeEngine::new(|_| Ok(vec![relationship_row("mr-rev", "patient-id")]));
        let key = RelationshipKey::new("visit", "linked", "patient");

        let relationship = resolve_relationship(&engine, Scope::new(1, 1), &key).await.unwrap();
        assert_eq!(relationship.id, "mr-rev");
        assert!(relationship.is_reversed());
    }
}
