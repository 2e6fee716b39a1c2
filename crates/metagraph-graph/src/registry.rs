//! Schema registry: organizations, datasets, models and their properties.
//!
//! Graph layout:
//! - (:Dataset)-[:`@IN_ORGANIZATION`]->(:Organization)
//! - (:Model)-[:`@IN_DATASET`]->(:Dataset)
//! - (:Model)-[:`@CREATED_BY` {at}]->(:User), (:Model)-[:`@UPDATED_BY` {at}]->(:User)
//! - (:Model)-[:`@HAS_PROPERTY`]->(:ModelProperty)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use metagraph_core::naming::validate_model_name;
use metagraph_core::schema::{sort_properties, Model, ModelProperty, Scope};
use metagraph_core::{MetagraphError, MetagraphResult, Statement, Value};

use crate::engine::{finish, GraphEngine, GraphTransaction, Row};

const MODEL_COLUMNS: &str = "RETURN m.id AS id, m.name AS name, \
     m.display_name AS display_name, m.description AS description, \
     COUNT { ()-[:`@INSTANCE_OF`]->(m) } AS count, \
     COUNT { (m)-[:`@HAS_PROPERTY`]->() } AS static_property_count, \
     COUNT { (m)-[r:`@RELATED_TO`]->() WHERE r.index IS NOT NULL } AS linked_property_count, \
     c.node_id AS created_by, toString(created.at) AS created_at, \
     u.node_id AS updated_by, toString(updated.at) AS updated_at";

const MODEL_AUDIT: &str = "MATCH (m)-[created:`@CREATED_BY`]->(c:User) \
     MATCH (m)-[updated:`@UPDATED_BY`]->(u:User) ";

/// Ensure the organization and dataset nodes exist and are linked.
///
/// Node ids are only overwritten when a new value is supplied.
pub async fn init_org_and_dataset<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    organization_node_id: Option<&str>,
    dataset_node_id: Option<&str>,
) -> MetagraphResult<()> {
    let statement = Statement::new(
        "MERGE (o:Organization {id: $organization_id}) \
         SET o.node_id = coalesce($organization_node_id, o.node_id) \
         MERGE (o)<-[:`@IN_ORGANIZATION`]-(d:Dataset {id: $dataset_id}) \
         SET d.node_id = coalesce($dataset_node_id, d.node_id) \
         RETURN o.id AS organization_id, d.id AS dataset_id",
    )
    .param("organization_id", scope.organization_id)
    .param("dataset_id", scope.dataset_id)
    .param("organization_node_id", organization_node_id)
    .param("dataset_node_id", dataset_node_id);

    let rows = engine.run(statement).await?;
    if rows.is_empty() {
        return Err(MetagraphError::decode("scope bootstrap returned no row"));
    }

    info!(
        organization_id = scope.organization_id,
        dataset_id = scope.dataset_id,
        "Initialized organization and dataset"
    );
    Ok(())
}

/// Create a model, failing if the dataset already has one with that name.
///
/// The name is validated before any engine call. Existence check and
/// creation are a single `MERGE` on the dataset-scoped name, so concurrent
/// creates of the same name cannot both succeed. Models stored without a
/// scoped name are caught by a name match in the same statement; the
/// transaction is then rolled back.
pub async fn create_model<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    name: &str,
    display_name: &str,
    description: &str,
    actor: &str,
) -> MetagraphResult<Model> {
    let name = validate_model_name(name)?;
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let statement = Statement::new(
        "MATCH (d:Dataset {id: $dataset_id})-[:`@IN_ORGANIZATION`]->(:Organization {id: $organization_id}) \
         OPTIONAL MATCH (e:Model {name: $name})-[:`@IN_DATASET`]->(d) \
         WITH d, count(e) = 0 AS name_free \
         MERGE (u:User {node_id: $actor}) \
         MERGE (m:Model {`@scoped_name`: $scoped_name}) \
         ON CREATE SET m.id = $id, m.name = $name, m.display_name = $display_name, \
                       m.description = $description, m.`@max_sort_key` = 0 \
         WITH d, u, m, name_free AND m.id = $id AS created \
         FOREACH (_ IN CASE WHEN created THEN [1] ELSE [] END | \
             CREATE (m)-[:`@IN_DATASET`]->(d) \
             CREATE (m)-[:`@CREATED_BY` {at: datetime($now)}]->(u) \
             CREATE (m)-[:`@UPDATED_BY` {at: datetime($now)}]->(u)) \
         RETURN created, m.id AS id",
    )
    .param("dataset_id", scope.dataset_id)
    .param("organization_id", scope.organization_id)
    .param("actor", actor)
    .param("scoped_name", scope.scoped_name(&name))
    .param("id", id.as_str())
    .param("name", name.as_str())
    .param("display_name", display_name)
    .param("description", description)
    .param("now", now);

    let mut txn = engine.begin().await?;
    let outcome = merge_model(&mut txn, statement, scope, &name).await;
    finish(txn, outcome).await?;

    info!(model = %name, id = %id, dataset_id = scope.dataset_id, "Created model");

    Ok(Model {
        id,
        name,
        display_name: display_name.to_string(),
        description: description.to_string(),
        count: 0,
        property_count: 0,
        linked_property_count: 0,
        created_by: actor.to_string(),
        created_at: now,
        updated_by: actor.to_string(),
        updated_at: now,
    })
}

async fn merge_model<T: GraphTransaction>(
    txn: &mut T,
    statement: Statement,
    scope: Scope,
    name: &str,
) -> MetagraphResult<()> {
    let rows = txn.run(statement).await?;
    let Some(row) = rows.first() else {
        return Err(MetagraphError::DatasetNotFound {
            dataset_id: scope.dataset_id,
            organization_id: scope.organization_id,
        });
    };
    if !row.bool_or("created", false)? {
        return Err(MetagraphError::DuplicateModelName(name.to_string()));
    }
    Ok(())
}

/// All models of a dataset, keyed by name, with derived counts.
pub async fn get_models<E: GraphEngine>(
    engine: &E,
    scope: Scope,
) -> MetagraphResult<BTreeMap<String, Model>> {
    let statement = Statement::new(format!(
        "MATCH (m:Model)-[:`@IN_DATASET`]->(:Dataset {{id: $dataset_id}})\
         -[:`@IN_ORGANIZATION`]->(:Organization {{id: $organization_id}}) \
         {MODEL_AUDIT}{MODEL_COLUMNS}"
    ))
    .param("dataset_id", scope.dataset_id)
    .param("organization_id", scope.organization_id);

    let rows = engine.run(statement).await?;
    let models = rows
        .iter()
        .map(|row| model_from_row(row).map(|m| (m.name.clone(), m)))
        .collect::<MetagraphResult<BTreeMap<_, _>>>()?;

    debug!(dataset_id = scope.dataset_id, models = models.len(), "Loaded models");
    Ok(models)
}

/// One model by name.
pub async fn get_model_by_name<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    name: &str,
) -> MetagraphResult<Model> {
    let statement = Statement::new(format!(
        "MATCH (m:Model {{name: $name}})-[:`@IN_DATASET`]->(:Dataset {{id: $dataset_id}})\
         -[:`@IN_ORGANIZATION`]->(:Organization {{id: $organization_id}}) \
         {MODEL_AUDIT}{MODEL_COLUMNS}"
    ))
    .param("name", name)
    .param("dataset_id", scope.dataset_id)
    .param("organization_id", scope.organization_id);

    let rows = engine.run(statement).await?;
    match rows.first() {
        Some(row) => model_from_row(row),
        None => Err(MetagraphError::UnknownModel(name.to_string())),
    }
}

/// Properties of a model ordered by `index`, ties broken by id.
pub async fn get_model_properties<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    model: &str,
) -> MetagraphResult<Vec<ModelProperty>> {
    let statement = Statement::new(
        "MATCH (m:Model {name: $model})-[:`@IN_DATASET`]->(:Dataset {id: $dataset_id})\
         -[:`@IN_ORGANIZATION`]->(:Organization {id: $organization_id}) \
         OPTIONAL MATCH (m)-[:`@HAS_PROPERTY`]->(p:ModelProperty) \
         RETURN p.id AS id, p.name AS name, p.display_name AS display_name, \
                p.data_type AS data_type, p.default AS default_value, \
                p.model_title AS model_title, p.index AS index \
         ORDER BY p.index, p.id",
    )
    .param("model", model)
    .param("dataset_id", scope.dataset_id)
    .param("organization_id", scope.organization_id);

    let rows = engine.run(statement).await?;
    if rows.is_empty() {
        return Err(MetagraphError::UnknownModel(model.to_string()));
    }

    let mut properties = rows
        .into_iter()
        // OPTIONAL MATCH yields one all-null row for a model without properties.
        .filter(|row| row.get("id").is_some_and(|id| !id.is_null()))
        .map(property_from_row)
        .collect::<MetagraphResult<Vec<_>>>()?;
    sort_properties(&mut properties);
    Ok(properties)
}

/// Fail with `UnknownModelProperty` unless `model` declares `property`.
pub async fn require_property<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    model: &str,
    property: &str,
) -> MetagraphResult<()> {
    let properties = get_model_properties(engine, scope, model).await?;
    if properties.iter().any(|p| p.name == property) {
        Ok(())
    } else {
        Err(MetagraphError::UnknownModelProperty {
            model: model.to_string(),
            property: property.to_string(),
        })
    }
}

fn model_from_row(row: &Row) -> MetagraphResult<Model> {
    let linked = row.int("linked_property_count")?;
    Ok(Model {
        id: row.string("id")?,
        name: row.string("name")?,
        display_name: row.opt_string("display_name")?.unwrap_or_default(),
        description: row.opt_string("description")?.unwrap_or_default(),
        count: row.int("count")?,
        property_count: row.int("static_property_count")? + linked,
        linked_property_count: linked,
        created_by: row.string("created_by")?,
        created_at: timestamp_or_epoch(row, "created_at")?,
        updated_by: row.string("updated_by")?,
        updated_at: timestamp_or_epoch(row, "updated_at")?,
    })
}

fn timestamp_or_epoch(row: &Row, column: &str) -> MetagraphResult<DateTime<Utc>> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(DateTime::UNIX_EPOCH),
        Some(_) => row.timestamp(column),
    }
}

fn property_from_row(mut row: Row) -> MetagraphResult<ModelProperty> {
    Ok(ModelProperty {
        id: row.string("id")?,
        name: row.string("name")?,
        display_name: row.opt_string("display_name")?.unwrap_or_default(),
        is_title: row.bool_or("model_title", false)?,
        index: row.get("index").and_then(Value::as_i64).unwrap_or(i64::MAX),
        data_type: row.take("data_type"),
        default_value: row.take("default_value"),
    })
}
