//! Record retrieval: enumerate, count and autocomplete over a source model.
//!
//! Planning loads the dataset's models, validates the request against them,
//! resolves one shortest path per filtered model and synthesizes the
//! pattern. The same plan then renders to any projection.

use std::collections::BTreeMap;

use tracing::debug;

use metagraph_core::query::{
    Filter, FilterRequest, Paging, QueryMode, SynthesizedQuery, Waypoint, AUTOCOMPLETE_LIMIT,
};
use metagraph_core::record::{shape_record, Record, SORT_KEY};
use metagraph_core::schema::Scope;
use metagraph_core::{MetagraphError, MetagraphResult, Value};

use crate::engine::GraphEngine;
use crate::paths::resolve_paths;
use crate::registry::{get_model_properties, get_models, require_property};

/// A synthesized query bound to its source model.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    model: String,
    query: SynthesizedQuery,
}

impl QueryPlan {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn query(&self) -> &SynthesizedQuery {
        &self.query
    }
}

/// Validate a request and build its plan.
///
/// Operators and a blank sort property are rejected before any engine call.
/// `sort` defaults to the record sort key; any other sort property, and
/// every filtered property, must exist on its model.
pub async fn plan_query<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    model: &str,
    filters: &[FilterRequest],
    sort: Option<&str>,
    paging: Paging,
    max_hops: u32,
) -> MetagraphResult<QueryPlan> {
    let filters = Filter::parse_all(filters)?;
    if sort.is_some_and(|property| property.trim().is_empty()) {
        return Err(MetagraphError::MissingSortProperty);
    }

    let models = get_models(engine, scope).await?;
    let source = models
        .get(model)
        .ok_or_else(|| MetagraphError::UnknownModel(model.to_string()))?;

    let sort = match sort {
        None => SORT_KEY,
        Some(property) => {
            require_property(engine, scope, &source.name, property).await?;
            property
        }
    };

    let mut targets = BTreeMap::new();
    for filter in filters.iter().filter(|f| f.model != source.name) {
        let target = models
            .get(&filter.model)
            .ok_or_else(|| MetagraphError::UnknownModel(filter.model.clone()))?;
        targets.insert(target.name.clone(), target.id.clone());
    }

    require_filter_properties(engine, scope, &filters).await?;

    let paths = resolve_paths(engine, source, &targets, max_hops).await?;
    let query = SynthesizedQuery::new(
        &Waypoint::new(source.id.as_str(), source.name.as_str()),
        &paths,
        &filters,
        sort,
        paging,
    )?;

    Ok(QueryPlan {
        model: source.name.clone(),
        query,
    })
}

/// Every filtered property must be declared on its model. Each model's
/// properties are loaded once.
async fn require_filter_properties<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    filters: &[Filter],
) -> MetagraphResult<()> {
    let mut declared: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for filter in filters {
        if !declared.contains_key(filter.model.as_str()) {
            let names = get_model_properties(engine, scope, &filter.model)
                .await?
                .into_iter()
                .map(|p| p.name)
                .collect();
            declared.insert(filter.model.as_str(), names);
        }
        if !declared[filter.model.as_str()].contains(&filter.property) {
            return Err(MetagraphError::UnknownModelProperty {
                model: filter.model.clone(),
                property: filter.property.clone(),
            });
        }
    }
    Ok(())
}

/// Run the enumerate projection of `plan`.
pub async fn fetch_records<E: GraphEngine>(engine: &E, plan: &QueryPlan) -> MetagraphResult<Vec<Record>> {
    let rows = engine.run(plan.query.statement(&QueryMode::Enumerate)).await?;
    let records = rows
        .into_iter()
        .map(|mut row| shape_record(&plan.model, row.map("props")?))
        .collect::<MetagraphResult<Vec<_>>>()?;
    debug!(model = %plan.model, records = records.len(), "Fetched records");
    Ok(records)
}

/// Run the count projection of `plan`.
pub async fn fetch_total<E: GraphEngine>(engine: &E, plan: &QueryPlan) -> MetagraphResult<i64> {
    let rows = engine.run(plan.query.statement(&QueryMode::Count)).await?;
    match rows.first() {
        Some(row) => row.int("total"),
        None => Ok(0),
    }
}

/// Records of `model` matching every filter, sorted and paged.
pub async fn query<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    model: &str,
    filters: &[FilterRequest],
    sort: Option<&str>,
    paging: Paging,
    max_hops: u32,
) -> MetagraphResult<Vec<Record>> {
    let plan = plan_query(engine, scope, model, filters, sort, paging, max_hops).await?;
    fetch_records(engine, &plan).await
}

/// Number of records of `model` matching every filter.
pub async fn query_total<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    model: &str,
    filters: &[FilterRequest],
    max_hops: u32,
) -> MetagraphResult<i64> {
    let plan = plan_query(engine, scope, model, filters, None, Paging::default(), max_hops).await?;
    fetch_total(engine, &plan).await
}

/// Distinct values of `model.property` containing `text`, case-insensitively,
/// among records matching every filter. At most twenty values.
pub async fn autocomplete<E: GraphEngine>(
    engine: &E,
    scope: Scope,
    model: &str,
    property: &str,
    text: &str,
    filters: &[FilterRequest],
    max_hops: u32,
) -> MetagraphResult<Vec<Value>> {
    let plan = plan_query(engine, scope, model, filters, None, Paging::default(), max_hops).await?;
    require_property(engine, scope, &plan.model, property).await?;

    let statement = plan.query.statement(&QueryMode::Autocomplete {
        property: property.to_string(),
        text: text.to_string(),
    });
    let rows = engine.run(statement).await?;

    Ok(rows
        .into_iter()
        .map(|mut row| row.take("value"))
        .filter(|value| !value.is_null())
        .take(AUTOCOMPLETE_LIMIT as usize)
        .collect())
}
