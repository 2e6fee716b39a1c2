//! The model store: every operation of the metadata service, scoped by
//! dataset and organization, over one injected engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use metagraph_core::query::{AutocompleteRequest, Paging, QueryPage, QueryRequest, DEFAULT_LIMIT, MAX_HOPS};
use metagraph_core::record::{PackageRecord, Record, RecordRelationship};
use metagraph_core::schema::{Model, ModelProperty, RelationshipKey, Scope};
use metagraph_core::{AncestorLookup, MetagraphError, MetagraphResult, Value};

use crate::engine::GraphEngine;
use crate::{packages, records, registry, relationships, schema};

/// Metadata store over a graph engine.
///
/// The engine is shared by every call; with [`GraphClient`](crate::GraphClient)
/// that is one connection pool for the lifetime of the store.
pub struct ModelStore<E: GraphEngine> {
    engine: E,
    ancestors: Option<Arc<dyn AncestorLookup>>,
    default_limit: u32,
    max_hops: u32,
}

impl<E: GraphEngine> ModelStore<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            ancestors: None,
            default_limit: DEFAULT_LIMIT,
            max_hops: MAX_HOPS,
        }
    }

    /// Package hierarchy used by [`records_for_package`](Self::records_for_package).
    pub fn with_ancestors(mut self, ancestors: Arc<dyn AncestorLookup>) -> Self {
        self.ancestors = Some(ancestors);
        self
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Longest path searched between models, capped at [`MAX_HOPS`].
    pub fn with_max_hops(mut self, hops: u32) -> Self {
        self.max_hops = hops.clamp(1, MAX_HOPS);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub async fn initialize_schema(&self) -> MetagraphResult<()> {
        schema::initialize_schema(&self.engine).await
    }

    pub async fn init_org_and_dataset(
        &self,
        scope: Scope,
        organization_node_id: Option<&str>,
        dataset_node_id: Option<&str>,
    ) -> MetagraphResult<()> {
        registry::init_org_and_dataset(&self.engine, scope, organization_node_id, dataset_node_id).await
    }

    pub async fn create_model(
        &self,
        scope: Scope,
        name: &str,
        display_name: &str,
        description: &str,
        actor: &str,
    ) -> MetagraphResult<Model> {
        registry::create_model(&self.engine, scope, name, display_name, description, actor).await
    }

    pub async fn get_models(&self, scope: Scope) -> MetagraphResult<BTreeMap<String, Model>> {
        registry::get_models(&self.engine, scope).await
    }

    pub async fn get_model_by_name(&self, scope: Scope, name: &str) -> MetagraphResult<Model> {
        registry::get_model_by_name(&self.engine, scope, name).await
    }

    pub async fn get_model_properties(&self, scope: Scope, model: &str) -> MetagraphResult<Vec<ModelProperty>> {
        registry::get_model_properties(&self.engine, scope, model).await
    }

    pub async fn query(&self, scope: Scope, request: &QueryRequest) -> MetagraphResult<Vec<Record>> {
        records::query(
            &self.engine,
            scope,
            &request.model,
            &request.filters,
            request.order_by.as_deref(),
            self.paging(request),
            self.max_hops,
        )
        .await
    }

    pub async fn query_total(&self, scope: Scope, request: &QueryRequest) -> MetagraphResult<i64> {
        records::query_total(&self.engine, scope, &request.model, &request.filters, self.max_hops).await
    }

    /// One page of records plus the total, fetched concurrently from one plan.
    pub async fn query_page(&self, scope: Scope, request: &QueryRequest) -> MetagraphResult<QueryPage> {
        let paging = self.paging(request);
        let plan = records::plan_query(
            &self.engine,
            scope,
            &request.model,
            &request.filters,
            request.order_by.as_deref(),
            paging,
            self.max_hops,
        )
        .await?;

        let (records, total) = tokio::try_join!(
            records::fetch_records(&self.engine, &plan),
            records::fetch_total(&self.engine, &plan),
        )?;
        debug!(model = %plan.model(), total, returned = records.len(), "Query page");

        Ok(QueryPage {
            model: plan.model().to_string(),
            limit: paging.limit,
            offset: paging.offset,
            total,
            records,
        })
    }

    pub async fn autocomplete(&self, scope: Scope, request: &AutocompleteRequest) -> MetagraphResult<Vec<Value>> {
        records::autocomplete(
            &self.engine,
            scope,
            &request.model,
            &request.property,
            &request.text,
            &request.filters,
            self.max_hops,
        )
        .await
    }

    pub async fn create_relationships(
        &self,
        scope: Scope,
        actor: &str,
        key: &RelationshipKey,
        from_ids: &[String],
        to_ids: &[String],
    ) -> MetagraphResult<Vec<RecordRelationship>> {
        relationships::create_relationships(&self.engine, scope, actor, key, from_ids, to_ids).await
    }

    pub async fn records_for_package(
        &self,
        scope: Scope,
        package_node_id: &str,
        max_depth: u32,
    ) -> MetagraphResult<Vec<PackageRecord>> {
        let ancestors = self
            .ancestors
            .as_deref()
            .ok_or_else(|| MetagraphError::Ancestors("no package hierarchy configured".into()))?;
        packages::records_for_package(&self.engine, ancestors, scope, package_node_id, max_depth).await
    }

    fn paging(&self, request: &QueryRequest) -> Paging {
        request.paging(self.default_limit)
    }
}
