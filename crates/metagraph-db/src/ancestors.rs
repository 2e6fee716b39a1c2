//! [`AncestorLookup`] backed by the package table.

use async_trait::async_trait;
use tracing::debug;

use metagraph_core::record::PackageAncestor;
use metagraph_core::{AncestorLookup, MetagraphError, MetagraphResult};

use crate::pool::{DbError, DbPool};
use crate::queries::packages::get_package_ancestors;

#[derive(Clone)]
pub struct SqliteAncestors {
    pool: DbPool,
}

impl SqliteAncestors {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AncestorLookup for SqliteAncestors {
    async fn package_ancestors(&self, package_node_id: &str) -> MetagraphResult<Vec<PackageAncestor>> {
        let pool = self.pool.clone();
        let node_id = package_node_id.to_string();
        let chain = tokio::task::spawn_blocking(move || get_package_ancestors(&pool, &node_id))
            .await
            .map_err(|e| DbError::Task(e.to_string()))
            .and_then(|result| result)
            .map_err(|e| MetagraphError::Ancestors(Box::new(e)))?;

        debug!(package = %package_node_id, depth = chain.len(), "Resolved package ancestors");
        Ok(chain.into_iter().map(PackageAncestor::from).collect())
    }
}
