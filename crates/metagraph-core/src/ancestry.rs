//! Package hierarchy lookup used to scope package-rooted record queries.

use async_trait::async_trait;

use crate::error::MetagraphResult;
use crate::record::PackageAncestor;

/// Resolves a package to its ancestor chain.
#[async_trait]
pub trait AncestorLookup: Send + Sync {
    /// Return the package itself followed by its ancestors, closest first.
    async fn package_ancestors(&self, package_node_id: &str) -> MetagraphResult<Vec<PackageAncestor>>;
}
