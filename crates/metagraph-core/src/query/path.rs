//! Model-level paths produced by the storage engine's shortest-path search.

use serde::{Deserialize, Serialize};

use crate::error::{MetagraphError, MetagraphResult};

/// Longest path, in hops, the resolver will search for.
pub const MAX_HOPS: u32 = 4;

/// The model occupying one position of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Waypoint {
    pub model_id: String,
    pub model_name: String,
}

impl Waypoint {
    pub fn new(model_id: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model_name: model_name.into(),
        }
    }
}

/// A chain of models joined by schema edge types.
///
/// `waypoints[0]` is the source model; `hops[i]` is the edge type between
/// `waypoints[i]` and `waypoints[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    waypoints: Vec<Waypoint>,
    hops: Vec<String>,
}

impl Path {
    pub fn new(waypoints: Vec<Waypoint>, hops: Vec<String>) -> MetagraphResult<Self> {
        if waypoints.is_empty() {
            return Err(MetagraphError::decode("path without waypoints"));
        }
        if hops.len() + 1 != waypoints.len() {
            return Err(MetagraphError::decode(format!(
                "path with {} waypoints needs {} hops, got {}",
                waypoints.len(),
                waypoints.len() - 1,
                hops.len()
            )));
        }
        Ok(Self { waypoints, hops })
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn hops(&self) -> &[String] {
        &self.hops
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn source(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    pub fn target(&self) -> &Waypoint {
        &self.waypoints[self.waypoints.len() - 1]
    }

    /// Model name at `depth`, if the path is that long.
    pub fn model_at(&self, depth: usize) -> Option<&str> {
        self.waypoints.get(depth).map(|w| w.model_name.as_str())
    }
}
