//! Graph-pattern query synthesis.
//!
//! A query starts from one source model, reaches every model named by a
//! filter through a shortest path, and projects the distinct source records
//! in one of three modes. Everything here is pure: paths come in already
//! resolved and the output is a [`Statement`](crate::statement::Statement).

pub mod filter;
pub mod path;
pub mod pattern;
pub mod render;
pub mod synthesizer;

use serde::{Deserialize, Serialize};

pub use filter::{Filter, FilterRequest, Operator};
pub use path::{Path, Waypoint, MAX_HOPS};
pub use pattern::{merge_paths, GraphPattern};
pub use synthesizer::{Paging, QueryMode, SynthesizedQuery, AUTOCOMPLETE_LIMIT, DEFAULT_LIMIT};

use crate::record::Record;

/// Enumerate/count request against one source model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub model: String,
    #[serde(default)]
    pub filters: Vec<FilterRequest>,
    /// Sort property of the source model; `@sort_key` when absent.
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl QueryRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Requested window, `default_limit` filling in a missing limit.
    pub fn paging(&self, default_limit: u32) -> Paging {
        Paging {
            limit: self.limit.unwrap_or(default_limit),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// Autocomplete request: distinct values of `model.property` containing `text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteRequest {
    pub model: String,
    pub property: String,
    pub text: String,
    #[serde(default)]
    pub filters: Vec<FilterRequest>,
}

/// One page of records plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPage {
    pub model: String,
    pub limit: u32,
    pub offset: u32,
    pub total: i64,
    pub records: Vec<Record>,
}
