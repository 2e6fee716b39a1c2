//! Record-level types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// An instance of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub model: String,
    pub props: BTreeMap<String, Value>,
}

/// A directed edge between two records instantiating a model relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRelationship {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub relationship_type: String,
    pub model_relationship_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// One node of a package's folder hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAncestor {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub node_id: String,
}

/// The package a package-rooted record was reached from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginPackage {
    pub id: i64,
    pub node_id: String,
}

/// A record reached from a package or one of its ancestors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(flatten)]
    pub record: Record,
    pub origin: OriginPackage,
}
