//! Schema-level types: models, their properties and declared relationships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The (dataset, organization) pair every operation is scoped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub dataset_id: i64,
    pub organization_id: i64,
}

impl Scope {
    pub fn new(dataset_id: i64, organization_id: i64) -> Self {
        Self {
            dataset_id,
            organization_id,
        }
    }

    /// Key that makes a model name unique within its dataset.
    pub fn scoped_name(&self, model_name: &str) -> String {
        format!("{}/{}/{}", self.organization_id, self.dataset_id, model_name)
    }
}

/// A record type defined in a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub count: i64,
    pub property_count: i64,
    pub linked_property_count: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

/// A typed property owned by one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProperty {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub data_type: Value,
    pub default_value: Value,
    pub is_title: bool,
    pub index: i64,
}

/// Order properties by display index, ties broken by id.
pub fn sort_properties(properties: &mut [ModelProperty]) {
    properties.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.id.cmp(&b.id)));
}

/// A declared, directed relationship between two models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRelationship {
    pub id: String,
    /// Physical edge label used between records.
    pub relationship_type: String,
    /// Human-facing identifier.
    pub display_name: String,
    /// Id of the model the schema declares as the edge start.
    pub start_model_id: String,
    pub from_model_id: String,
    pub to_model_id: String,
}

impl ModelRelationship {
    /// True when the request's `to` model is the declared edge start, so the
    /// request lists must be swapped.
    pub fn is_reversed(&self) -> bool {
        self.start_model_id == self.to_model_id && self.start_model_id != self.from_model_id
    }
}

/// Identifies a model relationship by the names a caller knows it under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
    #[serde(rename = "from_model")]
    pub from_model: String,
    #[serde(rename = "relationship_name")]
    pub relationship: String,
    #[serde(rename = "to_model")]
    pub to_model: String,
}

impl RelationshipKey {
    pub fn new(
        from_model: impl Into<String>,
        relationship: impl Into<String>,
        to_model: impl Into<String>,
    ) -> Self {
        Self {
            from_model: from_model.into(),
            relationship: relationship.into(),
            to_model: to_model.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(id: &str, index: i64) -> ModelProperty {
        ModelProperty {
            id: id.to_string(),
            name: format!("p_{id}"),
            display_name: id.to_uppercase(),
            data_type: Value::from("String"),
            default_value: Value::Null,
            is_title: false,
            index,
        }
    }

    #[test]
    fn test_properties_sorted_by_index_then_id() {
        let mut props = vec![prop("c", 2), prop("b", 1), prop("a", 2), prop("d", 0)];
        sort_properties(&mut props);
        let ids: Vec<&str> = props.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn test_relationship_orientation() {
        let rel = ModelRelationship {
            id: "r".into(),
            relationship_type: "belongs_to_subject".into(),
            display_name: "belongs_to_subject".into(),
            start_model_id: "patient".into(),
            from_model_id: "visit".into(),
            to_model_id: "patient".into(),
        };
        assert!(rel.is_reversed());

        let forward = ModelRelationship {
            start_model_id: "visit".into(),
            ..rel
        };
        assert!(!forward.is_reversed());
    }

    #[test]
    fn test_scoped_name() {
        assert_eq!(Scope::new(7, 1).scoped_name("visit"), "1/7/visit");
    }
}
