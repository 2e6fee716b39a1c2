//! Schema registry types.

pub mod model;

pub use model::{Model, ModelProperty, ModelRelationship, RelationshipKey, Scope, sort_properties};
