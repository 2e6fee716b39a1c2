//! Centralized error types for metagraph.

use std::time::Duration;

use thiserror::Error;

/// Boxed source for failures raised by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for metagraph operations.
#[derive(Error, Debug)]
pub enum MetagraphError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown property '{property}' on model '{model}'")]
    UnknownModelProperty { model: String, property: String },

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Cannot use empty name")]
    EmptyName,

    #[error("Name too long ({length} > {max} characters): {name}")]
    NameTooLong { name: String, length: usize, max: usize },

    #[error("Invalid name '{0}': must start with [A-Za-z_] and only contain [A-Za-z0-9_]")]
    InvalidNamePattern(String),

    #[error("'{0}' is a reserved name")]
    ReservedName(String),

    #[error("A model with name '{0}' already exists")]
    DuplicateModelName(String),

    #[error("No path of at most {max_hops} hops from model '{source_model}' to model '{target}'")]
    PathNotFound {
        source_model: String,
        target: String,
        max_hops: u32,
    },

    #[error("Relationship {from_model}-[{relationship}]-{to_model} not found in dataset")]
    RelationshipNotFound {
        from_model: String,
        relationship: String,
        to_model: String,
    },

    #[error("Record not found in model: {0}")]
    RecordNotFound(String),

    #[error("'from' and 'to' lists differ in length ({from} vs {to})")]
    MismatchedListLengths { from: usize, to: usize },

    #[error("Sort property cannot be empty")]
    MissingSortProperty,

    #[error("Dataset {dataset_id} not found in organization {organization_id}")]
    DatasetNotFound { dataset_id: i64, organization_id: i64 },

    #[error("Unexpected row shape: {0}")]
    Decode(String),

    #[error("Graph engine error: {0}")]
    Engine(#[source] BoxError),

    #[error("Graph engine call exceeded deadline of {0:?}")]
    EngineTimeout(Duration),

    #[error("Package ancestor lookup failed: {0}")]
    Ancestors(#[source] BoxError),
}

/// Result type for metagraph operations.
pub type MetagraphResult<T> = Result<T, MetagraphError>;

impl MetagraphError {
    /// Wrap an opaque engine failure.
    pub fn engine(err: impl Into<BoxError>) -> Self {
        Self::Engine(err.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Deadline expiry is transient: the unit of work was rolled back and can
    /// be retried by the calling layer.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::EngineTimeout(_))
    }

    /// Validation failures are raised before any statement touches the engine.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownModel(_)
                | Self::UnknownModelProperty { .. }
                | Self::UnsupportedOperator(_)
                | Self::EmptyName
                | Self::NameTooLong { .. }
                | Self::InvalidNamePattern(_)
                | Self::ReservedName(_)
                | Self::MismatchedListLengths { .. }
                | Self::MissingSortProperty
        )
    }
}
