//! Metagraph Core Library
//!
//! Domain types, name rules and the pure graph-pattern query synthesizer for
//! the metagraph schema-on-read metadata store.

pub mod ancestry;
pub mod error;
pub mod naming;
pub mod query;
pub mod record;
pub mod schema;
pub mod statement;
pub mod value;

pub use ancestry::AncestorLookup;
pub use error::{MetagraphError, MetagraphResult};
pub use statement::Statement;
pub use value::Value;
