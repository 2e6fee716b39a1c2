//! # Metagraph Graph
//!
//! Neo4j-backed metadata store.
//!
//! Provides the engine abstraction and its Neo4j client, the schema
//! registry, shortest-path resolution, record queries, the relationship
//! writer and the [`ModelStore`] tying them together.

pub mod client;
pub mod engine;
pub mod packages;
pub mod paths;
pub mod records;
pub mod registry;
pub mod relationships;
pub mod schema;
pub mod store;

#[cfg(test)]
mod testing;

pub use client::{GraphClient, GraphConfig, GraphTxn};
pub use engine::{GraphEngine, GraphTransaction, Row};
pub use schema::initialize_schema;
pub use store::ModelStore;
