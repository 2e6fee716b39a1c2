//! Database queries.

pub mod packages;
