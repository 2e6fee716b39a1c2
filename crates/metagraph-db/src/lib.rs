//! Metagraph Database Layer
//!
//! SQLite store for the package hierarchy. Packages form a tree through
//! `parent_id`; the graph side only knows package ids, so package-rooted
//! record queries ask this crate for the ancestor chain first.

pub mod ancestors;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use ancestors::SqliteAncestors;
pub use pool::{DbError, DbPool, DbResult};

/// Open the database at `path` and bring its schema up to date.
pub fn init_pool(path: impl AsRef<std::path::Path>) -> DbResult<DbPool> {
    let pool = DbPool::open(path)?;
    migrations::run_migrations(&pool)?;
    Ok(pool)
}
