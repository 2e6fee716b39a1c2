//! Package hierarchy queries.

use crate::pool::{DbError, DbPool, DbResult};
use metagraph_core::record::PackageAncestor;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Package row from database.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub node_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PackageRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            name: row.get(2)?,
            node_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl From<PackageRow> for PackageAncestor {
    fn from(row: PackageRow) -> Self {
        PackageAncestor {
            id: row.id,
            parent_id: row.parent_id,
            name: row.name,
            node_id: row.node_id,
        }
    }
}

const COLUMNS: &str = "id, parent_id, name, node_id, created_at, updated_at";

const ANCESTORS: &str = "WITH RECURSIVE chain(id, parent_id, name, node_id, created_at, updated_at, depth) AS (
        SELECT id, parent_id, name, node_id, created_at, updated_at, 0
        FROM packages WHERE node_id = ?1
        UNION ALL
        SELECT p.id, p.parent_id, p.name, p.node_id, p.created_at, p.updated_at, c.depth + 1
        FROM packages p JOIN chain c ON p.id = c.parent_id
    )
    SELECT id, parent_id, name, node_id, created_at, updated_at FROM chain ORDER BY depth";

/// Insert a package, or rename/move it when `node_id` already exists.
///
/// `parent_node_id` must name an existing package, and must not be the
/// package itself or one of its descendants.
pub fn upsert_package(
    pool: &DbPool,
    node_id: &str,
    name: &str,
    parent_node_id: Option<&str>,
) -> DbResult<PackageRow> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;

        let parent_id = match parent_node_id {
            None => None,
            Some(parent) => {
                let chain = ancestors(&tx, parent)?;
                if chain.is_empty() {
                    return Err(DbError::NotFound(format!("Package: {}", parent)));
                }
                if chain.iter().any(|p| p.node_id == node_id) {
                    return Err(DbError::Cycle(node_id.to_string()));
                }
                Some(chain[0].id)
            }
        };

        tx.execute(
            "INSERT INTO packages (parent_id, name, node_id) VALUES (?1, ?2, ?3)
             ON CONFLICT(node_id) DO UPDATE SET
                 parent_id = excluded.parent_id,
                 name = excluded.name,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
            params![parent_id, name, node_id],
        )?;

        let row = find(&tx, node_id)?.ok_or_else(|| DbError::NotFound(format!("Package: {}", node_id)))?;
        tx.commit()?;
        Ok(row)
    })
}

/// Get a package by node id.
pub fn get_package(pool: &DbPool, node_id: &str) -> DbResult<PackageRow> {
    pool.with_conn(|conn| find(conn, node_id)?.ok_or_else(|| DbError::NotFound(format!("Package: {}", node_id))))
}

/// The package followed by its ancestors up to the root, closest first.
/// Empty when the package is unknown.
pub fn get_package_ancestors(pool: &DbPool, node_id: &str) -> DbResult<Vec<PackageRow>> {
    pool.with_conn(|conn| ancestors(conn, node_id))
}

/// Direct children of a package, by name.
pub fn list_children(pool: &DbPool, node_id: &str) -> DbResult<Vec<PackageRow>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM packages
             WHERE parent_id = (SELECT id FROM packages WHERE node_id = ?1)
             ORDER BY name"
        ))?;
        let rows = stmt
            .query_map(params![node_id], PackageRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

fn find(conn: &Connection, node_id: &str) -> DbResult<Option<PackageRow>> {
    Ok(conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM packages WHERE node_id = ?1"),
            params![node_id],
            PackageRow::from_row,
        )
        .optional()?)
}

fn ancestors(conn: &Connection, node_id: &str) -> DbResult<Vec<PackageRow>> {
    let mut stmt = conn.prepare(ANCESTORS)?;
    let rows = stmt
        .query_map(params![node_id], PackageRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn setup() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        upsert_package(&pool, "N:collection:root", "root", None).unwrap();
        upsert_package(&pool, "N:collection:study", "study", Some("N:collection:root")).unwrap();
        upsert_package(&pool, "N:package:scan", "scan.nii", Some("N:collection:study")).unwrap();
        pool
    }

    #[test]
    fn test_ancestors_closest_first() {
        let pool = setup();
        let chain = get_package_ancestors(&pool, "N:package:scan").unwrap();
        let names: Vec<_> = chain.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["scan.nii", "study", "root"]);
        assert_eq!(chain[0].parent_id, Some(chain[1].id));
        assert_eq!(chain[2].parent_id, None);
    }

    #[test]
    fn test_unknown_package_has_no_ancestors() {
        let pool = setup();
        assert!(get_package_ancestors(&pool, "N:package:missing").unwrap().is_empty());
    }

    #[test]
    fn test_upsert_moves_and_renames() {
        let pool = setup();
        let before = get_package(&pool, "N:package:scan").unwrap();
        let moved = upsert_package(&pool, "N:package:scan", "scan-v2.nii", Some("N:collection:root")).unwrap();
        assert_eq!(moved.id, before.id);
        assert_eq!(moved.name, "scan-v2.nii");

        let chain = get_package_ancestors(&pool, "N:package:scan").unwrap();
        assert_eq!(chain.len(), 2);
        assert!(list_children(&pool, "N:collection:study").unwrap().is_empty());
    }

    #[test]
    fn test_upsert_unknown_parent() {
        let pool = setup();
        let err = upsert_package(&pool, "N:package:x", "x", Some("N:collection:ghost")).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        assert!(matches!(get_package(&pool, "N:package:x"), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_upsert_rejects_cycle() {
        let pool = setup();
        let err = upsert_package(&pool, "N:collection:root", "root", Some("N:package:scan")).unwrap_err();
        assert!(matches!(err, DbError::Cycle(id) if id == "N:collection:root"));
        assert_eq!(get_package(&pool, "N:collection:root").unwrap().parent_id, None);
    }

    #[test]
    fn test_list_children() {
        let pool = setup();
        upsert_package(&pool, "N:package:notes", "notes.txt", Some("N:collection:study")).unwrap();
        let children = list_children(&pool, "N:collection:study").unwrap();
        let names: Vec<_> = children.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["notes.txt", "scan.nii"]);
    }
}
