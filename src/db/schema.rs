//! SQL DDL for the Iris tables.
//!
//! Defines `memories`, `memories_vec` (vec0, cosine distance) and `schema_meta`.
//! The `memories` DDL is the version-1 shape; later columns arrive through
//! [`super::migrations`]. All DDL uses `IF NOT EXISTS` for idempotent
//! initialization.

use rusqlite::Connection;

use crate::embedding::EMBEDDING_DIM;

const SCHEMA_SQL: &str = r#"
-- Stored prompts
CREATE TABLE IF NOT EXISTS memories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table DDL (sqlite-vec syntax). Rows share the `memories` rowid.
fn vec_table_sql() -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS memories_vec USING vec0(\
         embedding FLOAT[{EMBEDDING_DIM}] distance_metric=cosine);"
    )
}

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&vec_table_sql())?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"memories".to_string()));
        assert!(tables.contains(&"memories_vec".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));

        let version: String = conn
            .query_row("SELECT vec_version()", [], |r| r.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn schema_is_idempotent() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn vec_table_rejects_wrong_width() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let short: Vec<u8> = vec![0.5f32; 384].iter().flat_map(|x| x.to_ne_bytes()).collect();
        let res = conn.execute(
            "INSERT INTO memories_vec (rowid, embedding) VALUES (1, ?1)",
            [short],
        );
        assert!(res.is_err());
    }
}
