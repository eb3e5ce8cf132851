use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    level INTEGER NOT NULL,
    parent_code TEXT,
    account_type TEXT NOT NULL,
    normal_side TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    opening_balance REAL NOT NULL DEFAULT 0,
    closing_balance REAL NOT NULL DEFAULT 0,
    movement_id TEXT,
    debit_total REAL NOT NULL DEFAULT 0,
    credit_total REAL NOT NULL DEFAULT 0,
    operation_type TEXT,
    cost_center TEXT,
    type_code TEXT,
    aux_code_1 TEXT,
    aux_code_2 TEXT,
    aux_code_3 TEXT,
    aux_code_4 TEXT,
    fiscal_renta INTEGER NOT NULL DEFAULT 0,
    fiscal_iva INTEGER NOT NULL DEFAULT 0,
    fiscal_ica INTEGER NOT NULL DEFAULT 0,
    fiscal_retencion INTEGER NOT NULL DEFAULT 0,
    fiscal_exogena INTEGER NOT NULL DEFAULT 0,
    fiscal_note TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_accounts_parent ON accounts(parent_code);
";

pub const DB_FILE: &str = "puc.db";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_accounts_table() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert!(tables.contains(&"accounts".to_string()));
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_code_is_unique() {
        let (_dir, conn) = test_db();
        let insert = "INSERT INTO accounts (code, name, level, account_type, normal_side) \
                      VALUES ('1', 'Activo', 1, 'MADRE', 'DEBITO')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
