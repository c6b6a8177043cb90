use super::Row;
use rusqlite::{params_from_iter, Connection, Result};
use tracing::debug;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.configure_pragmas()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.configure_pragmas()?;
        Ok(db)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode)");
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Drop `name` if present and create it afresh from raw column definitions.
    pub fn create_table(&self, name: &str, column_defs: &[&str]) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS \"{}\";", name))?;
        self.conn.execute_batch(&format!(
            "CREATE TABLE \"{}\" ({});",
            name,
            column_defs.join(",")
        ))?;
        debug!("Created table {}", name);
        Ok(())
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert one row; columns are bound in the row's order. Runs in its own
    /// implicit transaction, so earlier rows stay committed if a later one fails.
    pub fn insert_row(&self, name: &str, row: &Row) -> Result<()> {
        let columns: Vec<&str> = row.iter().map(|(column, _)| *column).collect();
        let placeholders: Vec<String> = (1..=row.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            name,
            columns.join(", "),
            placeholders.join(",")
        );
        self.conn
            .execute(&sql, params_from_iter(row.iter().map(|(_, value)| value)))?;
        Ok(())
    }

    /// Drain a row sequence into `name`, one insert per row. The first failing
    /// insert aborts the fill.
    pub fn fill_table<I>(&self, name: &str, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut counter = 0;
        for row in rows {
            self.insert_row(name, &row)?;
            counter += 1;
        }
        debug!("Added {} entries to {}", counter, name);
        Ok(counter)
    }
}
