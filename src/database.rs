use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::info;

use crate::error::Error;
use crate::job::ConnectionDetails;
use crate::types::Result;

/// Something that can run a batch of SQL statements
pub trait SqlExecutor {
    fn execute_sql(&mut self, sql: &str) -> Result<()>;
}

/// Executes SQL against a SQLite database file
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    pub fn connect(details: &ConnectionDetails) -> Result<Self> {
        if !details.dbms.eq_ignore_ascii_case("sqlite") {
            return Err(Error::UnsupportedDbms(details.dbms.clone()));
        }
        let conn = Connection::open(&details.server)?;
        info!("Connected to {}", details.server);
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SqlExecutor for SqliteExecutor {
    fn execute_sql(&mut self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

/// Writes SQL to a file instead of running it
pub struct SqlFileWriter {
    path: PathBuf,
}

impl SqlFileWriter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SqlExecutor for SqlFileWriter {
    fn execute_sql(&mut self, sql: &str) -> Result<()> {
        std::fs::write(&self.path, sql)?;
        info!("SQL written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_executor_runs_batch() {
        let mut executor = SqliteExecutor::in_memory().unwrap();
        executor
            .execute_sql("CREATE TABLE main.t (x INT NOT NULL);\nINSERT INTO main.t VALUES (1);")
            .unwrap();

        let count: i64 = executor
            .connection()
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_sqlite_executor_rejects_other_dbms() {
        let details = ConnectionDetails {
            dbms: "postgresql".to_string(),
            server: "localhost/ohdsi".to_string(),
            user: None,
            port: None,
        };

        assert!(matches!(
            SqliteExecutor::connect(&details),
            Err(Error::UnsupportedDbms(_))
        ));
    }

    #[test]
    fn test_sqlite_executor_connect_file() {
        let dir = TempDir::new().unwrap();
        let details = ConnectionDetails {
            dbms: "sqlite".to_string(),
            server: dir.path().join("results.sqlite").display().to_string(),
            user: None,
            port: None,
        };
        let mut executor = SqliteExecutor::connect(&details).unwrap();
        executor.execute_sql("CREATE TABLE t (x INT);").unwrap();

        assert!(dir.path().join("results.sqlite").exists());
    }

    #[test]
    fn test_sql_file_writer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.sql");
        let mut writer = SqlFileWriter::new(&path);
        writer.execute_sql("CREATE TABLE t (x INT);").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "CREATE TABLE t (x INT);");
    }
}
