// Database bootstrap: canonical on-disk location, connection settings and
// the owning handle.

pub mod catalog;
pub mod gateway;
pub mod integrity;
pub mod migrations;
pub mod seed;

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::constants::{APP_FOLDER, DB_FILENAME};
use crate::error::{FilmlogError, Result};

/// Canonical database path under the user's home folder, creating the
/// application folder on first use.
pub fn default_db_path() -> Result<PathBuf> {
    let dirs = directories::UserDirs::new()
        .ok_or_else(|| FilmlogError::InvalidPath("no home directory".to_string()))?;
    let folder = dirs.home_dir().join(APP_FOLDER);
    fs::create_dir_all(&folder)?;
    Ok(folder.join(DB_FILENAME))
}

/// Open a connection with the settings every writer needs and bring the
/// file up to the current schema version.
pub fn open_db(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Read-only connection for inspection. Skips migrations and foreign-key
/// enforcement; a handle that performs no writes has no integrity to protect.
pub fn open_db_read_only(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
    Ok(conn)
}

/// The owning database handle. Holds the connection together with the file
/// path it was opened from, so transfers can close and reopen it.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_db(path)?;
        log::info!("Opened database at {}", path.display());
        Ok(Store {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection, giving back the path. Used when the file is
    /// about to be replaced or copied.
    pub fn close(self) -> Result<PathBuf> {
        self.conn
            .close()
            .map_err(|(_, err)| FilmlogError::Database(err))?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_and_migrates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filmlog.db");

        let store = Store::open(&path).unwrap();
        assert_eq!(
            migrations::get_schema_version(store.conn()).unwrap(),
            migrations::DB_VERSION
        );

        let reopened_path = store.close().unwrap();
        assert_eq!(reopened_path, path);

        // Second open is a no-op migration-wise
        let store = Store::open(&path).unwrap();
        let report = integrity::verify_database(store.conn()).unwrap();
        assert!(report.is_valid(), "failures: {:?}", report.failures);
    }

    #[test]
    fn read_only_handle_refuses_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filmlog.db");
        Store::open(&path).unwrap().close().unwrap();

        let conn = open_db_read_only(&path).unwrap();
        let report = integrity::verify_database(&conn).unwrap();
        assert!(report.is_valid());
        assert!(conn
            .execute("INSERT INTO filters (make, model) VALUES ('x', 'y')", [])
            .is_err());
    }
}
