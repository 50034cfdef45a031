use super::migrations::init_with_migrations;
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE_NAME: &str = "registrar.db";

/// An open, migrated database with foreign keys enforced.
pub struct Db {
    pub conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Db> {
        let conn = Connection::open(path)?;
        Self::prepare(conn)
    }

    pub fn in_memory() -> Result<Db> {
        Self::prepare(Connection::open_in_memory()?)
    }

    /// Raw connection with foreign keys on but no schema applied.
    pub fn new_without_migrations(path: impl AsRef<Path>) -> Result<Connection> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }

    fn prepare(mut conn: Connection) -> Result<Db> {
        conn.pragma_update(None, "foreign_keys", true)?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }
}
