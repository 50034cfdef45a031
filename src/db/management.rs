use super::unique_violation;
use crate::libs::error::RegistrarResult;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

const INSERT_ADMIN: &str = "INSERT INTO management (username, password_hash) VALUES (?1, ?2)";
const SELECT_ADMIN: &str = "SELECT id, username, password_hash, is_active, last_login FROM management WHERE username = ?1";
const UPDATE_LAST_LOGIN: &str = "UPDATE management SET last_login = CURRENT_TIMESTAMP WHERE id = ?1";

/// An administrative account. Only the hash of its password is stored.
#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_active: bool,
    pub last_login: Option<String>,
}

pub struct Management<'a> {
    conn: &'a Connection,
}

impl<'a> Management<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, username: &str, password_hash: &str) -> RegistrarResult<i64> {
        let username = username.trim();
        self.conn
            .execute(INSERT_ADMIN, params![username, password_hash])
            .map_err(|e| unique_violation(e, username))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Case-insensitive lookup.
    pub fn get_by_username(&self, username: &str) -> RegistrarResult<Option<Admin>> {
        let admin = self
            .conn
            .query_row(SELECT_ADMIN, params![username.trim()], |row| {
                Ok(Admin {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                    is_active: row.get(3)?,
                    last_login: row.get(4)?,
                })
            })
            .optional()?;
        Ok(admin)
    }

    pub fn touch_login(&self, id: i64) -> RegistrarResult<()> {
        self.conn.execute(UPDATE_LAST_LOGIN, params![id])?;
        Ok(())
    }
}
