use super::unique_violation;
use crate::libs::error::{ReferenceError, RegistrarResult};
use crate::libs::ordering::{OrderingRules, Ranked, SortKey};
use crate::libs::secret::EncodedPassword;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

const INSERT_LECTURER: &str = "INSERT INTO lecturers (lecturer_id, name, username, email, password_hash, password_encrypted)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const SELECT_LECTURERS: &str = "SELECT id, lecturer_id, name, username, email, password_hash, password_encrypted, is_active, created_at, last_login
    FROM lecturers";
const SELECT_IDENTIFIERS: &str = "SELECT lecturer_id, username FROM lecturers";
const UPDATE_ACTIVE: &str = "UPDATE lecturers SET is_active = ?2 WHERE id = ?1";
const UPDATE_PASSWORD: &str = "UPDATE lecturers SET password_hash = ?2, password_encrypted = ?3 WHERE id = ?1";
const UPDATE_NAME: &str = "UPDATE lecturers SET name = ?2 WHERE id = ?1";
const UPDATE_LAST_LOGIN: &str = "UPDATE lecturers SET last_login = CURRENT_TIMESTAMP WHERE id = ?1";

/// A stored lecturer. Credential material is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lecturer {
    pub id: i64,
    pub lecturer_id: String,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub password_encrypted: String,
    pub is_active: bool,
    pub created_at: Option<String>,
    pub last_login: Option<String>,
}

impl Ranked for Lecturer {
    fn sort_key(&self, rules: &OrderingRules) -> SortKey {
        rules.lecturer_key(&self.lecturer_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewLecturer {
    pub lecturer_id: String,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub password: EncodedPassword,
}

fn map_lecturer(row: &Row) -> rusqlite::Result<Lecturer> {
    Ok(Lecturer {
        id: row.get(0)?,
        lecturer_id: row.get(1)?,
        name: row.get(2)?,
        username: row.get(3)?,
        email: row.get(4)?,
        password_hash: row.get(5)?,
        password_encrypted: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
        last_login: row.get(9)?,
    })
}

pub struct Lecturers<'a> {
    conn: &'a Connection,
}

impl<'a> Lecturers<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, lecturer: &NewLecturer) -> RegistrarResult<i64> {
        self.conn
            .execute(
                INSERT_LECTURER,
                params![
                    lecturer.lecturer_id,
                    lecturer.name,
                    lecturer.username,
                    lecturer.email,
                    lecturer.password.hash,
                    lecturer.password.encrypted
                ],
            )
            .map_err(|e| unique_violation(e, &lecturer.lecturer_id))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Storage order; callers order for display with [`crate::libs::ordering::order`].
    pub fn list(&self) -> RegistrarResult<Vec<Lecturer>> {
        let mut stmt = self.conn.prepare(SELECT_LECTURERS)?;
        let lecturers = stmt.query_map([], map_lecturer)?.collect::<Result<Vec<_>, _>>()?;
        Ok(lecturers)
    }

    pub fn get_by_lecturer_id(&self, lecturer_id: &str) -> RegistrarResult<Option<Lecturer>> {
        let lecturer = self
            .conn
            .query_row(&format!("{} WHERE lecturer_id = ?1", SELECT_LECTURERS), params![lecturer_id.trim()], map_lecturer)
            .optional()?;
        Ok(lecturer)
    }

    pub fn require(&self, lecturer_id: &str) -> RegistrarResult<Lecturer> {
        self.get_by_lecturer_id(lecturer_id)?.ok_or_else(|| {
            ReferenceError::UnknownLecturer {
                lecturer_id: lecturer_id.to_string(),
            }
            .into()
        })
    }

    pub fn get_by_username(&self, username: &str) -> RegistrarResult<Option<Lecturer>> {
        let lecturer = self
            .conn
            .query_row(&format!("{} WHERE username = ?1", SELECT_LECTURERS), params![username.trim()], map_lecturer)
            .optional()?;
        Ok(lecturer)
    }

    /// `(lecturer_id, username)` of every lecturer, active or not.
    pub fn identities(&self) -> RegistrarResult<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare(SELECT_IDENTIFIERS)?;
        let identities = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?.collect::<Result<Vec<_>, _>>()?;
        Ok(identities)
    }

    pub fn set_active(&self, id: i64, active: bool) -> RegistrarResult<()> {
        self.conn.execute(UPDATE_ACTIVE, params![id, active])?;
        Ok(())
    }

    /// Flips the active flag and returns the new state.
    pub fn toggle(&self, lecturer_id: &str) -> RegistrarResult<bool> {
        let lecturer = self.require(lecturer_id)?;
        let active = !lecturer.is_active;
        self.set_active(lecturer.id, active)?;
        tracing::info!(lecturer_id = %lecturer.lecturer_id, active, "lecturer status changed");
        Ok(active)
    }

    pub fn update_password(&self, id: i64, password: &EncodedPassword) -> RegistrarResult<()> {
        self.conn.execute(UPDATE_PASSWORD, params![id, password.hash, password.encrypted])?;
        Ok(())
    }

    pub fn rename(&self, id: i64, name: &str) -> RegistrarResult<()> {
        self.conn.execute(UPDATE_NAME, params![id, name.trim()])?;
        Ok(())
    }

    pub fn touch_login(&self, id: i64) -> RegistrarResult<()> {
        self.conn.execute(UPDATE_LAST_LOGIN, params![id])?;
        Ok(())
    }
}
