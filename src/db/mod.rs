//! SQLite persistence for every registrar entity.
//!
//! Each repository borrows a `rusqlite::Connection`, so the same repository
//! types work on a plain connection and inside a transaction (a
//! `rusqlite::Transaction` derefs to `Connection`). Batch operations open the
//! transaction at the call site and hand `&tx` to the repositories.
//!
//! ```rust
//! use registrar::db::{courses::{Courses, NewCourse}, db::Db};
//!
//! let db = Db::in_memory()?;
//! Courses::new(&db.conn).insert(&NewCourse::new("BCA", "Bachelor of Computer Applications"))?;
//! assert!(Courses::new(&db.conn).get_by_code("bca")?.is_some());
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::libs::error::{RegistrarError, ValidationError};
use rusqlite::ffi;

pub mod assignments;
pub mod attendance;
pub mod courses;
pub mod db;
pub mod enrollments;
pub mod lecturers;
pub mod management;
pub mod marks;
pub mod migrations;
pub mod students;
pub mod subjects;

/// Maps a UNIQUE constraint failure to `duplicate identifier`.
pub(crate) fn unique_violation(err: rusqlite::Error, identifier: &str) -> RegistrarError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => ValidationError::duplicate(identifier).into(),
        _ => err.into(),
    }
}
