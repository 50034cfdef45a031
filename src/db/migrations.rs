//! Versioned schema migrations.
//!
//! Pending migrations run in version order inside a single transaction and are
//! recorded in the `migrations` table, so opening an up-to-date database is a
//! no-op.
//!
//! Identifier columns that must be unique regardless of letter case are
//! declared `COLLATE NOCASE`; the unique indexes inherit the collation.
//! Foreign keys never cascade on their own: removing a course or subject with
//! dependents is an explicit, transactional operation in the repositories.
//!
//! ```rust
//! use registrar::db::migrations::{get_db_version, init_with_migrations};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open_in_memory()?;
//! init_with_migrations(&mut conn)?;
//! assert!(get_db_version(&conn)? > 0);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::libs::messages::Message;
use crate::{msg_debug, msg_error};
use anyhow::Result;
use rusqlite::{params, Connection, Transaction};

const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Debug, Clone)]
struct Migration {
    version: u32,
    name: &'static str,
    up: fn(&Transaction) -> Result<()>,
}

pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: people and catalogue
        self.add_migration(1, "create_core_tables", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS management (
                    id INTEGER PRIMARY KEY,
                    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    password_hash TEXT NOT NULL,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    last_login TIMESTAMP
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS courses (
                    id INTEGER PRIMARY KEY,
                    code TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    name TEXT NOT NULL,
                    description TEXT,
                    duration_years INTEGER NOT NULL DEFAULT 3,
                    total_semesters INTEGER NOT NULL DEFAULT 6,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS subjects (
                    id INTEGER PRIMARY KEY,
                    code TEXT NOT NULL COLLATE NOCASE,
                    name TEXT NOT NULL,
                    course_id INTEGER NOT NULL REFERENCES courses(id),
                    year INTEGER NOT NULL,
                    semester INTEGER NOT NULL,
                    credits INTEGER NOT NULL DEFAULT 3,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (code, course_id)
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS lecturers (
                    id INTEGER PRIMARY KEY,
                    lecturer_id TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    name TEXT NOT NULL,
                    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    email TEXT,
                    password_hash TEXT NOT NULL,
                    password_encrypted TEXT NOT NULL,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    last_login TIMESTAMP
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS students (
                    id INTEGER PRIMARY KEY,
                    roll_number TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    name TEXT NOT NULL,
                    course_id INTEGER NOT NULL REFERENCES courses(id),
                    academic_year INTEGER NOT NULL,
                    current_semester INTEGER NOT NULL DEFAULT 1,
                    email TEXT,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                [],
            )?;

            tx.execute("CREATE INDEX IF NOT EXISTS idx_subjects_course ON subjects(course_id)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_students_course ON students(course_id, academic_year)", [])?;
            Ok(())
        });

        // Version 2: who teaches what, who studies what
        self.add_migration(2, "add_assignments_and_enrollments", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS subject_assignments (
                    id INTEGER PRIMARY KEY,
                    lecturer_id INTEGER NOT NULL REFERENCES lecturers(id),
                    subject_id INTEGER NOT NULL REFERENCES subjects(id),
                    academic_year INTEGER NOT NULL,
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (lecturer_id, subject_id, academic_year)
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS student_enrollments (
                    id INTEGER PRIMARY KEY,
                    student_id INTEGER NOT NULL REFERENCES students(id),
                    subject_id INTEGER NOT NULL REFERENCES subjects(id),
                    is_active BOOLEAN NOT NULL DEFAULT TRUE,
                    enrolled_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (student_id, subject_id)
                )",
                [],
            )?;

            tx.execute("CREATE INDEX IF NOT EXISTS idx_enrollments_subject ON student_enrollments(subject_id)", [])?;
            Ok(())
        });

        // Version 3: daily attendance and its monthly roll-up
        self.add_migration(3, "add_attendance", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS attendance_records (
                    id INTEGER PRIMARY KEY,
                    student_id INTEGER NOT NULL REFERENCES students(id),
                    subject_id INTEGER NOT NULL REFERENCES subjects(id),
                    lecturer_id INTEGER NOT NULL REFERENCES lecturers(id),
                    date DATE NOT NULL,
                    status TEXT NOT NULL CHECK (status IN ('present', 'absent')),
                    remarks TEXT,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (student_id, subject_id, date)
                )",
                [],
            )?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS monthly_attendance_summaries (
                    id INTEGER PRIMARY KEY,
                    subject_id INTEGER NOT NULL REFERENCES subjects(id),
                    lecturer_id INTEGER NOT NULL REFERENCES lecturers(id),
                    month INTEGER NOT NULL,
                    year INTEGER NOT NULL,
                    total_classes INTEGER NOT NULL DEFAULT 0,
                    total_students INTEGER NOT NULL DEFAULT 0,
                    average_attendance REAL NOT NULL DEFAULT 0,
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (subject_id, lecturer_id, month, year)
                )",
                [],
            )?;

            tx.execute("CREATE INDEX IF NOT EXISTS idx_attendance_subject_date ON attendance_records(subject_id, date)", [])?;
            Ok(())
        });

        // Version 4: assessment marks
        self.add_migration(4, "add_student_marks", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS student_marks (
                    id INTEGER PRIMARY KEY,
                    student_id INTEGER NOT NULL REFERENCES students(id),
                    subject_id INTEGER NOT NULL REFERENCES subjects(id),
                    lecturer_id INTEGER NOT NULL REFERENCES lecturers(id),
                    assessment_type TEXT NOT NULL
                        CHECK (assessment_type IN ('internal1', 'internal2', 'assignment', 'project')),
                    marks_obtained REAL NOT NULL,
                    max_marks REAL NOT NULL,
                    percentage REAL NOT NULL,
                    grade TEXT NOT NULL,
                    remarks TEXT,
                    assessment_date DATE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (student_id, subject_id, assessment_type)
                )",
                [],
            )?;

            tx.execute("CREATE INDEX IF NOT EXISTS idx_marks_subject ON student_marks(subject_id, assessment_type)", [])?;
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Applies every migration newer than the recorded version, all or nothing.
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        let current_version = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            msg_debug!(Message::DatabaseUpToDate);
            return Ok(());
        }

        msg_debug!(Message::MigrationsFound(pending.len()));

        let tx = conn.transaction()?;
        for migration in pending {
            msg_debug!(Message::RunningMigration(migration.version, migration.name.to_string()));

            if let Err(e) = (migration.up)(&tx) {
                msg_error!(Message::MigrationFailed(migration.version, e.to_string()));
                return Err(e);
            }
            tx.execute(
                "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                params![migration.version, migration.name],
            )?;
        }
        tx.commit()?;

        tracing::info!(version = self.latest_version(), "database schema migrated");
        Ok(())
    }

    fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn.query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0)).unwrap_or(Some(0));
        Ok(version.unwrap_or(0))
    }

    fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    /// `(version, name, applied_at)` of every applied migration.
    pub fn get_migration_history(&self, conn: &Connection) -> Result<Vec<(u32, String, String)>> {
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;
        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(history)
    }
}

pub fn init_with_migrations(conn: &mut Connection) -> Result<()> {
    MigrationManager::new().run_migrations(conn)
}

pub fn get_db_version(conn: &Connection) -> Result<u32> {
    MigrationManager::new().get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> Result<bool> {
    let manager = MigrationManager::new();
    Ok(manager.get_current_version(conn)? < manager.latest_version())
}
