use super::unique_violation;
use crate::libs::error::{ReferenceError, RegistrarResult, StoreError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

const INSERT_SUBJECT: &str = "INSERT INTO subjects (code, name, course_id, year, semester, credits) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
pub(crate) const SELECT_SUBJECTS: &str = "SELECT s.id, s.code, s.name, s.course_id, c.code, s.year, s.semester, s.credits, s.is_active
    FROM subjects s JOIN courses c ON c.id = s.course_id";
const COUNT_SUBJECT_DEPENDENTS: &str = "SELECT
    (SELECT COUNT(*) FROM subject_assignments WHERE subject_id = ?1)
    + (SELECT COUNT(*) FROM student_enrollments WHERE subject_id = ?1)
    + (SELECT COUNT(*) FROM attendance_records WHERE subject_id = ?1)
    + (SELECT COUNT(*) FROM student_marks WHERE subject_id = ?1)";
const CASCADE_SUBJECT: &[&str] = &[
    "DELETE FROM student_marks WHERE subject_id = ?1",
    "DELETE FROM attendance_records WHERE subject_id = ?1",
    "DELETE FROM monthly_attendance_summaries WHERE subject_id = ?1",
    "DELETE FROM student_enrollments WHERE subject_id = ?1",
    "DELETE FROM subject_assignments WHERE subject_id = ?1",
];
const DELETE_SUBJECT: &str = "DELETE FROM subjects WHERE id = ?1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub course_id: i64,
    pub course_code: String,
    pub year: u32,
    pub semester: u32,
    pub credits: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewSubject {
    pub code: String,
    pub name: String,
    pub course_id: i64,
    pub year: u32,
    pub semester: u32,
    pub credits: u32,
}

pub(crate) fn map_subject(row: &Row) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        course_id: row.get(3)?,
        course_code: row.get(4)?,
        year: row.get(5)?,
        semester: row.get(6)?,
        credits: row.get(7)?,
        is_active: row.get(8)?,
    })
}

pub struct Subjects<'a> {
    conn: &'a Connection,
}

impl<'a> Subjects<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, subject: &NewSubject) -> RegistrarResult<i64> {
        self.conn
            .execute(
                INSERT_SUBJECT,
                params![subject.code, subject.name, subject.course_id, subject.year, subject.semester, subject.credits],
            )
            .map_err(|e| unique_violation(e, &subject.code))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All subjects, optionally limited to one course code.
    pub fn list(&self, course_code: Option<&str>) -> RegistrarResult<Vec<Subject>> {
        let sql = format!(
            "{} WHERE (?1 IS NULL OR c.code = ?1 COLLATE NOCASE) ORDER BY c.code, s.year, s.semester, s.code",
            SELECT_SUBJECTS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let subjects = stmt.query_map(params![course_code], map_subject)?.collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }

    /// Every subject carrying `code`, across courses.
    pub fn find_by_code(&self, code: &str) -> RegistrarResult<Vec<Subject>> {
        let mut stmt = self.conn.prepare(&format!("{} WHERE s.code = ?1 ORDER BY c.code", SELECT_SUBJECTS))?;
        let subjects = stmt.query_map(params![code.trim()], map_subject)?.collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }

    pub fn get_by_id(&self, id: i64) -> RegistrarResult<Option<Subject>> {
        let subject = self
            .conn
            .query_row(&format!("{} WHERE s.id = ?1", SELECT_SUBJECTS), params![id], map_subject)
            .optional()?;
        Ok(subject)
    }

    /// Resolves a subject code, using `course_code` when the code exists in
    /// more than one course.
    pub fn resolve(&self, code: &str, course_code: Option<&str>) -> RegistrarResult<Subject> {
        let mut matches = self.find_by_code(code)?;
        if let Some(course) = course_code {
            matches.retain(|s| s.course_code.eq_ignore_ascii_case(course.trim()));
        }
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(ReferenceError::UnknownSubject { code: code.to_string() }.into()),
            _ => Err(StoreError::NotFound(format!("subject {} exists in several courses; pass --course", code)).into()),
        }
    }

    pub fn delete(&self, subject: &Subject, cascade: bool) -> RegistrarResult<i64> {
        let records: i64 = self.conn.query_row(COUNT_SUBJECT_DEPENDENTS, params![subject.id], |row| row.get(0))?;
        if records > 0 && !cascade {
            return Err(StoreError::SubjectInUse {
                code: subject.code.clone(),
                records,
            }
            .into());
        }

        let tx = self.conn.unchecked_transaction()?;
        for statement in CASCADE_SUBJECT {
            tx.execute(statement, params![subject.id])?;
        }
        tx.execute(DELETE_SUBJECT, params![subject.id])?;
        tx.commit()?;

        tracing::info!(code = %subject.code, course = %subject.course_code, records, "subject deleted");
        Ok(records)
    }
}
