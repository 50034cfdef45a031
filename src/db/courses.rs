use super::unique_violation;
use crate::libs::error::{ReferenceError, RegistrarResult, StoreError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

const INSERT_COURSE: &str = "INSERT INTO courses (code, name, description, duration_years, total_semesters) VALUES (?1, ?2, ?3, ?4, ?5)";
const SELECT_COURSES: &str = "SELECT id, code, name, description, duration_years, total_semesters, is_active, created_at FROM courses";
const COUNT_DEPENDENTS: &str = "SELECT
    (SELECT COUNT(*) FROM students WHERE course_id = ?1),
    (SELECT COUNT(*) FROM subjects WHERE course_id = ?1)";

// Cascade order: leaf tables first so no statement trips a foreign key.
const CASCADE_COURSE: &[&str] = &[
    "DELETE FROM student_marks WHERE subject_id IN (SELECT id FROM subjects WHERE course_id = ?1)
        OR student_id IN (SELECT id FROM students WHERE course_id = ?1)",
    "DELETE FROM attendance_records WHERE subject_id IN (SELECT id FROM subjects WHERE course_id = ?1)
        OR student_id IN (SELECT id FROM students WHERE course_id = ?1)",
    "DELETE FROM monthly_attendance_summaries WHERE subject_id IN (SELECT id FROM subjects WHERE course_id = ?1)",
    "DELETE FROM student_enrollments WHERE subject_id IN (SELECT id FROM subjects WHERE course_id = ?1)
        OR student_id IN (SELECT id FROM students WHERE course_id = ?1)",
    "DELETE FROM subject_assignments WHERE subject_id IN (SELECT id FROM subjects WHERE course_id = ?1)",
    "DELETE FROM students WHERE course_id = ?1",
    "DELETE FROM subjects WHERE course_id = ?1",
];
const DELETE_COURSE: &str = "DELETE FROM courses WHERE id = ?1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub duration_years: u32,
    pub total_semesters: u32,
    pub is_active: bool,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub duration_years: u32,
    pub total_semesters: u32,
}

impl NewCourse {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.trim().to_uppercase(),
            name: name.trim().to_string(),
            description: None,
            duration_years: 3,
            total_semesters: 6,
        }
    }
}

/// Rows removed by a course deletion.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CourseDeletion {
    pub students: i64,
    pub subjects: i64,
}

fn map_course(row: &Row) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        duration_years: row.get(4)?,
        total_semesters: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub struct Courses<'a> {
    conn: &'a Connection,
}

impl<'a> Courses<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, course: &NewCourse) -> RegistrarResult<i64> {
        self.conn
            .execute(
                INSERT_COURSE,
                params![course.code, course.name, course.description, course.duration_years, course.total_semesters],
            )
            .map_err(|e| unique_violation(e, &course.code))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list(&self) -> RegistrarResult<Vec<Course>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY code", SELECT_COURSES))?;
        let courses = stmt.query_map([], map_course)?.collect::<Result<Vec<_>, _>>()?;
        Ok(courses)
    }

    /// Case-insensitive lookup.
    pub fn get_by_code(&self, code: &str) -> RegistrarResult<Option<Course>> {
        let course = self
            .conn
            .query_row(&format!("{} WHERE code = ?1", SELECT_COURSES), params![code.trim()], map_course)
            .optional()?;
        Ok(course)
    }

    pub fn require(&self, code: &str) -> RegistrarResult<Course> {
        self.get_by_code(code)?
            .ok_or_else(|| ReferenceError::UnknownCourse { code: code.to_string() }.into())
    }

    pub fn dependents(&self, course_id: i64) -> RegistrarResult<CourseDeletion> {
        let (students, subjects) = self.conn.query_row(COUNT_DEPENDENTS, params![course_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(CourseDeletion { students, subjects })
    }

    /// Deletes a course. Refuses while students or subjects reference it
    /// unless `cascade` is set, in which case every dependent row goes in the
    /// same transaction.
    pub fn delete(&self, code: &str, cascade: bool) -> RegistrarResult<CourseDeletion> {
        let course = self.require(code)?;
        let dependents = self.dependents(course.id)?;

        if !cascade && (dependents.students > 0 || dependents.subjects > 0) {
            return Err(StoreError::CourseInUse {
                code: course.code,
                students: dependents.students,
                subjects: dependents.subjects,
            }
            .into());
        }

        let tx = self.conn.unchecked_transaction()?;
        if cascade {
            for statement in CASCADE_COURSE {
                tx.execute(statement, params![course.id])?;
            }
        }
        tx.execute(DELETE_COURSE, params![course.id])?;
        tx.commit()?;

        tracing::info!(code = %course.code, cascade, students = dependents.students, subjects = dependents.subjects, "course deleted");
        Ok(dependents)
    }
}
