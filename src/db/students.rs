use super::unique_violation;
use crate::libs::error::{ReferenceError, RegistrarResult};
use crate::libs::ordering::{OrderingRules, Ranked, SortKey};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

const INSERT_STUDENT: &str = "INSERT INTO students (roll_number, name, course_id, academic_year, current_semester, email)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
pub(crate) const SELECT_STUDENTS: &str = "SELECT st.id, st.roll_number, st.name, st.course_id, c.code, c.name,
        st.academic_year, st.current_semester, st.email, st.is_active, st.created_at
    FROM students st JOIN courses c ON c.id = st.course_id";
const SELECT_ROLL_NUMBERS: &str = "SELECT roll_number FROM students";
const UPDATE_ACTIVE: &str = "UPDATE students SET is_active = ?2 WHERE id = ?1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: i64,
    pub roll_number: String,
    pub name: String,
    pub course_id: i64,
    pub course_code: String,
    pub course_name: String,
    pub academic_year: u32,
    pub current_semester: u32,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: Option<String>,
}

impl Student {
    /// Text matched against the course priority patterns.
    pub fn course_label(&self) -> String {
        course_label(&self.course_name, &self.course_code)
    }
}

pub fn course_label(course_name: &str, course_code: &str) -> String {
    format!("{} {}", course_name, course_code)
}

impl Ranked for Student {
    fn sort_key(&self, rules: &OrderingRules) -> SortKey {
        rules.student_key(&self.course_label(), &self.roll_number)
    }
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub roll_number: String,
    pub name: String,
    pub course_id: i64,
    pub academic_year: u32,
    pub current_semester: u32,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub course_code: Option<String>,
    pub academic_year: Option<u32>,
    pub active_only: bool,
}

pub(crate) fn map_student(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        roll_number: row.get(1)?,
        name: row.get(2)?,
        course_id: row.get(3)?,
        course_code: row.get(4)?,
        course_name: row.get(5)?,
        academic_year: row.get(6)?,
        current_semester: row.get(7)?,
        email: row.get(8)?,
        is_active: row.get(9)?,
        created_at: row.get(10)?,
    })
}

pub struct Students<'a> {
    conn: &'a Connection,
}

impl<'a> Students<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, student: &NewStudent) -> RegistrarResult<i64> {
        self.conn
            .execute(
                INSERT_STUDENT,
                params![
                    student.roll_number,
                    student.name,
                    student.course_id,
                    student.academic_year,
                    student.current_semester,
                    student.email
                ],
            )
            .map_err(|e| unique_violation(e, &student.roll_number))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list(&self, filter: &StudentFilter) -> RegistrarResult<Vec<Student>> {
        let sql = format!(
            "{} WHERE (?1 IS NULL OR c.code = ?1 COLLATE NOCASE)
                AND (?2 IS NULL OR st.academic_year = ?2)
                AND (?3 = 0 OR st.is_active = 1)",
            SELECT_STUDENTS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let students = stmt
            .query_map(params![filter.course_code, filter.academic_year, filter.active_only], map_student)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    pub fn get_by_roll(&self, roll_number: &str) -> RegistrarResult<Option<Student>> {
        let student = self
            .conn
            .query_row(&format!("{} WHERE st.roll_number = ?1", SELECT_STUDENTS), params![roll_number.trim()], map_student)
            .optional()?;
        Ok(student)
    }

    pub fn require(&self, roll_number: &str) -> RegistrarResult<Student> {
        self.get_by_roll(roll_number)?.ok_or_else(|| {
            ReferenceError::UnknownStudent {
                roll_number: roll_number.to_string(),
            }
            .into()
        })
    }

    pub fn roll_numbers(&self) -> RegistrarResult<Vec<String>> {
        let mut stmt = self.conn.prepare(SELECT_ROLL_NUMBERS)?;
        let rolls = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<_>, _>>()?;
        Ok(rolls)
    }

    pub fn toggle(&self, roll_number: &str) -> RegistrarResult<bool> {
        let student = self.require(roll_number)?;
        let active = !student.is_active;
        self.conn.execute(UPDATE_ACTIVE, params![student.id, active])?;
        tracing::info!(roll_number = %student.roll_number, active, "student status changed");
        Ok(active)
    }
}
