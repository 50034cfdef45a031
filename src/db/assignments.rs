use crate::libs::error::RegistrarResult;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

// Re-assigning an inactive triple reactivates it instead of failing.
const UPSERT_ASSIGNMENT: &str = "INSERT INTO subject_assignments (lecturer_id, subject_id, academic_year) VALUES (?1, ?2, ?3)
    ON CONFLICT (lecturer_id, subject_id, academic_year) DO UPDATE SET is_active = 1";
const DEACTIVATE_ASSIGNMENT: &str = "UPDATE subject_assignments SET is_active = 0
    WHERE lecturer_id = ?1 AND subject_id = ?2 AND (?3 IS NULL OR academic_year = ?3) AND is_active = 1";
const SELECT_ASSIGNMENTS: &str = "SELECT a.id, l.lecturer_id, l.name, sb.id, sb.code, sb.name, c.code, a.academic_year, a.is_active
    FROM subject_assignments a
    JOIN lecturers l ON l.id = a.lecturer_id
    JOIN subjects sb ON sb.id = a.subject_id
    JOIN courses c ON c.id = sb.course_id";
const COUNT_ACTIVE: &str = "SELECT COUNT(*) FROM subject_assignments WHERE lecturer_id = ?1 AND subject_id = ?2 AND is_active = 1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: i64,
    pub lecturer_id: String,
    pub lecturer_name: String,
    pub subject_id: i64,
    pub subject_code: String,
    pub subject_name: String,
    pub course_code: String,
    pub academic_year: i32,
    pub is_active: bool,
}

pub struct Assignments<'a> {
    conn: &'a Connection,
}

impl<'a> Assignments<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Takes row ids, not lecturer identifiers.
    pub fn assign(&self, lecturer: i64, subject: i64, academic_year: i32) -> RegistrarResult<()> {
        self.conn.execute(UPSERT_ASSIGNMENT, params![lecturer, subject, academic_year])?;
        Ok(())
    }

    /// Deactivates the assignment for `academic_year`, or for every year when
    /// `None`. Returns the number of assignments touched.
    pub fn unassign(&self, lecturer: i64, subject: i64, academic_year: Option<i32>) -> RegistrarResult<usize> {
        Ok(self.conn.execute(DEACTIVATE_ASSIGNMENT, params![lecturer, subject, academic_year])?)
    }

    pub fn is_assigned(&self, lecturer: i64, subject: i64) -> RegistrarResult<bool> {
        let count: i64 = self.conn.query_row(COUNT_ACTIVE, params![lecturer, subject], |row| row.get(0))?;
        Ok(count > 0)
    }

    pub fn for_lecturer(&self, lecturer: i64) -> RegistrarResult<Vec<Assignment>> {
        let sql = format!("{} WHERE a.lecturer_id = ?1 ORDER BY a.academic_year DESC, c.code, sb.code", SELECT_ASSIGNMENTS);
        let mut stmt = self.conn.prepare(&sql)?;
        let assignments = stmt
            .query_map(params![lecturer], |row| {
                Ok(Assignment {
                    id: row.get(0)?,
                    lecturer_id: row.get(1)?,
                    lecturer_name: row.get(2)?,
                    subject_id: row.get(3)?,
                    subject_code: row.get(4)?,
                    subject_name: row.get(5)?,
                    course_code: row.get(6)?,
                    academic_year: row.get(7)?,
                    is_active: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }

    pub fn active_count_for_course(&self, course_id: i64) -> RegistrarResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(DISTINCT a.lecturer_id) FROM subject_assignments a JOIN subjects sb ON sb.id = a.subject_id
             WHERE sb.course_id = ?1 AND a.is_active = 1",
            params![course_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
