use super::students::{map_student, Student, SELECT_STUDENTS};
use super::subjects::{map_subject, Subject, SELECT_SUBJECTS};
use crate::libs::error::RegistrarResult;
use rusqlite::{params, Connection};

const UPSERT_ENROLLMENT: &str = "INSERT INTO student_enrollments (student_id, subject_id) VALUES (?1, ?2)
    ON CONFLICT (student_id, subject_id) DO UPDATE SET is_active = 1";
const DEACTIVATE_ENROLLMENT: &str = "UPDATE student_enrollments SET is_active = 0 WHERE student_id = ?1 AND subject_id = ?2 AND is_active = 1";
const COUNT_ACTIVE: &str = "SELECT COUNT(*) FROM student_enrollments WHERE student_id = ?1 AND subject_id = ?2 AND is_active = 1";
const COUNT_IN_SUBJECT: &str = "SELECT COUNT(*) FROM student_enrollments WHERE subject_id = ?1 AND is_active = 1";

pub struct Enrollments<'a> {
    conn: &'a Connection,
}

impl<'a> Enrollments<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn enroll(&self, student: i64, subject: i64) -> RegistrarResult<()> {
        self.conn.execute(UPSERT_ENROLLMENT, params![student, subject])?;
        Ok(())
    }

    /// `false` when there was no active enrollment to end.
    pub fn unenroll(&self, student: i64, subject: i64) -> RegistrarResult<bool> {
        Ok(self.conn.execute(DEACTIVATE_ENROLLMENT, params![student, subject])? > 0)
    }

    pub fn is_enrolled(&self, student: i64, subject: i64) -> RegistrarResult<bool> {
        let count: i64 = self.conn.query_row(COUNT_ACTIVE, params![student, subject], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Active students with an active enrollment in `subject`.
    pub fn students_in(&self, subject: i64) -> RegistrarResult<Vec<Student>> {
        let sql = format!(
            "{} JOIN student_enrollments e ON e.student_id = st.id
             WHERE e.subject_id = ?1 AND e.is_active = 1 AND st.is_active = 1",
            SELECT_STUDENTS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let students = stmt.query_map(params![subject], map_student)?.collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    pub fn count_in(&self, subject: i64) -> RegistrarResult<i64> {
        Ok(self.conn.query_row(COUNT_IN_SUBJECT, params![subject], |row| row.get(0))?)
    }

    /// Subjects `student` is actively enrolled in, by year, semester and code.
    pub fn subjects_of(&self, student: i64) -> RegistrarResult<Vec<Subject>> {
        let sql = format!(
            "{} JOIN student_enrollments e ON e.subject_id = s.id
             WHERE e.student_id = ?1 AND e.is_active = 1
             ORDER BY s.year, s.semester, s.code",
            SELECT_SUBJECTS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let subjects = stmt.query_map(params![student], map_subject)?.collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }
}
