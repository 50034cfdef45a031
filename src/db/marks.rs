use super::students::course_label;
use crate::libs::error::{RegistrarResult, ValidationError};
use crate::libs::grading::{percentage, Grade};
use crate::libs::ordering::{OrderingRules, Ranked, SortKey};
use crate::libs::validate;
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row, ToSql};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const UPSERT_MARKS: &str = "INSERT INTO student_marks
        (student_id, subject_id, lecturer_id, assessment_type, marks_obtained, max_marks, percentage, grade, remarks, assessment_date)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT (student_id, subject_id, assessment_type) DO UPDATE SET
        lecturer_id = excluded.lecturer_id,
        marks_obtained = excluded.marks_obtained,
        max_marks = excluded.max_marks,
        percentage = excluded.percentage,
        grade = excluded.grade,
        remarks = excluded.remarks,
        assessment_date = excluded.assessment_date";
const SELECT_MARKS: &str = "SELECT m.id, st.id, st.roll_number, st.name, c.code, c.name, sb.code, sb.name,
        m.assessment_type, m.marks_obtained, m.max_marks, m.percentage, m.grade, m.remarks, m.assessment_date
    FROM student_marks m
    JOIN students st ON st.id = m.student_id
    JOIN courses c ON c.id = st.course_id
    JOIN subjects sb ON sb.id = m.subject_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentType {
    Internal1,
    Internal2,
    Assignment,
    Project,
}

impl AssessmentType {
    pub const ALL: [AssessmentType; 4] = [
        AssessmentType::Internal1,
        AssessmentType::Internal2,
        AssessmentType::Assignment,
        AssessmentType::Project,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Internal1 => "internal1",
            AssessmentType::Internal2 => "internal2",
            AssessmentType::Assignment => "assignment",
            AssessmentType::Project => "project",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_lowercase();
        match key.as_str() {
            "internal1" => Ok(AssessmentType::Internal1),
            "internal2" => Ok(AssessmentType::Internal2),
            "assignment" => Ok(AssessmentType::Assignment),
            "project" => Ok(AssessmentType::Project),
            _ => Err(ValidationError::format("assessment_type")),
        }
    }
}

impl ToSql for AssessmentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AssessmentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Marks for one student in one assessment, before grading.
#[derive(Debug, Clone)]
pub struct MarksEntry {
    pub student_id: i64,
    pub subject_id: i64,
    pub lecturer_id: i64,
    pub assessment_type: AssessmentType,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub remarks: Option<String>,
    pub assessment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarksRecord {
    pub id: i64,
    pub student_id: i64,
    pub roll_number: String,
    pub student_name: String,
    pub course_code: String,
    pub course_name: String,
    pub subject_code: String,
    pub subject_name: String,
    pub assessment_type: AssessmentType,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub percentage: f64,
    pub grade: String,
    pub remarks: Option<String>,
    pub assessment_date: Option<NaiveDate>,
}

impl Ranked for MarksRecord {
    fn sort_key(&self, rules: &OrderingRules) -> SortKey {
        rules.student_key(&course_label(&self.course_name, &self.course_code), &self.roll_number)
    }
}

fn map_marks(row: &Row) -> rusqlite::Result<MarksRecord> {
    Ok(MarksRecord {
        id: row.get(0)?,
        student_id: row.get(1)?,
        roll_number: row.get(2)?,
        student_name: row.get(3)?,
        course_code: row.get(4)?,
        course_name: row.get(5)?,
        subject_code: row.get(6)?,
        subject_name: row.get(7)?,
        assessment_type: row.get(8)?,
        marks_obtained: row.get(9)?,
        max_marks: row.get(10)?,
        percentage: row.get(11)?,
        grade: row.get(12)?,
        remarks: row.get(13)?,
        assessment_date: row.get(14)?,
    })
}

pub struct Marks<'a> {
    conn: &'a Connection,
}

impl<'a> Marks<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Validates, grades and stores an entry, replacing earlier marks for the
    /// same assessment. Returns the computed percentage and grade.
    pub fn record(&self, entry: &MarksEntry) -> RegistrarResult<(f64, Grade)> {
        validate::marks(entry.marks_obtained, entry.max_marks)?;
        let pct = percentage(entry.marks_obtained, entry.max_marks);
        let grade = Grade::from_percentage(pct);

        self.conn.execute(
            UPSERT_MARKS,
            params![
                entry.student_id,
                entry.subject_id,
                entry.lecturer_id,
                entry.assessment_type,
                entry.marks_obtained,
                entry.max_marks,
                pct,
                grade.as_str(),
                entry.remarks,
                entry.assessment_date
            ],
        )?;
        Ok((pct, grade))
    }

    pub fn for_subject(&self, subject: i64, assessment: Option<AssessmentType>) -> RegistrarResult<Vec<MarksRecord>> {
        let sql = format!("{} WHERE m.subject_id = ?1 AND (?2 IS NULL OR m.assessment_type = ?2)", SELECT_MARKS);
        let mut stmt = self.conn.prepare(&sql)?;
        let marks = stmt
            .query_map(params![subject, assessment], map_marks)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(marks)
    }

    pub fn for_student(&self, student: i64) -> RegistrarResult<Vec<MarksRecord>> {
        let sql = format!("{} WHERE m.student_id = ?1 ORDER BY sb.code, m.assessment_type", SELECT_MARKS);
        let mut stmt = self.conn.prepare(&sql)?;
        let marks = stmt.query_map(params![student], map_marks)?.collect::<Result<Vec<_>, _>>()?;
        Ok(marks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assessment_spellings() {
        assert_eq!("Internal 1".parse::<AssessmentType>().unwrap(), AssessmentType::Internal1);
        assert_eq!("internal_2".parse::<AssessmentType>().unwrap(), AssessmentType::Internal2);
        assert_eq!("PROJECT".parse::<AssessmentType>().unwrap(), AssessmentType::Project);
        assert!("final".parse::<AssessmentType>().is_err());
    }
}
