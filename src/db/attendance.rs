//! Daily attendance and monthly summaries.
//!
//! Marking is an upsert per (student, subject, date): re-marking a day
//! replaces the earlier status. Monthly summaries are derived data and are
//! recomputed from the daily records every time they are requested.

use super::students::course_label;
use crate::libs::grading::{percentage, round2};
use crate::libs::ordering::{OrderingRules, Ranked, SortKey};
use chrono::{Datelike, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ToSql};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::libs::error::{RegistrarResult, ValidationError};

const UPSERT_ATTENDANCE: &str = "INSERT INTO attendance_records (student_id, subject_id, lecturer_id, date, status, remarks)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT (student_id, subject_id, date)
    DO UPDATE SET status = excluded.status, lecturer_id = excluded.lecturer_id, remarks = excluded.remarks";
const SELECT_FOR_DAY: &str = "SELECT st.roll_number, st.name, ar.status, ar.remarks
    FROM attendance_records ar JOIN students st ON st.id = ar.student_id
    WHERE ar.subject_id = ?1 AND ar.date = ?2";
const STATS_BY_STUDENT: &str = "SELECT st.id, st.roll_number, st.name, c.code, c.name,
        COUNT(ar.id), COALESCE(SUM(ar.status = 'present'), 0)
    FROM attendance_records ar
    JOIN students st ON st.id = ar.student_id
    JOIN courses c ON c.id = st.course_id
    WHERE ar.subject_id = ?1 AND st.is_active = 1
    GROUP BY st.id";
const STATS_BY_SUBJECT: &str = "SELECT sb.id, sb.code, sb.name, COUNT(ar.id), COALESCE(SUM(ar.status = 'present'), 0)
    FROM attendance_records ar JOIN subjects sb ON sb.id = ar.subject_id
    WHERE ar.student_id = ?1
    GROUP BY sb.id
    ORDER BY sb.code";
const SUBJECT_TOTALS: &str = "SELECT COUNT(*), COALESCE(SUM(status = 'present'), 0) FROM attendance_records WHERE subject_id = ?1";
const MONTH_TOTALS: &str = "SELECT COUNT(DISTINCT date), COUNT(DISTINCT student_id), COUNT(*), COALESCE(SUM(status = 'present'), 0)
    FROM attendance_records
    WHERE subject_id = ?1 AND lecturer_id = ?2 AND date >= ?3 AND date < ?4";
const UPSERT_SUMMARY: &str = "INSERT INTO monthly_attendance_summaries
        (subject_id, lecturer_id, month, year, total_classes, total_students, average_attendance)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT (subject_id, lecturer_id, month, year) DO UPDATE SET
        total_classes = excluded.total_classes,
        total_students = excluded.total_students,
        average_attendance = excluded.average_attendance,
        updated_at = CURRENT_TIMESTAMP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "present" | "p" => Ok(AttendanceStatus::Present),
            "absent" | "a" => Ok(AttendanceStatus::Absent),
            _ => Err(ValidationError::format("status")),
        }
    }
}

impl ToSql for AttendanceStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AttendanceStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// One line of a day's register.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceEntry {
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayRecord {
    pub roll_number: String,
    pub name: String,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
}

/// A student's attendance in one subject.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentAttendance {
    pub student_id: i64,
    pub roll_number: String,
    pub name: String,
    pub course_code: String,
    pub course_name: String,
    pub total_classes: i64,
    pub attended: i64,
    pub percentage: f64,
}

impl Ranked for StudentAttendance {
    fn sort_key(&self, rules: &OrderingRules) -> SortKey {
        rules.student_key(&course_label(&self.course_name, &self.course_code), &self.roll_number)
    }
}

/// One subject in a student's attendance record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubjectAttendance {
    pub subject_id: i64,
    pub subject_code: String,
    pub subject_name: String,
    pub total_classes: i64,
    pub attended: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlySummary {
    pub subject_id: i64,
    pub lecturer_id: i64,
    pub month: u32,
    pub year: i32,
    pub total_classes: i64,
    pub total_students: i64,
    pub average_attendance: f64,
}

pub struct Attendance<'a> {
    conn: &'a Connection,
}

impl<'a> Attendance<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Writes a day's register. Callers wrap this in a transaction.
    pub fn mark(&self, subject: i64, lecturer: i64, date: NaiveDate, entries: &[AttendanceEntry]) -> RegistrarResult<usize> {
        let mut stmt = self.conn.prepare(UPSERT_ATTENDANCE)?;
        for entry in entries {
            stmt.execute(params![entry.student_id, subject, lecturer, date, entry.status, entry.remarks])?;
        }
        Ok(entries.len())
    }

    pub fn for_day(&self, subject: i64, date: NaiveDate) -> RegistrarResult<Vec<DayRecord>> {
        let mut stmt = self.conn.prepare(SELECT_FOR_DAY)?;
        let records = stmt
            .query_map(params![subject, date], |row| {
                Ok(DayRecord {
                    roll_number: row.get(0)?,
                    name: row.get(1)?,
                    status: row.get(2)?,
                    remarks: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn by_student(&self, subject: i64) -> RegistrarResult<Vec<StudentAttendance>> {
        let mut stmt = self.conn.prepare(STATS_BY_STUDENT)?;
        let stats = stmt
            .query_map(params![subject], |row| {
                let total: i64 = row.get(5)?;
                let attended: i64 = row.get(6)?;
                Ok(StudentAttendance {
                    student_id: row.get(0)?,
                    roll_number: row.get(1)?,
                    name: row.get(2)?,
                    course_code: row.get(3)?,
                    course_name: row.get(4)?,
                    total_classes: total,
                    attended,
                    percentage: percentage(attended as f64, total as f64),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    pub fn by_subject(&self, student: i64) -> RegistrarResult<Vec<SubjectAttendance>> {
        let mut stmt = self.conn.prepare(STATS_BY_SUBJECT)?;
        let stats = stmt
            .query_map(params![student], |row| {
                let total: i64 = row.get(3)?;
                let attended: i64 = row.get(4)?;
                Ok(SubjectAttendance {
                    subject_id: row.get(0)?,
                    subject_code: row.get(1)?,
                    subject_name: row.get(2)?,
                    total_classes: total,
                    attended,
                    percentage: percentage(attended as f64, total as f64),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    /// `(records, present)` over every day recorded for `subject`.
    pub fn subject_totals(&self, subject: i64) -> RegistrarResult<(i64, i64)> {
        Ok(self.conn.query_row(SUBJECT_TOTALS, params![subject], |row| Ok((row.get(0)?, row.get(1)?)))?)
    }

    /// Recomputes and stores the summary for the month containing `day`.
    pub fn monthly_summary(&self, subject: i64, lecturer: i64, day: NaiveDate) -> RegistrarResult<MonthlySummary> {
        let (start, end) = month_bounds(day);
        let (classes, students, records, present): (i64, i64, i64, i64) = self
            .conn
            .query_row(MONTH_TOTALS, params![subject, lecturer, start, end], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;

        let summary = MonthlySummary {
            subject_id: subject,
            lecturer_id: lecturer,
            month: day.month(),
            year: day.year(),
            total_classes: classes,
            total_students: students,
            average_attendance: round2(percentage(present as f64, records as f64)),
        };
        self.conn.execute(
            UPSERT_SUMMARY,
            params![
                summary.subject_id,
                summary.lecturer_id,
                summary.month,
                summary.year,
                summary.total_classes,
                summary.total_students,
                summary.average_attendance
            ],
        )?;
        Ok(summary)
    }
}

/// First day of `day`'s month and first day of the following month.
pub fn month_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day.with_day(1).unwrap_or(day);
    let end = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    };
    (start, end.unwrap_or(NaiveDate::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        assert_eq!("Present".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Present);
        assert_eq!("a".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Absent);
        assert!("late".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (start, end) = month_bounds(NaiveDate::from_ymd_opt(2024, 12, 17).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
