//! Academic reports built from attendance and marks.
//!
//! Every list of students in a report goes through the ordering rules, so a
//! report reads in the same order as the student listing it came from.

use super::grading::{is_passing, percentage, round2, Grade, Performance};
use super::ordering::{order, OrderingRules};
use crate::db::attendance::{Attendance, StudentAttendance};
use crate::db::courses::{Course, Courses};
use crate::db::enrollments::Enrollments;
use crate::db::marks::{AssessmentType, Marks, MarksRecord};
use crate::db::students::{Student, StudentFilter, Students};
use crate::db::subjects::{Subject, Subjects};
use crate::libs::error::RegistrarResult;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct AttendanceTally {
    pub total_classes: i64,
    pub present: i64,
    pub absent: i64,
    pub percentage: f64,
}

impl AttendanceTally {
    pub fn new(total_classes: i64, present: i64) -> Self {
        Self {
            total_classes,
            present,
            absent: total_classes - present,
            percentage: percentage(present as f64, total_classes as f64),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubjectReport {
    pub subject_code: String,
    pub subject_name: String,
    pub year: u32,
    pub semester: u32,
    pub marks: Vec<MarksRecord>,
    /// Sum of obtained over sum of maximum marks.
    pub marks_percentage: f64,
    pub grade: Grade,
    pub attendance: AttendanceTally,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentReport {
    pub student: Student,
    pub subjects: Vec<SubjectReport>,
    pub overall_marks: f64,
    pub overall_attendance: f64,
    pub performance: Performance,
    /// Codes of subjects where attendance is below the threshold.
    pub shortage_in: Vec<String>,
}

/// Detailed report over every subject the student is enrolled in.
pub fn student_report(conn: &Connection, roll_number: &str, attendance_threshold: f64) -> RegistrarResult<StudentReport> {
    let student = Students::new(conn).require(roll_number)?;
    let subjects = Enrollments::new(conn).subjects_of(student.id)?;
    let attendance: HashMap<i64, (i64, i64)> = Attendance::new(conn)
        .by_subject(student.id)?
        .into_iter()
        .map(|a| (a.subject_id, (a.total_classes, a.attended)))
        .collect();
    let mut marks_by_subject: HashMap<String, Vec<MarksRecord>> = HashMap::new();
    for record in Marks::new(conn).for_student(student.id)? {
        marks_by_subject.entry(record.subject_code.clone()).or_default().push(record);
    }

    let (mut obtained_all, mut max_all, mut classes_all, mut present_all) = (0.0, 0.0, 0, 0);
    let mut reports = Vec::with_capacity(subjects.len());
    let mut shortage_in = Vec::new();

    for subject in subjects {
        let marks = marks_by_subject.remove(&subject.code).unwrap_or_default();
        let obtained: f64 = marks.iter().map(|m| m.marks_obtained).sum();
        let max: f64 = marks.iter().map(|m| m.max_marks).sum();
        let (total, present) = attendance.get(&subject.id).copied().unwrap_or((0, 0));
        let tally = AttendanceTally::new(total, present);

        if total > 0 && tally.percentage < attendance_threshold {
            shortage_in.push(subject.code.clone());
        }
        obtained_all += obtained;
        max_all += max;
        classes_all += total;
        present_all += present;

        let marks_percentage = percentage(obtained, max);
        reports.push(SubjectReport {
            subject_code: subject.code,
            subject_name: subject.name,
            year: subject.year,
            semester: subject.semester,
            marks,
            marks_percentage,
            grade: Grade::from_percentage(marks_percentage),
            attendance: tally,
        });
    }

    let overall_marks = percentage(obtained_all, max_all);
    Ok(StudentReport {
        student,
        subjects: reports,
        overall_marks,
        overall_attendance: percentage(present_all as f64, classes_all as f64),
        performance: Performance::from_percentage(overall_marks),
        shortage_in,
    })
}

/// Students of `subject` whose attendance is below `threshold`.
pub fn attendance_shortage(
    conn: &Connection,
    subject: &Subject,
    threshold: f64,
    rules: &OrderingRules,
) -> RegistrarResult<Vec<StudentAttendance>> {
    let short = Attendance::new(conn)
        .by_student(subject.id)?
        .into_iter()
        .filter(|a| a.total_classes > 0 && a.percentage < threshold);
    Ok(order(short, rules))
}

/// Marks in `subject` below `threshold`, optionally for one assessment.
pub fn marks_deficiency(
    conn: &Connection,
    subject: &Subject,
    assessment: Option<AssessmentType>,
    threshold: f64,
    rules: &OrderingRules,
) -> RegistrarResult<Vec<MarksRecord>> {
    let deficient = Marks::new(conn)
        .for_subject(subject.id, assessment)?
        .into_iter()
        .filter(|m| m.percentage < threshold);
    Ok(order(deficient, rules))
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct ClassStatistics {
    pub total_students: usize,
    pub total_assessments: usize,
    pub class_average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub passing: usize,
    pub failing: usize,
}

impl ClassStatistics {
    pub fn from_percentages(percentages: &[f64], total_students: usize) -> Self {
        if percentages.is_empty() {
            return Self {
                total_students,
                ..Self::default()
            };
        }
        let sum: f64 = percentages.iter().sum();
        let passing = percentages.iter().filter(|p| is_passing(**p)).count();
        Self {
            total_students,
            total_assessments: percentages.len(),
            class_average: round2(sum / percentages.len() as f64),
            highest: percentages.iter().copied().fold(f64::MIN, f64::max),
            lowest: percentages.iter().copied().fold(f64::MAX, f64::min),
            passing,
            failing: percentages.len() - passing,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassMarksReport {
    pub subject: Subject,
    pub assessment: Option<AssessmentType>,
    pub statistics: ClassStatistics,
    pub records: Vec<MarksRecord>,
}

pub fn class_marks(
    conn: &Connection,
    subject: Subject,
    assessment: Option<AssessmentType>,
    rules: &OrderingRules,
) -> RegistrarResult<ClassMarksReport> {
    let records = order(Marks::new(conn).for_subject(subject.id, assessment)?, rules);
    let percentages: Vec<f64> = records.iter().map(|m| m.percentage).collect();
    let mut students: Vec<i64> = records.iter().map(|m| m.student_id).collect();
    students.sort_unstable();
    students.dedup();

    Ok(ClassMarksReport {
        statistics: ClassStatistics::from_percentages(&percentages, students.len()),
        subject,
        assessment,
        records,
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubjectOverview {
    pub subject_code: String,
    pub subject_name: String,
    pub year: u32,
    pub semester: u32,
    pub enrolled_students: i64,
    pub total_assessments: usize,
    pub average_marks: f64,
    pub passing_rate: f64,
    pub attendance_records: i64,
    pub average_attendance: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseOverview {
    pub course: Course,
    pub total_students: usize,
    pub total_subjects: usize,
    pub subjects: Vec<SubjectOverview>,
}

/// Per-subject marks and attendance across an active course.
pub fn course_overview(conn: &Connection, course_code: &str) -> RegistrarResult<CourseOverview> {
    let course = Courses::new(conn).require(course_code)?;
    let students = Students::new(conn).list(&StudentFilter {
        course_code: Some(course.code.clone()),
        academic_year: None,
        active_only: true,
    })?;
    let subjects: Vec<Subject> = Subjects::new(conn).list(Some(&course.code))?.into_iter().filter(|s| s.is_active).collect();

    let enrollments = Enrollments::new(conn);
    let marks = Marks::new(conn);
    let attendance = Attendance::new(conn);
    let mut overviews = Vec::with_capacity(subjects.len());
    for subject in &subjects {
        let percentages: Vec<f64> = marks.for_subject(subject.id, None)?.iter().map(|m| m.percentage).collect();
        let stats = ClassStatistics::from_percentages(&percentages, 0);
        let (records, present) = attendance.subject_totals(subject.id)?;

        overviews.push(SubjectOverview {
            subject_code: subject.code.clone(),
            subject_name: subject.name.clone(),
            year: subject.year,
            semester: subject.semester,
            enrolled_students: enrollments.count_in(subject.id)?,
            total_assessments: stats.total_assessments,
            average_marks: stats.class_average,
            passing_rate: percentage(stats.passing as f64, stats.total_assessments as f64),
            attendance_records: records,
            average_attendance: percentage(present as f64, records as f64),
        });
    }

    Ok(CourseOverview {
        total_students: students.len(),
        total_subjects: subjects.len(),
        course,
        subjects: overviews,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_statistics_over_percentages() {
        let stats = ClassStatistics::from_percentages(&[90.0, 34.5, 60.0, 35.0], 3);
        assert_eq!(stats.total_assessments, 4);
        assert_eq!(stats.class_average, 54.88);
        assert_eq!(stats.highest, 90.0);
        assert_eq!(stats.lowest, 34.5);
        assert_eq!(stats.passing, 3);
        assert_eq!(stats.failing, 1);
    }

    #[test]
    fn empty_class_has_zeroed_statistics() {
        let stats = ClassStatistics::from_percentages(&[], 0);
        assert_eq!(stats, ClassStatistics::default());
    }

    #[test]
    fn tally_counts_absences() {
        let tally = AttendanceTally::new(8, 6);
        assert_eq!(tally.absent, 2);
        assert_eq!(tally.percentage, 75.0);
    }
}
