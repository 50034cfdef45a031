use crate::db::assignments::Assignment;
use crate::db::attendance::{DayRecord, MonthlySummary, StudentAttendance, SubjectAttendance};
use crate::db::courses::Course;
use crate::db::lecturers::Lecturer;
use crate::db::marks::MarksRecord;
use crate::db::students::Student;
use crate::db::subjects::Subject;
use crate::libs::import::{IssuedCredential, Rejection};
use crate::libs::report::{ClassStatistics, CourseOverview, StudentReport};
use prettytable::{row, Cell, Row, Table};

/// A record that renders as one table row, on screen and in exports.
pub trait Tabular {
    fn headers() -> Vec<&'static str>;
    fn cells(&self) -> Vec<String>;
}

fn active(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

fn or_dash(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

impl Tabular for Lecturer {
    fn headers() -> Vec<&'static str> {
        vec!["LECTURER ID", "NAME", "USERNAME", "EMAIL", "ACTIVE", "LAST LOGIN"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.lecturer_id.clone(),
            self.name.clone(),
            self.username.clone(),
            or_dash(&self.email),
            active(self.is_active),
            or_dash(&self.last_login),
        ]
    }
}

impl Tabular for Student {
    fn headers() -> Vec<&'static str> {
        vec!["ROLL NUMBER", "NAME", "COURSE", "YEAR", "SEMESTER", "EMAIL", "ACTIVE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.roll_number.clone(),
            self.name.clone(),
            self.course_code.clone(),
            self.academic_year.to_string(),
            self.current_semester.to_string(),
            or_dash(&self.email),
            active(self.is_active),
        ]
    }
}

impl Tabular for Course {
    fn headers() -> Vec<&'static str> {
        vec!["CODE", "NAME", "YEARS", "SEMESTERS", "ACTIVE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            self.name.clone(),
            self.duration_years.to_string(),
            self.total_semesters.to_string(),
            active(self.is_active),
        ]
    }
}

impl Tabular for Subject {
    fn headers() -> Vec<&'static str> {
        vec!["CODE", "NAME", "COURSE", "YEAR", "SEMESTER", "CREDITS", "ACTIVE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.code.clone(),
            self.name.clone(),
            self.course_code.clone(),
            self.year.to_string(),
            self.semester.to_string(),
            self.credits.to_string(),
            active(self.is_active),
        ]
    }
}

impl Tabular for Assignment {
    fn headers() -> Vec<&'static str> {
        vec!["SUBJECT", "NAME", "COURSE", "ACADEMIC YEAR", "ACTIVE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.subject_code.clone(),
            self.subject_name.clone(),
            self.course_code.clone(),
            self.academic_year.to_string(),
            active(self.is_active),
        ]
    }
}

impl Tabular for DayRecord {
    fn headers() -> Vec<&'static str> {
        vec!["ROLL NUMBER", "NAME", "STATUS", "REMARKS"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.roll_number.clone(), self.name.clone(), self.status.to_string(), or_dash(&self.remarks)]
    }
}

impl Tabular for StudentAttendance {
    fn headers() -> Vec<&'static str> {
        vec!["ROLL NUMBER", "NAME", "COURSE", "CLASSES", "ATTENDED", "PERCENTAGE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.roll_number.clone(),
            self.name.clone(),
            self.course_code.clone(),
            self.total_classes.to_string(),
            self.attended.to_string(),
            format!("{:.2}%", self.percentage),
        ]
    }
}

impl Tabular for SubjectAttendance {
    fn headers() -> Vec<&'static str> {
        vec!["SUBJECT", "NAME", "CLASSES", "ATTENDED", "PERCENTAGE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.subject_code.clone(),
            self.subject_name.clone(),
            self.total_classes.to_string(),
            self.attended.to_string(),
            format!("{:.2}%", self.percentage),
        ]
    }
}

impl Tabular for MarksRecord {
    fn headers() -> Vec<&'static str> {
        vec!["ROLL NUMBER", "NAME", "SUBJECT", "ASSESSMENT", "MARKS", "PERCENTAGE", "GRADE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.roll_number.clone(),
            self.student_name.clone(),
            self.subject_code.clone(),
            self.assessment_type.to_string(),
            format!("{}/{}", self.marks_obtained, self.max_marks),
            format!("{:.2}%", self.percentage),
            self.grade.clone(),
        ]
    }
}

impl Tabular for IssuedCredential {
    fn headers() -> Vec<&'static str> {
        vec!["LECTURER ID", "NAME", "USERNAME", "PASSWORD"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.lecturer_id.clone(), self.name.clone(), self.username.clone(), self.password.clone()]
    }
}

impl Tabular for Rejection {
    fn headers() -> Vec<&'static str> {
        vec!["ROW", "IDENTIFIER", "REASON"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.row.to_string(), or_dash(&self.identifier), self.reason.to_string()]
    }
}

pub struct View {}

impl View {
    pub fn table<T: Tabular>(items: &[T]) {
        let mut table = Table::new();
        table.add_row(Row::new(T::headers().into_iter().map(Cell::new).collect()));
        for item in items {
            table.add_row(Row::new(item.cells().iter().map(|c| Cell::new(c)).collect()));
        }
        table.printstd();
    }

    pub fn statistics(stats: &ClassStatistics) {
        let mut table = Table::new();
        table.add_row(row!["STUDENTS", "ASSESSMENTS", "AVERAGE", "HIGHEST", "LOWEST", "PASSED", "FAILED"]);
        table.add_row(row![
            stats.total_students,
            stats.total_assessments,
            format!("{:.2}%", stats.class_average),
            format!("{:.2}%", stats.highest),
            format!("{:.2}%", stats.lowest),
            stats.passing,
            stats.failing
        ]);
        table.printstd();
    }

    pub fn student_report(report: &StudentReport) {
        let student = &report.student;
        let mut header = Table::new();
        header.add_row(row!["ROLL NUMBER", "NAME", "COURSE", "YEAR", "SEMESTER"]);
        header.add_row(row![
            student.roll_number,
            student.name,
            student.course_label(),
            student.academic_year,
            student.current_semester
        ]);
        header.printstd();

        let mut table = Table::new();
        table.add_row(row!["SUBJECT", "NAME", "MARKS", "GRADE", "CLASSES", "PRESENT", "ATTENDANCE"]);
        for subject in &report.subjects {
            table.add_row(row![
                subject.subject_code,
                subject.subject_name,
                format!("{:.2}%", subject.marks_percentage),
                subject.grade,
                subject.attendance.total_classes,
                subject.attendance.present,
                format!("{:.2}%", subject.attendance.percentage)
            ]);
        }
        table.add_row(row![
            "",
            "OVERALL",
            format!("{:.2}%", report.overall_marks),
            report.performance,
            "",
            "",
            format!("{:.2}%", report.overall_attendance)
        ]);
        table.printstd();
    }

    pub fn monthly_summary(summary: &MonthlySummary) {
        let mut table = Table::new();
        table.add_row(row!["MONTH", "CLASSES", "STUDENTS", "AVERAGE"]);
        table.add_row(row![
            format!("{}-{:02}", summary.year, summary.month),
            summary.total_classes,
            summary.total_students,
            format!("{:.2}%", summary.average_attendance)
        ]);
        table.printstd();
    }

    pub fn course_overview(overview: &CourseOverview) {
        let mut table = Table::new();
        table.add_row(row!["SUBJECT", "NAME", "YEAR", "SEM", "ENROLLED", "ASSESSMENTS", "AVG MARKS", "PASS RATE", "AVG ATTENDANCE"]);
        for s in &overview.subjects {
            table.add_row(row![
                s.subject_code,
                s.subject_name,
                s.year,
                s.semester,
                s.enrolled_students,
                s.total_assessments,
                format!("{:.2}%", s.average_marks),
                format!("{:.2}%", s.passing_rate),
                format!("{:.2}%", s.average_attendance)
            ]);
        }
        table.printstd();
    }
}
