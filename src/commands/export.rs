//! File export of listings and reports.
//!
//! Lists are written in display order, the same order `list` and `report`
//! show on screen.

use super::{resolve_subject, Session};
use crate::{
    db::{
        lecturers::Lecturers,
        marks::AssessmentType,
        students::{StudentFilter, Students},
    },
    libs::{
        export::{ExportFormat, Exporter},
        messages::Message,
        ordering::order,
        report,
        response::Responder,
    },
    msg_bail_anyhow, msg_info,
};
use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportData {
    /// Every lecturer
    Lecturers,
    /// Students, optionally of one course and year
    Students,
    /// Attendance shortage in a subject
    Shortage,
    /// Marks deficiency in a subject
    Deficiency,
    /// Marks of a class in a subject
    ClassMarks,
}

impl ExportData {
    fn name(&self) -> &'static str {
        match self {
            ExportData::Lecturers => "lecturers",
            ExportData::Students => "students",
            ExportData::Shortage => "attendance_shortage",
            ExportData::Deficiency => "marks_deficiency",
            ExportData::ClassMarks => "class_marks",
        }
    }
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(value_enum)]
    data: ExportData,

    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,

    /// Output file; defaults to `registrar_<data>_<timestamp>.<ext>`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Subject code, required for subject reports
    #[arg(short, long)]
    subject: Option<String>,

    /// Course code; filters students or disambiguates the subject
    #[arg(short, long)]
    course: Option<String>,

    /// Year of study, for student listings
    #[arg(short, long)]
    year: Option<u32>,

    #[arg(short, long)]
    assessment: Option<AssessmentType>,

    /// Report threshold percentage, defaults to the configured one
    #[arg(short, long)]
    threshold: Option<f64>,
}

pub fn cmd(args: ExportArgs, out: &Responder) -> Result<()> {
    let session = Session::open()?;
    let conn = &session.db.conn;
    let rules = &session.config.ordering;
    let exporter = Exporter::new(args.format, args.data.name(), args.output.clone());

    if !out.is_json() {
        msg_info!(Message::ExportingData(args.data.name().to_string(), args.format.extension().to_string()));
    }

    let rows = match args.data {
        ExportData::Lecturers => {
            let lecturers = order(Lecturers::new(conn).list()?, rules);
            exporter.export("Lecturers", &lecturers)?;
            lecturers.len()
        }
        ExportData::Students => {
            let filter = StudentFilter {
                course_code: args.course.clone(),
                academic_year: args.year,
                active_only: false,
            };
            let students = order(Students::new(conn).list(&filter)?, rules);
            exporter.export("Students", &students)?;
            students.len()
        }
        ExportData::Shortage | ExportData::Deficiency | ExportData::ClassMarks => {
            let Some(code) = args.subject.as_deref() else {
                msg_bail_anyhow!(Message::SubjectRequired(args.data.name().to_string()));
            };
            let subject = resolve_subject(&session, code, args.course.as_deref())?;
            match args.data {
                ExportData::Shortage => {
                    let threshold = args.threshold.unwrap_or(session.config.attendance_threshold);
                    let short = report::attendance_shortage(conn, &subject, threshold, rules)?;
                    exporter.export("Attendance Shortage", &short)?;
                    short.len()
                }
                ExportData::Deficiency => {
                    let threshold = args.threshold.unwrap_or(session.config.marks_threshold);
                    let deficient = report::marks_deficiency(conn, &subject, args.assessment, threshold, rules)?;
                    exporter.export("Marks Deficiency", &deficient)?;
                    deficient.len()
                }
                _ => {
                    let class = report::class_marks(conn, subject, args.assessment, rules)?;
                    exporter.export("Class Marks", &class.records)?;
                    class.records.len()
                }
            }
        }
    };

    let path = exporter.output_path().display().to_string();
    out.data(
        Message::ExportCompleted(path.clone(), rows),
        &serde_json::json!({ "path": path, "rows": rows, "format": args.format.extension() }),
        |_| {},
    )
}
