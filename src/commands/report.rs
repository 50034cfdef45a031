use super::{resolve_subject, Session};
use crate::{
    db::marks::AssessmentType,
    libs::{messages::Message, report, response::Responder, view::View},
    msg_warning,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Debug, Subcommand)]
enum ReportCommand {
    /// Marks, grades and attendance of one student across enrolled subjects
    Student { roll_number: String },
    /// Students whose attendance in a subject is below the threshold
    Shortage {
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
        /// Percentage, defaults to the configured attendance threshold
        #[arg(short, long)]
        threshold: Option<f64>,
    },
    /// Marks in a subject below the threshold
    Deficiency {
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
        #[arg(short, long)]
        assessment: Option<AssessmentType>,
        /// Percentage, defaults to the configured marks threshold
        #[arg(short, long)]
        threshold: Option<f64>,
    },
    /// Class marks with average, highest and lowest
    ClassMarks {
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
        #[arg(short, long)]
        assessment: Option<AssessmentType>,
    },
    /// Per-subject overview of a course
    Course { code: String },
}

pub fn cmd(args: ReportArgs, out: &Responder) -> Result<()> {
    let session = Session::open()?;
    let conn = &session.db.conn;
    let config = &session.config;

    match args.command {
        ReportCommand::Student { roll_number } => {
            let report = report::student_report(conn, &roll_number, config.attendance_threshold)?;
            out.data(Message::StudentReportReady(report.student.roll_number.clone()), &report, |r| {
                View::student_report(r);
                if !r.shortage_in.is_empty() {
                    msg_warning!(Message::AttendanceShortIn(r.shortage_in.join(", ")));
                }
            })
        }
        ReportCommand::Shortage {
            subject,
            course,
            threshold,
        } => {
            let subject = resolve_subject(&session, &subject, course.as_deref())?;
            let threshold = threshold.unwrap_or(config.attendance_threshold);
            let short = report::attendance_shortage(conn, &subject, threshold, &config.ordering)?;
            out.list(
                Message::ShortageFound(short.len(), threshold),
                Message::NoShortage(subject.code, threshold),
                &short,
                View::table,
            )
        }
        ReportCommand::Deficiency {
            subject,
            course,
            assessment,
            threshold,
        } => {
            let subject = resolve_subject(&session, &subject, course.as_deref())?;
            let threshold = threshold.unwrap_or(config.marks_threshold);
            let deficient = report::marks_deficiency(conn, &subject, assessment, threshold, &config.ordering)?;
            out.list(
                Message::DeficiencyFound(deficient.len(), threshold),
                Message::NoDeficiency(subject.code, threshold),
                &deficient,
                View::table,
            )
        }
        ReportCommand::ClassMarks {
            subject,
            course,
            assessment,
        } => {
            let subject = resolve_subject(&session, &subject, course.as_deref())?;
            let report = report::class_marks(conn, subject, assessment, &config.ordering)?;
            out.data(Message::ClassMarksReady(report.subject.code.clone()), &report, |r| {
                if !r.records.is_empty() {
                    View::table(&r.records);
                }
                View::statistics(&r.statistics);
            })
        }
        ReportCommand::Course { code } => {
            let overview = report::course_overview(conn, &code)?;
            out.data(Message::CourseOverviewReady(overview.course.code.clone()), &overview, |o| {
                View::course_overview(o)
            })
        }
    }
}
