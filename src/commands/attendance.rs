use super::{parse_date, resolve_subject, Session};
use crate::{
    db::{
        assignments::Assignments,
        attendance::{Attendance, AttendanceEntry, AttendanceStatus},
        enrollments::Enrollments,
        lecturers::Lecturers,
        subjects::Subjects,
    },
    libs::{messages::Message, ordering::order, response::Responder, view::View},
    msg_bail_anyhow,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::collections::HashSet;

#[derive(Debug, Args)]
pub struct AttendanceArgs {
    #[command(subcommand)]
    command: AttendanceCommand,
}

#[derive(Debug, Subcommand)]
enum AttendanceCommand {
    /// Record a day's register; enrolled students not listed as absent are present
    Mark {
        /// Subject code
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
        /// Lecturer taking the class
        #[arg(short, long)]
        lecturer: String,
        /// Date of the class, `today` or YYYY-MM-DD
        #[arg(short, long, default_value = "today")]
        date: String,
        /// Roll numbers of absent students, comma separated
        #[arg(short, long, value_delimiter = ',')]
        absent: Vec<String>,
        #[arg(short, long)]
        remarks: Option<String>,
    },
    /// Attendance percentage of every student in a subject
    Summary {
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
    },
    /// The register recorded for one day
    Show {
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
        #[arg(short, long, default_value = "today")]
        date: String,
    },
}

pub fn cmd(args: AttendanceArgs, out: &Responder) -> Result<()> {
    let mut session = Session::open()?;

    match args.command {
        AttendanceCommand::Mark {
            subject,
            course,
            lecturer,
            date,
            absent,
            remarks,
        } => {
            let date = parse_date(&date)?;
            let tx = session.db.conn.transaction()?;

            let lecturer = Lecturers::new(&tx).require(&lecturer)?;
            if !lecturer.is_active {
                msg_bail_anyhow!(Message::LecturerInactive(lecturer.lecturer_id));
            }
            let subject = Subjects::new(&tx).resolve(&subject, course.as_deref())?;
            if !Assignments::new(&tx).is_assigned(lecturer.id, subject.id)? {
                msg_bail_anyhow!(Message::NotAssigned(lecturer.lecturer_id, subject.code));
            }

            let students = Enrollments::new(&tx).students_in(subject.id)?;
            if students.is_empty() {
                msg_bail_anyhow!(Message::NoStudentsEnrolled(subject.code));
            }
            let enrolled: HashSet<String> = students.iter().map(|s| s.roll_number.to_uppercase()).collect();
            let mut absentees = HashSet::new();
            for roll in absent.iter().map(|r| r.trim().to_uppercase()).filter(|r| !r.is_empty()) {
                if !enrolled.contains(&roll) {
                    msg_bail_anyhow!(Message::NotEnrolled(roll, subject.code));
                }
                absentees.insert(roll);
            }

            let entries: Vec<AttendanceEntry> = students
                .iter()
                .map(|s| AttendanceEntry {
                    student_id: s.id,
                    status: if absentees.contains(&s.roll_number.to_uppercase()) {
                        AttendanceStatus::Absent
                    } else {
                        AttendanceStatus::Present
                    },
                    remarks: remarks.clone(),
                })
                .collect();

            let register = Attendance::new(&tx);
            let marked = register.mark(subject.id, lecturer.id, date, &entries)?;
            let summary = register.monthly_summary(subject.id, lecturer.id, date)?;
            tx.commit()?;
            tracing::info!(subject = %subject.code, %date, marked, absent = absentees.len(), "attendance marked");

            out.data(
                Message::AttendanceMarked(subject.code, date.to_string(), marked - absentees.len(), absentees.len()),
                &summary,
                |s| View::monthly_summary(s),
            )
        }
        AttendanceCommand::Summary { subject, course } => {
            let subject = resolve_subject(&session, &subject, course.as_deref())?;
            let stats = order(Attendance::new(&session.db.conn).by_student(subject.id)?, &session.config.ordering);
            out.list(
                Message::AttendanceListed(stats.len()),
                Message::NoAttendanceRecords(subject.code),
                &stats,
                View::table,
            )
        }
        AttendanceCommand::Show { subject, course, date } => {
            let date = parse_date(&date)?;
            let subject = resolve_subject(&session, &subject, course.as_deref())?;
            let records = Attendance::new(&session.db.conn).for_day(subject.id, date)?;
            out.list(
                Message::AttendanceListed(records.len()),
                Message::NoAttendanceRecords(subject.code),
                &records,
                View::table,
            )
        }
    }
}
