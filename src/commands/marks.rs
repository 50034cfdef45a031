use super::{parse_date, resolve_subject, Session};
use crate::{
    db::{
        assignments::Assignments,
        enrollments::Enrollments,
        lecturers::Lecturers,
        marks::{AssessmentType, Marks, MarksEntry},
        students::Students,
        subjects::Subjects,
    },
    libs::{error::ValidationError, messages::Message, ordering::order, response::Responder, view::View},
    msg_bail_anyhow,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct MarksArgs {
    #[command(subcommand)]
    command: MarksCommand,
}

#[derive(Debug, Subcommand)]
enum MarksCommand {
    /// Record marks for one assessment, replacing earlier marks for it
    Add {
        /// Subject code
        subject: String,
        /// Marks as ROLL:MARKS, e.g. BCA001:42.5
        #[arg(required = true)]
        entries: Vec<String>,
        #[arg(short, long)]
        course: Option<String>,
        #[arg(short, long)]
        lecturer: String,
        /// internal1, internal2, assignment or project
        #[arg(short, long)]
        assessment: AssessmentType,
        #[arg(short, long, default_value_t = 100.0)]
        max: f64,
        /// Assessment date, `today` or YYYY-MM-DD
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        remarks: Option<String>,
    },
    /// List recorded marks in a subject
    List {
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
        #[arg(short, long)]
        assessment: Option<AssessmentType>,
    },
}

#[derive(Debug, Serialize)]
struct GradedEntry {
    roll_number: String,
    marks_obtained: f64,
    percentage: f64,
    grade: String,
}

/// Splits `ROLL:MARKS`.
fn parse_entry(value: &str) -> Result<(String, f64), ValidationError> {
    let (roll, marks) = value.split_once(':').ok_or_else(|| ValidationError::format("marks"))?;
    let roll = roll.trim();
    if roll.is_empty() {
        return Err(ValidationError::missing("roll_number"));
    }
    let marks = marks.trim().parse::<f64>().map_err(|_| ValidationError::format("marks"))?;
    Ok((roll.to_uppercase(), marks))
}

pub fn cmd(args: MarksArgs, out: &Responder) -> Result<()> {
    let mut session = Session::open()?;

    match args.command {
        MarksCommand::Add {
            subject,
            entries,
            course,
            lecturer,
            assessment,
            max,
            date,
            remarks,
        } => {
            let parsed = entries.iter().map(|e| parse_entry(e)).collect::<Result<Vec<_>, _>>()?;
            let assessment_date = date.as_deref().map(parse_date).transpose()?;

            let tx = session.db.conn.transaction()?;
            let lecturer = Lecturers::new(&tx).require(&lecturer)?;
            if !lecturer.is_active {
                msg_bail_anyhow!(Message::LecturerInactive(lecturer.lecturer_id));
            }
            let subject = Subjects::new(&tx).resolve(&subject, course.as_deref())?;
            if !Assignments::new(&tx).is_assigned(lecturer.id, subject.id)? {
                msg_bail_anyhow!(Message::NotAssigned(lecturer.lecturer_id, subject.code));
            }

            let students = Students::new(&tx);
            let enrollments = Enrollments::new(&tx);
            let marks = Marks::new(&tx);
            let mut graded = Vec::with_capacity(parsed.len());
            for (roll, obtained) in parsed {
                let student = students.require(&roll)?;
                if !enrollments.is_enrolled(student.id, subject.id)? {
                    msg_bail_anyhow!(Message::NotEnrolled(student.roll_number, subject.code));
                }
                let (percentage, grade) = marks.record(&MarksEntry {
                    student_id: student.id,
                    subject_id: subject.id,
                    lecturer_id: lecturer.id,
                    assessment_type: assessment,
                    marks_obtained: obtained,
                    max_marks: max,
                    remarks: remarks.clone(),
                    assessment_date,
                })?;
                graded.push(GradedEntry {
                    roll_number: student.roll_number,
                    marks_obtained: obtained,
                    percentage,
                    grade: grade.to_string(),
                });
            }
            tx.commit()?;
            tracing::info!(subject = %subject.code, assessment = %assessment, entries = graded.len(), "marks recorded");

            out.data(Message::MarksRecorded(subject.code, assessment.to_string(), graded.len()), &graded, |rows| {
                for row in rows {
                    println!("  {}: {} ({:.2}%, {})", row.roll_number, row.marks_obtained, row.percentage, row.grade);
                }
            })
        }
        MarksCommand::List {
            subject,
            course,
            assessment,
        } => {
            let subject = resolve_subject(&session, &subject, course.as_deref())?;
            let records = order(Marks::new(&session.db.conn).for_subject(subject.id, assessment)?, &session.config.ordering);
            out.list(Message::MarksListed(records.len()), Message::NoMarksFound(subject.code), &records, View::table)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_split_roll_and_marks() {
        assert_eq!(parse_entry("bca001: 42.5").unwrap(), ("BCA001".to_string(), 42.5));
        assert_eq!(parse_entry("BCA001").unwrap_err(), ValidationError::format("marks"));
        assert_eq!(parse_entry("BCA001:abc").unwrap_err(), ValidationError::format("marks"));
        assert_eq!(parse_entry(":10").unwrap_err(), ValidationError::missing("roll_number"));
    }
}
