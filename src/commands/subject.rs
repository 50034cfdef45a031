use super::{resolve_subject, Session};
use crate::{
    db::{
        courses::Courses,
        subjects::{NewSubject, Subjects},
    },
    libs::{error::ValidationError, messages::Message, response::Responder, validate, view::View},
    msg_error_anyhow,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct SubjectArgs {
    #[command(subcommand)]
    command: SubjectCommand,
}

#[derive(Debug, Subcommand)]
enum SubjectCommand {
    /// Create a subject within a course
    Add {
        /// Subject code, unique within the course
        code: String,
        name: String,
        /// Course code
        #[arg(short, long)]
        course: String,
        /// Year of the course the subject is taught in
        #[arg(short, long)]
        year: u32,
        /// Semester, 1 to 8
        #[arg(short, long)]
        semester: u32,
        #[arg(long, default_value_t = 3)]
        credits: u32,
    },
    /// List subjects, optionally for one course
    List {
        #[arg(short, long)]
        course: Option<String>,
    },
    /// Delete a subject
    Delete {
        code: String,
        /// Course code, needed when the code exists in several courses
        #[arg(short, long)]
        course: Option<String>,
        /// Also remove its assignments, enrollments, attendance and marks
        #[arg(long)]
        cascade: bool,
    },
}

pub fn cmd(args: SubjectArgs, out: &Responder) -> Result<()> {
    let session = Session::open()?;
    let subjects = Subjects::new(&session.db.conn);

    match args.command {
        SubjectCommand::Add {
            code,
            name,
            course,
            year,
            semester,
            credits,
        } => {
            let code = validate::required("code", Some(code.as_str()))?.to_uppercase();
            validate::identifier("code", &code)?;
            let name = validate::required("name", Some(name.as_str()))?;
            validate::semester(semester)?;

            let course = Courses::new(&session.db.conn).require(&course)?;
            if year == 0 || year > course.duration_years {
                return Err(ValidationError::out_of_range("year", format!("must be between 1 and {}", course.duration_years)).into());
            }

            let id = subjects.insert(&NewSubject {
                code: code.clone(),
                name: name.to_string(),
                course_id: course.id,
                year,
                semester,
                credits,
            })?;
            let created = subjects.get_by_id(id)?.ok_or_else(|| msg_error_anyhow!(Message::SubjectNotFound(code.clone())))?;
            out.data(Message::SubjectCreated(code), &created, |s| View::table(std::slice::from_ref(s)))
        }
        SubjectCommand::List { course } => {
            let list = subjects.list(course.as_deref())?;
            out.list(Message::SubjectsListed(list.len()), Message::NoSubjectsFound, &list, View::table)
        }
        SubjectCommand::Delete { code, course, cascade } => {
            let subject = resolve_subject(&session, &code, course.as_deref())?;
            let records = subjects.delete(&subject, cascade)?;
            out.data(
                Message::SubjectDeleted(subject.code.clone(), records),
                &serde_json::json!({ "code": subject.code, "course": subject.course_code, "records": records }),
                |_| {},
            )
        }
    }
}
