use super::Session;
use crate::{
    db::courses::{Courses, NewCourse},
    libs::{error::ValidationError, messages::Message, response::Responder, validate, view::View},
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct CourseArgs {
    #[command(subcommand)]
    command: CourseCommand,
}

#[derive(Debug, Subcommand)]
enum CourseCommand {
    /// Create a course
    Add {
        /// Course code, e.g. BCA
        code: String,
        /// Course name
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Duration in years
        #[arg(short, long, default_value_t = 3)]
        years: u32,
        /// Total number of semesters
        #[arg(short, long, default_value_t = 6)]
        semesters: u32,
    },
    /// List all courses
    List,
    /// Delete a course
    Delete {
        code: String,
        /// Also remove its students, subjects and everything recorded for them
        #[arg(long)]
        cascade: bool,
    },
}

pub fn cmd(args: CourseArgs, out: &Responder) -> Result<()> {
    let session = Session::open()?;
    let courses = Courses::new(&session.db.conn);

    match args.command {
        CourseCommand::Add {
            code,
            name,
            description,
            years,
            semesters,
        } => {
            let code = validate::required("code", Some(code.as_str()))?;
            validate::identifier("code", code)?;
            let name = validate::required("name", Some(name.as_str()))?;
            if years == 0 || semesters == 0 || semesters > validate::MAX_SEMESTER {
                return Err(ValidationError::out_of_range("duration", "years and semesters must be positive").into());
            }

            let mut course = NewCourse::new(code, name);
            course.description = description.filter(|d| !d.trim().is_empty());
            course.duration_years = years;
            course.total_semesters = semesters;
            courses.insert(&course)?;

            let created = courses.require(&course.code)?;
            out.data(Message::CourseCreated(created.code.clone()), &created, |c| View::table(std::slice::from_ref(c)))
        }
        CourseCommand::List => {
            let list = courses.list()?;
            out.list(Message::CoursesListed(list.len()), Message::NoCoursesFound, &list, View::table)
        }
        CourseCommand::Delete { code, cascade } => {
            let removed = courses.delete(&code, cascade)?;
            out.data(
                Message::CourseDeleted(code.to_uppercase(), removed.students, removed.subjects),
                &removed,
                |_| {},
            )
        }
    }
}
