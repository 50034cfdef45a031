use super::{lecturer::current_year, Session};
use crate::{
    db::{
        enrollments::Enrollments,
        students::{StudentFilter, Students},
        subjects::Subjects,
    },
    libs::{
        import::{self, ImportKind, RawRow, RawStudentRow, Reconciler, StoreSnapshot},
        messages::Message,
        ordering::order,
        response::Responder,
        view::View,
    },
    msg_bail_anyhow,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct StudentArgs {
    #[command(subcommand)]
    command: StudentCommand,
}

#[derive(Debug, Subcommand)]
enum StudentCommand {
    /// Register a student in a course
    Add {
        roll_number: String,
        name: String,
        /// Course code
        #[arg(short, long)]
        course: String,
        /// Year of study, e.g. 2 or "II"
        #[arg(short, long)]
        year: String,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// List students in display order
    List {
        #[arg(short, long)]
        course: Option<String>,
        #[arg(short, long)]
        year: Option<u32>,
        /// Only active students
        #[arg(long)]
        active: bool,
    },
    /// Activate or deactivate a student
    Toggle { roll_number: String },
    /// Enroll a student in one or more subjects
    Enroll {
        roll_number: String,
        #[arg(required = true)]
        subjects: Vec<String>,
        /// Course of the subjects (defaults to the student's course)
        #[arg(short, long)]
        course: Option<String>,
    },
    /// End a student's enrollment in a subject
    Unenroll {
        roll_number: String,
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
    },
    /// List the subjects a student is enrolled in
    Subjects { roll_number: String },
}

pub fn cmd(args: StudentArgs, out: &Responder) -> Result<()> {
    let mut session = Session::open()?;

    match args.command {
        StudentCommand::Add {
            roll_number,
            name,
            course,
            year,
            email,
        } => {
            let row = RawStudentRow {
                row: 1,
                roll_number: Some(roll_number),
                name: Some(name),
                course_code: Some(course),
                academic_year: Some(year),
                email,
            };
            let snapshot = StoreSnapshot::load(&session.db.conn, ImportKind::Students)?;
            let mut reconciler = Reconciler::new(snapshot, None, session.config.password.clone(), rand::thread_rng());
            let mut batch = reconciler.reconcile_batch(vec![RawRow::Student(row)], ImportKind::Students)?;
            if let Some(rejection) = batch.report.rejected.first() {
                return Err(rejection.reason.clone().into());
            }
            import::commit(&mut session.db.conn, &mut batch, current_year())?;

            let roll = batch.students.first().map(|s| s.record.roll_number.clone()).unwrap_or_default();
            let created = Students::new(&session.db.conn).require(&roll)?;
            out.data(Message::StudentCreated(roll), &created, |s| View::table(std::slice::from_ref(s)))
        }
        StudentCommand::List { course, year, active } => {
            let filter = StudentFilter {
                course_code: course,
                academic_year: year,
                active_only: active,
            };
            let students = order(Students::new(&session.db.conn).list(&filter)?, &session.config.ordering);
            out.list(Message::StudentsListed(students.len()), Message::NoStudentsFound, &students, View::table)
        }
        StudentCommand::Toggle { roll_number } => {
            let tx = session.db.conn.transaction()?;
            let active = Students::new(&tx).toggle(&roll_number)?;
            tx.commit()?;
            out.data(
                Message::StudentStatusChanged(roll_number.clone(), active),
                &serde_json::json!({ "roll_number": roll_number, "is_active": active }),
                |_| {},
            )
        }
        StudentCommand::Enroll {
            roll_number,
            subjects,
            course,
        } => {
            let tx = session.db.conn.transaction()?;
            let student = Students::new(&tx).require(&roll_number)?;
            if !student.is_active {
                msg_bail_anyhow!(Message::StudentInactive(student.roll_number));
            }
            let course = course.unwrap_or_else(|| student.course_code.clone());

            let catalogue = Subjects::new(&tx);
            let enrollments = Enrollments::new(&tx);
            let mut enrolled = Vec::new();
            for code in &subjects {
                let subject = catalogue.resolve(code, Some(course.as_str()))?;
                enrollments.enroll(student.id, subject.id)?;
                enrolled.push(subject.code);
            }
            tx.commit()?;
            tracing::info!(roll_number = %student.roll_number, subjects = enrolled.len(), "student enrolled");

            out.data(
                Message::StudentEnrolled(student.roll_number.clone(), enrolled.len()),
                &serde_json::json!({ "roll_number": student.roll_number, "subjects": enrolled }),
                |_| {},
            )
        }
        StudentCommand::Unenroll {
            roll_number,
            subject,
            course,
        } => {
            let student = Students::new(&session.db.conn).require(&roll_number)?;
            let course = course.unwrap_or_else(|| student.course_code.clone());
            let subject = Subjects::new(&session.db.conn).resolve(&subject, Some(course.as_str()))?;
            if !Enrollments::new(&session.db.conn).unenroll(student.id, subject.id)? {
                msg_bail_anyhow!(Message::NotEnrolled(student.roll_number, subject.code));
            }
            out.done(Message::StudentUnenrolled(student.roll_number, subject.code))
        }
        StudentCommand::Subjects { roll_number } => {
            let student = Students::new(&session.db.conn).require(&roll_number)?;
            let subjects = Enrollments::new(&session.db.conn).subjects_of(student.id)?;
            out.list(
                Message::SubjectsListed(subjects.len()),
                Message::NoEnrollments(student.roll_number),
                &subjects,
                View::table,
            )
        }
    }
}
