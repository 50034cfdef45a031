use super::{resolve_subject, Session};
use crate::{
    db::{
        assignments::Assignments,
        lecturers::{Lecturer, Lecturers},
    },
    libs::{
        credentials::generate_password,
        import::{self, ImportKind, IssuedCredential, RawLecturerRow, RawRow, Reconciler, StoreSnapshot},
        messages::Message,
        ordering::order,
        response::Responder,
        secret::verify_password,
        validate,
        view::View,
    },
    msg_bail_anyhow, msg_warning,
};
use anyhow::Result;
use chrono::{Datelike, Local};
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Password};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct LecturerArgs {
    #[command(subcommand)]
    command: LecturerCommand,
}

#[derive(Debug, Subcommand)]
enum LecturerCommand {
    /// Create a lecturer with generated login credentials
    Add {
        lecturer_id: String,
        name: String,
        #[arg(short, long)]
        email: Option<String>,
        /// Subject codes to assign, comma separated
        #[arg(short, long, value_delimiter = ',')]
        subjects: Vec<String>,
        /// Academic year for the assignments (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// List lecturers in display order
    List {
        /// Only active lecturers
        #[arg(long)]
        active: bool,
    },
    /// Activate or deactivate a lecturer
    Toggle { lecturer_id: String },
    /// Change a lecturer's display name
    Rename { lecturer_id: String, name: String },
    /// Generate a new password
    ResetPassword { lecturer_id: String },
    /// Show the stored password
    ShowPassword { lecturer_id: String },
    /// Assign a subject for an academic year
    Assign {
        lecturer_id: String,
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// End a subject assignment (every year unless --year is given)
    Unassign {
        lecturer_id: String,
        subject: String,
        #[arg(short, long)]
        course: Option<String>,
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// List a lecturer's subject assignments
    Assignments { lecturer_id: String },
    /// Check a lecturer's login
    Login {
        username: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct StoredPassword {
    lecturer_id: String,
    username: String,
    password: String,
}

pub fn cmd(args: LecturerArgs, out: &Responder) -> Result<()> {
    let mut session = Session::open()?;

    match args.command {
        LecturerCommand::Add {
            lecturer_id,
            name,
            email,
            subjects,
            year,
        } => {
            let row = RawLecturerRow {
                row: 1,
                lecturer_id: Some(lecturer_id),
                name: Some(name),
                email,
                subjects: subjects.iter().map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty()).collect(),
            };
            handle_add(&mut session, row, year.unwrap_or_else(current_year), out)
        }
        LecturerCommand::List { active } => {
            let lecturers: Vec<Lecturer> = Lecturers::new(&session.db.conn)
                .list()?
                .into_iter()
                .filter(|l| !active || l.is_active)
                .collect();
            let lecturers = order(lecturers, &session.config.ordering);
            out.list(Message::LecturersListed(lecturers.len()), Message::NoLecturersFound, &lecturers, View::table)
        }
        LecturerCommand::Toggle { lecturer_id } => {
            let tx = session.db.conn.transaction()?;
            let active = Lecturers::new(&tx).toggle(&lecturer_id)?;
            tx.commit()?;
            out.data(
                Message::LecturerStatusChanged(lecturer_id.clone(), active),
                &serde_json::json!({ "lecturer_id": lecturer_id, "is_active": active }),
                |_| {},
            )
        }
        LecturerCommand::Rename { lecturer_id, name } => {
            let name = validate::required("name", Some(name.as_str()))?;
            validate::person_name("name", name)?;
            let lecturers = Lecturers::new(&session.db.conn);
            let lecturer = lecturers.require(&lecturer_id)?;
            lecturers.rename(lecturer.id, name)?;
            out.done(Message::LecturerRenamed(lecturer.lecturer_id, name.to_string()))
        }
        LecturerCommand::ResetPassword { lecturer_id } => handle_reset_password(&mut session, &lecturer_id, out),
        LecturerCommand::ShowPassword { lecturer_id } => {
            let lecturer = Lecturers::new(&session.db.conn).require(&lecturer_id)?;
            let password = session.config.codec()?.decode(&lecturer.password_encrypted)?;
            let stored = StoredPassword {
                lecturer_id: lecturer.lecturer_id.clone(),
                username: lecturer.username,
                password,
            };
            out.data(Message::PasswordShown(lecturer.lecturer_id), &stored, |s| {
                println!("{}: {}", s.username, s.password);
            })
        }
        LecturerCommand::Assign {
            lecturer_id,
            subject,
            course,
            year,
        } => {
            let lecturer = Lecturers::new(&session.db.conn).require(&lecturer_id)?;
            let subject = resolve_subject(&session, &subject, course.as_deref())?;
            let year = year.unwrap_or_else(current_year);
            Assignments::new(&session.db.conn).assign(lecturer.id, subject.id, year)?;
            out.done(Message::SubjectAssigned(subject.code, lecturer.lecturer_id, year))
        }
        LecturerCommand::Unassign {
            lecturer_id,
            subject,
            course,
            year,
        } => {
            let lecturer = Lecturers::new(&session.db.conn).require(&lecturer_id)?;
            let subject = resolve_subject(&session, &subject, course.as_deref())?;
            let ended = Assignments::new(&session.db.conn).unassign(lecturer.id, subject.id, year)?;
            if ended == 0 {
                msg_bail_anyhow!(Message::NotAssigned(lecturer.lecturer_id, subject.code));
            }
            out.done(Message::SubjectUnassigned(subject.code, lecturer.lecturer_id))
        }
        LecturerCommand::Assignments { lecturer_id } => {
            let lecturer = Lecturers::new(&session.db.conn).require(&lecturer_id)?;
            let assignments = Assignments::new(&session.db.conn).for_lecturer(lecturer.id)?;
            out.list(
                Message::AssignmentsListed(assignments.len()),
                Message::NoAssignmentsFound(lecturer.lecturer_id),
                &assignments,
                View::table,
            )
        }
        LecturerCommand::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => Password::with_theme(&ColorfulTheme::default())
                    .with_prompt(Message::PromptPassword.to_string())
                    .interact()?,
            };
            let lecturers = Lecturers::new(&session.db.conn);
            let lecturer = match lecturers.get_by_username(&username)? {
                Some(l) if l.is_active && verify_password(&password, &l.password_hash) => l,
                _ => {
                    tracing::info!(username = %username, "lecturer login rejected");
                    msg_bail_anyhow!(Message::InvalidCredentials);
                }
            };
            lecturers.touch_login(lecturer.id)?;
            let lecturer = lecturers.require(&lecturer.lecturer_id)?;
            out.data(Message::LoginSuccessful(lecturer.name.clone()), &lecturer, |_| {})
        }
    }
}

fn handle_add(session: &mut Session, row: RawLecturerRow, year: i32, out: &Responder) -> Result<()> {
    let codec = session.config.codec()?;
    let snapshot = StoreSnapshot::load(&session.db.conn, ImportKind::Lecturers)?;
    let mut reconciler = Reconciler::new(snapshot, Some(&codec), session.config.password.clone(), rand::thread_rng());
    let mut batch = reconciler.reconcile_batch(vec![RawRow::Lecturer(row)], ImportKind::Lecturers)?;

    if let Some(rejection) = batch.report.rejected.first() {
        return Err(rejection.reason.clone().into());
    }
    import::commit(&mut session.db.conn, &mut batch, year)?;

    if !out.is_json() {
        for warning in &batch.report.warnings {
            msg_warning!(warning);
        }
    }
    let credentials = batch.report.credentials;
    let lecturer_id = credentials.first().map(|c| c.lecturer_id.clone()).unwrap_or_default();
    out.data(Message::LecturerCreated(lecturer_id), &credentials, |c| View::table(c))
}

fn handle_reset_password(session: &mut Session, lecturer_id: &str, out: &Responder) -> Result<()> {
    let codec = session.config.codec()?;
    let password = generate_password(&mut rand::thread_rng(), &session.config.password);
    let encoded = codec.encode(&password)?;

    let tx = session.db.conn.transaction()?;
    let lecturer = Lecturers::new(&tx).require(lecturer_id)?;
    Lecturers::new(&tx).update_password(lecturer.id, &encoded)?;
    tx.commit()?;
    tracing::info!(lecturer_id = %lecturer.lecturer_id, "password reset");

    let credential = IssuedCredential {
        lecturer_id: lecturer.lecturer_id.clone(),
        name: lecturer.name,
        username: lecturer.username,
        password,
    };
    out.data(Message::PasswordReset(lecturer.lecturer_id), &credential, |c| View::table(std::slice::from_ref(c)))
}

pub(crate) fn current_year() -> i32 {
    Local::now().year()
}
