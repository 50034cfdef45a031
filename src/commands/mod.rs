pub mod admin;
pub mod attendance;
pub mod course;
pub mod export;
pub mod import;
pub mod init;
pub mod lecturer;
pub mod marks;
pub mod migrations;
pub mod report;
pub mod student;
pub mod subject;

use crate::db::db::Db;
use crate::db::subjects::{Subject, Subjects};
use crate::libs::config::Config;
use crate::libs::response::Responder;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Interactive configuration and key generation")]
    Init(init::InitArgs),
    #[command(about = "Manage courses")]
    Course(course::CourseArgs),
    #[command(about = "Manage subjects")]
    Subject(subject::SubjectArgs),
    #[command(about = "Manage lecturers, their credentials and subject assignments")]
    Lecturer(lecturer::LecturerArgs),
    #[command(about = "Manage students and their enrollments")]
    Student(student::StudentArgs),
    #[command(about = "Bulk import lecturers or students from a sheet", arg_required_else_help = true)]
    Import(import::ImportArgs),
    #[command(about = "Record and summarise attendance")]
    Attendance(attendance::AttendanceArgs),
    #[command(about = "Record and list assessment marks")]
    Marks(marks::MarksArgs),
    #[command(about = "Academic reports")]
    Report(report::ReportArgs),
    #[command(about = "Export listings and reports to CSV, JSON or Excel")]
    Export(export::ExportArgs),
    #[command(about = "Management accounts")]
    Admin(admin::AdminArgs),
    #[command(about = "Database schema status")]
    Migrations(migrations::MigrationsArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    /// Answer with a JSON envelope instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parses the command line and runs the command. Failures are reported
    /// through the responder before being returned.
    pub fn menu() -> Result<()> {
        let cli = Self::parse();
        let out = Responder::new(cli.json);

        let result = match cli.command {
            Commands::Init(args) => init::cmd(args, &out),
            Commands::Course(args) => course::cmd(args, &out),
            Commands::Subject(args) => subject::cmd(args, &out),
            Commands::Lecturer(args) => lecturer::cmd(args, &out),
            Commands::Student(args) => student::cmd(args, &out),
            Commands::Import(args) => import::cmd(args, &out),
            Commands::Attendance(args) => attendance::cmd(args, &out),
            Commands::Marks(args) => marks::cmd(args, &out),
            Commands::Report(args) => report::cmd(args, &out),
            Commands::Export(args) => export::cmd(args, &out),
            Commands::Admin(args) => admin::cmd(args, &out),
            Commands::Migrations(args) => migrations::cmd(args, &out),
        };

        if let Err(err) = &result {
            tracing::debug!(error = ?err, "command failed");
            out.fail(err);
        }
        result
    }
}

/// Configuration plus an open, migrated database.
pub struct Session {
    pub config: Config,
    pub db: Db,
}

impl Session {
    pub fn open() -> Result<Self> {
        let config = Config::read()?;
        let db = Db::open(config.database_path()?)?;
        Ok(Self { config, db })
    }
}

pub(crate) fn resolve_subject(session: &Session, code: &str, course: Option<&str>) -> Result<Subject> {
    Ok(Subjects::new(&session.db.conn).resolve(code, course)?)
}

/// `today` or an ISO date.
pub(crate) fn parse_date(date_str: &str) -> Result<NaiveDate> {
    if date_str.eq_ignore_ascii_case("today") {
        Ok(Local::now().date_naive())
    } else {
        Ok(NaiveDate::parse_from_str(date_str, "%Y-%m-%d")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn dates() {
        assert_eq!(parse_date("2024-06-03").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert!(parse_date("03/06/2024").is_err());
    }
}
