//! User-facing text for every [`Message`].
//!
//! All wording lives here. Parameters are interpolated by the match arm that
//! owns the variant, so adding a variant forces a wording decision.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

fn status(active: bool) -> &'static str {
    if active {
        "activated"
    } else {
        "deactivated"
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let text = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigLoaded => "Current configuration".to_string(),
            Message::ConfigModuleDatabase => "Database location".to_string(),
            Message::ConfigModuleThresholds => "Report thresholds".to_string(),
            Message::ConfigModulePassword => "Password policy".to_string(),
            Message::EncryptionKeyGenerated => "Generated a new encryption key for stored passwords".to_string(),
            Message::EncryptionKeyRotated => {
                "Encryption key replaced. Passwords stored under the old key can no longer be shown; reset them".to_string()
            }

            // === PROMPTS ===
            Message::PromptSelectModules => "Select settings to change".to_string(),
            Message::PromptRotateKey => "Generate a new encryption key?".to_string(),
            Message::PromptDatabasePath => "Database file".to_string(),
            Message::PromptAttendanceThreshold => "Attendance shortage threshold (%)".to_string(),
            Message::PromptMarksThreshold => "Marks deficiency threshold (%)".to_string(),
            Message::PromptPasswordLength => "Generated password length".to_string(),
            Message::PromptPassword => "Password".to_string(),
            Message::PromptPasswordConfirm => "Repeat password".to_string(),
            Message::PasswordMismatch => "Passwords do not match".to_string(),

            // === COURSE AND SUBJECT MESSAGES ===
            Message::CourseCreated(code) => format!("Course {} created", code),
            Message::CoursesListed(count) => format!("{} course(s)", count),
            Message::NoCoursesFound => "No courses found".to_string(),
            Message::CourseDeleted(code, students, subjects) => {
                format!("Course {} deleted with {} student(s) and {} subject(s)", code, students, subjects)
            }
            Message::SubjectCreated(code) => format!("Subject {} created", code),
            Message::SubjectNotFound(code) => format!("Subject {} not found", code),
            Message::SubjectsListed(count) => format!("{} subject(s)", count),
            Message::NoSubjectsFound => "No subjects found".to_string(),
            Message::SubjectDeleted(code, records) => format!("Subject {} deleted with {} dependent record(s)", code, records),
            Message::SubjectRequired(data) => format!("--subject is required to export {}", data),

            // === LECTURER MESSAGES ===
            Message::LecturerCreated(id) => format!("Lecturer {} created", id),
            Message::LecturersListed(count) => format!("{} lecturer(s)", count),
            Message::NoLecturersFound => "No lecturers found".to_string(),
            Message::LecturerStatusChanged(id, active) => format!("Lecturer {} {}", id, status(*active)),
            Message::LecturerRenamed(id, name) => format!("Lecturer {} renamed to {}", id, name),
            Message::LecturerInactive(id) => format!("Lecturer {} is inactive", id),
            Message::PasswordReset(id) => format!("Password for {} reset", id),
            Message::PasswordShown(id) => format!("Stored password for {}", id),
            Message::PasswordTooWeak(len) => {
                format!("must be at least {} characters with lower-case, upper-case and digit characters", len)
            }
            Message::SubjectAssigned(subject, lecturer, year) => format!("Subject {} assigned to {} for {}", subject, lecturer, year),
            Message::SubjectUnassigned(subject, lecturer) => format!("Subject {} unassigned from {}", subject, lecturer),
            Message::NotAssigned(lecturer, subject) => format!("Lecturer {} is not assigned to {}", lecturer, subject),
            Message::AssignmentsListed(count) => format!("{} assignment(s)", count),
            Message::NoAssignmentsFound(id) => format!("Lecturer {} has no assignments", id),

            // === STUDENT MESSAGES ===
            Message::StudentCreated(roll) => format!("Student {} created", roll),
            Message::StudentsListed(count) => format!("{} student(s)", count),
            Message::NoStudentsFound => "No students found".to_string(),
            Message::StudentStatusChanged(roll, active) => format!("Student {} {}", roll, status(*active)),
            Message::StudentInactive(roll) => format!("Student {} is inactive", roll),
            Message::StudentEnrolled(roll, count) => format!("Student {} enrolled in {} subject(s)", roll, count),
            Message::StudentUnenrolled(roll, subject) => format!("Student {} unenrolled from {}", roll, subject),
            Message::NotEnrolled(roll, subject) => format!("Student {} is not enrolled in {}", roll, subject),
            Message::NoEnrollments(roll) => format!("Student {} has no enrollments", roll),
            Message::NoStudentsEnrolled(subject) => format!("No students are enrolled in {}", subject),

            // === LOGIN MESSAGES ===
            Message::AdminCreated(username) => format!("Management account {} created", username),
            Message::LoginSuccessful(name) => format!("Welcome, {}", name),
            Message::InvalidCredentials => "Invalid username or password".to_string(),

            // === IMPORT MESSAGES ===
            Message::ImportCompleted(accepted, rejected) => {
                format!("Import finished: {} accepted, {} rejected", accepted, rejected)
            }
            Message::ImportDryRun(accepted, rejected) => {
                format!("Dry run: {} would be accepted, {} rejected; nothing was written and no credentials were issued", accepted, rejected)
            }
            Message::RowsRejected(count) => format!("{} row(s) rejected", count),
            Message::CredentialsWritten(path) => format!("Credentials written to {}", path),

            // === ATTENDANCE AND MARKS MESSAGES ===
            Message::AttendanceMarked(subject, date, present, absent) => {
                format!("Attendance for {} on {}: {} present, {} absent", subject, date, present, absent)
            }
            Message::AttendanceListed(count) => format!("{} record(s)", count),
            Message::NoAttendanceRecords(subject) => format!("No attendance recorded for {}", subject),
            Message::MarksRecorded(subject, assessment, count) => {
                format!("Recorded {} {} mark(s) for {}", count, assessment, subject)
            }
            Message::MarksListed(count) => format!("{} mark record(s)", count),
            Message::NoMarksFound(subject) => format!("No marks recorded for {}", subject),

            // === REPORT MESSAGES ===
            Message::StudentReportReady(roll) => format!("Report for {}", roll),
            Message::AttendanceShortIn(subjects) => format!("Attendance shortage in {}", subjects),
            Message::ShortageFound(count, threshold) => format!("{} student(s) below {}% attendance", count, threshold),
            Message::NoShortage(subject, threshold) => format!("No student in {} is below {}% attendance", subject, threshold),
            Message::DeficiencyFound(count, threshold) => format!("{} mark record(s) below {}%", count, threshold),
            Message::NoDeficiency(subject, threshold) => format!("No marks in {} are below {}%", subject, threshold),
            Message::ClassMarksReady(subject) => format!("Class marks for {}", subject),
            Message::CourseOverviewReady(code) => format!("Overview of course {}", code),

            // === EXPORT MESSAGES ===
            Message::ExportingData(data, format) => format!("Exporting {} as {}...", data, format),
            Message::ExportCompleted(path, rows) => format!("Exported {} row(s) to {}", rows, path),

            // === MIGRATION MESSAGES ===
            Message::MigrationsFound(count) => format!("Found {} pending database migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationFailed(version, error) => format!("Migration v{} failed: {}", version, error),
            Message::DatabaseVersion(version) => format!("Current database version: {}", version),
            Message::DatabaseUpToDate => "Database schema is up to date".to_string(),
            Message::DatabaseNeedsUpdate => "Database schema needs to be updated".to_string(),
            Message::MigrationHistory(count) => format!("{} migration(s) applied", count),
            Message::NoMigrationsApplied => "No migrations applied yet".to_string(),
        };

        write!(f, "{}", text)
    }
}
