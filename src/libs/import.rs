//! Bulk import reconciliation.
//!
//! A batch of raw sheet rows is classified in two phases. First every row is
//! checked, in order, for required fields, field formats, uniqueness (against
//! the store and against rows accepted earlier in the same batch) and
//! references. This phase is pure over a [`StoreSnapshot`] and produces an
//! [`ImportReport`] together with the typed records ready for insertion.
//! Second, [`commit`] writes every accepted record in one transaction; a
//! store failure rolls back the whole batch. Rejected rows never reach the
//! store.
//!
//! ```rust
//! use registrar::libs::import::{ImportKind, RawLecturerRow, RawRow, Reconciler, StoreSnapshot};
//! use registrar::libs::credentials::PasswordPolicy;
//! use registrar::libs::secret::CredentialCodec;
//!
//! let codec = CredentialCodec::new([7; 32]);
//! let row = |n, name: &str| RawRow::Lecturer(RawLecturerRow {
//!     row: n,
//!     lecturer_id: Some("L01".into()),
//!     name: Some(name.into()),
//!     email: None,
//!     subjects: vec![],
//! });
//! let mut reconciler = Reconciler::new(StoreSnapshot::default(), Some(&codec), PasswordPolicy::default(), rand::thread_rng());
//! let batch = reconciler.reconcile_batch(vec![row(2, "Asha"), row(3, "Ravi")], ImportKind::Lecturers)?;
//! assert_eq!(batch.report.accepted, 1);
//! assert_eq!(batch.report.rejected[0].reason.to_string(), "duplicate identifier");
//! # Ok::<(), registrar::libs::error::CodecError>(())
//! ```

use super::credentials::{base_username, generate_password, PasswordPolicy, UsernameRegistry};
use super::error::{CodecError, ReferenceError, RegistrarResult, RejectReason, ValidationError};
use super::secret::CredentialCodec;
use super::validate;
use crate::db::assignments::Assignments;
use crate::db::lecturers::{Lecturers, NewLecturer};
use crate::db::students::{NewStudent, Students};
use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Lecturers,
    Students,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Lecturers => f.write_str("lecturers"),
            ImportKind::Students => f.write_str("students"),
        }
    }
}

/// A lecturer row as read from the sheet, nothing validated yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLecturerRow {
    pub row: usize,
    pub lecturer_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStudentRow {
    pub row: usize,
    pub roll_number: Option<String>,
    pub name: Option<String>,
    pub course_code: Option<String>,
    pub academic_year: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    Lecturer(RawLecturerRow),
    Student(RawStudentRow),
}

impl RawRow {
    pub fn row(&self) -> usize {
        match self {
            RawRow::Lecturer(r) => r.row,
            RawRow::Student(r) => r.row,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            RawRow::Lecturer(r) => r.lecturer_id.as_deref(),
            RawRow::Student(r) => r.roll_number.as_deref(),
        }
        .map(str::trim)
        .filter(|id| !id.is_empty())
    }
}

/// A lecturer row that passed the structural and format checks.
#[derive(Debug, Clone, PartialEq)]
pub struct LecturerDraft {
    pub lecturer_id: String,
    pub name: String,
    pub email: Option<String>,
    pub subjects: Vec<String>,
}

impl LecturerDraft {
    pub fn parse(raw: &RawLecturerRow) -> Result<Self, ValidationError> {
        let lecturer_id = validate::required("lecturer_id", raw.lecturer_id.as_deref())?;
        let name = validate::required("name", raw.name.as_deref())?;
        validate::identifier("lecturer_id", lecturer_id)?;
        validate::person_name("name", name)?;
        let email = validate::optional_email(raw.email.as_deref())?;
        Ok(Self {
            lecturer_id: lecturer_id.to_string(),
            name: name.to_string(),
            email,
            subjects: raw.subjects.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentDraft {
    pub roll_number: String,
    pub name: String,
    pub course_code: String,
    pub academic_year: u32,
    pub email: Option<String>,
}

impl StudentDraft {
    pub fn parse(raw: &RawStudentRow) -> Result<Self, ValidationError> {
        let roll_number = validate::required("roll_number", raw.roll_number.as_deref())?;
        let name = validate::required("name", raw.name.as_deref())?;
        let course_code = validate::required("course_code", raw.course_code.as_deref())?;
        let year = validate::required("academic_year", raw.academic_year.as_deref())?;

        validate::identifier("roll_number", roll_number)?;
        validate::person_name("name", name)?;
        validate::identifier("course_code", course_code)?;
        let academic_year = validate::parse_academic_year(year).ok_or_else(|| ValidationError::format("academic_year"))?;
        let email = validate::optional_email(raw.email.as_deref())?;

        Ok(Self {
            roll_number: roll_number.to_string(),
            name: name.to_string(),
            course_code: course_code.to_uppercase(),
            academic_year,
            email,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseRef {
    pub id: i64,
    pub duration_years: u32,
}

/// What the reconciler needs to know about the store, read once per batch.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Upper-cased lecturer identifiers or roll numbers, active or not.
    identifiers: HashSet<String>,
    usernames: Vec<String>,
    courses: HashMap<String, CourseRef>,
    subjects: HashMap<String, Vec<i64>>,
}

impl StoreSnapshot {
    pub fn load(conn: &Connection, kind: ImportKind) -> RegistrarResult<Self> {
        let mut snapshot = Self::default();
        match kind {
            ImportKind::Lecturers => {
                for (lecturer_id, username) in Lecturers::new(conn).identities()? {
                    snapshot = snapshot.with_identifier(&lecturer_id).with_username(&username);
                }
                let mut stmt = conn.prepare("SELECT code, id FROM subjects WHERE is_active = 1 ORDER BY id")?;
                let subjects = stmt
                    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                for (code, id) in subjects {
                    snapshot = snapshot.with_subject(&code, id);
                }
            }
            ImportKind::Students => {
                for roll in Students::new(conn).roll_numbers()? {
                    snapshot = snapshot.with_identifier(&roll);
                }
                let mut stmt = conn.prepare("SELECT code, id, duration_years FROM courses WHERE is_active = 1")?;
                let courses = stmt
                    .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, u32>(2)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                for (code, id, duration_years) in courses {
                    snapshot = snapshot.with_course(&code, id, duration_years);
                }
            }
        }
        tracing::debug!(
            identifiers = snapshot.identifiers.len(),
            courses = snapshot.courses.len(),
            subjects = snapshot.subjects.len(),
            "store snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifiers.insert(identifier.trim().to_uppercase());
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.usernames.push(username.to_lowercase());
        self
    }

    pub fn with_course(mut self, code: &str, id: i64, duration_years: u32) -> Self {
        self.courses.insert(code.trim().to_uppercase(), CourseRef { id, duration_years });
        self
    }

    pub fn with_subject(mut self, code: &str, id: i64) -> Self {
        self.subjects.entry(code.trim().to_uppercase()).or_default().push(id);
        self
    }

    pub fn course(&self, code: &str) -> Option<CourseRef> {
        self.courses.get(&code.trim().to_uppercase()).copied()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Rejection {
    pub row: usize,
    pub identifier: Option<String>,
    pub reason: RejectReason,
}

/// Plaintext credentials handed back once, right after import.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IssuedCredential {
    pub lecturer_id: String,
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportReport {
    pub kind: ImportKind,
    pub total: usize,
    pub accepted: usize,
    pub rejected: Vec<Rejection>,
    pub credentials: Vec<IssuedCredential>,
    pub warnings: Vec<String>,
    pub committed: bool,
}

impl ImportReport {
    fn new(kind: ImportKind, total: usize) -> Self {
        Self {
            kind,
            total,
            accepted: 0,
            rejected: Vec::new(),
            credentials: Vec::new(),
            warnings: Vec::new(),
            committed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AcceptedLecturer {
    pub row: usize,
    pub record: NewLecturer,
    /// Subject row ids to assign the lecturer to.
    pub subject_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct AcceptedStudent {
    pub row: usize,
    pub record: NewStudent,
}

/// The report plus everything needed to commit it.
#[derive(Debug, Clone)]
pub struct ReconciledBatch {
    pub report: ImportReport,
    pub lecturers: Vec<AcceptedLecturer>,
    pub students: Vec<AcceptedStudent>,
}

impl ReconciledBatch {
    /// The report of a batch that will not be committed. Passwords generated
    /// for it are discarded, never shown.
    pub fn preview(self) -> ImportReport {
        ImportReport {
            credentials: Vec::new(),
            ..self.report
        }
    }
}

pub struct Reconciler<'a, R: Rng> {
    snapshot: StoreSnapshot,
    /// Needed only when lecturer rows issue credentials.
    codec: Option<&'a CredentialCodec>,
    policy: PasswordPolicy,
    rng: R,
}

impl<'a, R: Rng> Reconciler<'a, R> {
    pub fn new(snapshot: StoreSnapshot, codec: Option<&'a CredentialCodec>, policy: PasswordPolicy, rng: R) -> Self {
        Self {
            snapshot,
            codec,
            policy,
            rng,
        }
    }

    /// Classifies every row. Only credential encoding can fail the batch.
    pub fn reconcile_batch(&mut self, rows: Vec<RawRow>, kind: ImportKind) -> Result<ReconciledBatch, CodecError> {
        let mut batch = ReconciledBatch {
            report: ImportReport::new(kind, rows.len()),
            lecturers: Vec::new(),
            students: Vec::new(),
        };
        let mut seen: HashSet<String> = HashSet::new();
        let mut usernames = UsernameRegistry::new(&self.snapshot.usernames);

        for raw in rows {
            let row = raw.row();
            let identifier = raw.identifier().map(str::to_string);
            let outcome = match (&raw, kind) {
                (RawRow::Lecturer(r), ImportKind::Lecturers) => self.lecturer(r, &seen, &mut usernames, &mut batch)?,
                (RawRow::Student(r), ImportKind::Students) => self.student(r, &seen, &mut batch),
                _ => Err(ValidationError::format("row").into()),
            };

            match outcome {
                Ok(accepted_id) => {
                    seen.insert(accepted_id.to_uppercase());
                    batch.report.accepted += 1;
                }
                Err(reason) => {
                    tracing::debug!(row, identifier = ?identifier, %reason, "row rejected");
                    batch.report.rejected.push(Rejection { row, identifier, reason });
                }
            }
        }

        tracing::info!(
            kind = %kind,
            total = batch.report.total,
            accepted = batch.report.accepted,
            rejected = batch.report.rejected.len(),
            "batch reconciled"
        );
        Ok(batch)
    }

    fn check_unique(&self, identifier: &str, seen: &HashSet<String>) -> Result<(), RejectReason> {
        let key = identifier.to_uppercase();
        if self.snapshot.identifiers.contains(&key) || seen.contains(&key) {
            return Err(ValidationError::duplicate(identifier).into());
        }
        Ok(())
    }

    fn lecturer(
        &mut self,
        raw: &RawLecturerRow,
        seen: &HashSet<String>,
        usernames: &mut UsernameRegistry,
        batch: &mut ReconciledBatch,
    ) -> Result<Result<String, RejectReason>, CodecError> {
        let draft = match LecturerDraft::parse(raw) {
            Ok(draft) => draft,
            Err(e) => return Ok(Err(e.into())),
        };
        if let Err(reason) = self.check_unique(&draft.lecturer_id, seen) {
            return Ok(Err(reason));
        }

        let mut subject_ids = Vec::new();
        for code in &draft.subjects {
            match self.snapshot.subjects.get(&code.trim().to_uppercase()).map(Vec::as_slice) {
                Some([id]) => subject_ids.push(*id),
                Some(_) => batch.report.warnings.push(format!(
                    "row {}: subject {} exists in several courses, not assigned",
                    raw.row, code
                )),
                None => batch.report.warnings.push(format!("row {}: unknown subject {}, not assigned", raw.row, code)),
            }
        }

        let username = usernames.claim(&base_username(&draft.name, &draft.lecturer_id));
        let password = generate_password(&mut self.rng, &self.policy);
        let encoded = self.codec.ok_or(CodecError::MissingKey)?.encode(&password)?;

        batch.report.credentials.push(IssuedCredential {
            lecturer_id: draft.lecturer_id.clone(),
            name: draft.name.clone(),
            username: username.clone(),
            password,
        });
        batch.lecturers.push(AcceptedLecturer {
            row: raw.row,
            record: NewLecturer {
                lecturer_id: draft.lecturer_id.clone(),
                name: draft.name,
                username,
                email: draft.email,
                password: encoded,
            },
            subject_ids,
        });
        Ok(Ok(draft.lecturer_id))
    }

    fn student(&self, raw: &RawStudentRow, seen: &HashSet<String>, batch: &mut ReconciledBatch) -> Result<String, RejectReason> {
        let draft = StudentDraft::parse(raw)?;
        self.check_unique(&draft.roll_number, seen)?;

        let course = self.snapshot.course(&draft.course_code).ok_or_else(|| ReferenceError::UnknownCourse {
            code: draft.course_code.clone(),
        })?;
        validate::academic_year(draft.academic_year, course.duration_years)?;

        batch.students.push(AcceptedStudent {
            row: raw.row,
            record: NewStudent {
                roll_number: draft.roll_number.clone(),
                name: draft.name,
                course_id: course.id,
                academic_year: draft.academic_year,
                current_semester: first_semester_of(draft.academic_year),
                email: draft.email,
            },
        });
        Ok(draft.roll_number)
    }
}

/// Odd semester that opens `year`.
pub fn first_semester_of(year: u32) -> u32 {
    year.saturating_sub(1) * 2 + 1
}

/// Writes the accepted records of `batch` in one transaction and marks the
/// report committed. Lecturer subject codes become assignments for
/// `academic_year`.
pub fn commit(conn: &mut Connection, batch: &mut ReconciledBatch, academic_year: i32) -> RegistrarResult<usize> {
    let tx = conn.transaction()?;
    let mut written = 0;
    {
        let lecturers = Lecturers::new(&tx);
        let assignments = Assignments::new(&tx);
        for accepted in &batch.lecturers {
            let id = lecturers.insert(&accepted.record)?;
            for subject in &accepted.subject_ids {
                assignments.assign(id, *subject, academic_year)?;
            }
            written += 1;
        }

        let students = Students::new(&tx);
        for accepted in &batch.students {
            students.insert(&accepted.record)?;
            written += 1;
        }
    }
    tx.commit()?;

    batch.report.committed = true;
    tracing::info!(kind = %batch.report.kind, written, "batch committed");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn codec() -> CredentialCodec {
        CredentialCodec::new([3; 32])
    }

    fn lecturer(row: usize, id: &str, name: &str) -> RawRow {
        RawRow::Lecturer(RawLecturerRow {
            row,
            lecturer_id: Some(id.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        })
    }

    fn student(row: usize, roll: &str, course: &str, year: &str) -> RawRow {
        RawRow::Student(RawStudentRow {
            row,
            roll_number: Some(roll.to_string()),
            name: Some("Asha Rao".to_string()),
            course_code: Some(course.to_string()),
            academic_year: Some(year.to_string()),
            email: None,
        })
    }

    fn reconcile(snapshot: StoreSnapshot, rows: Vec<RawRow>, kind: ImportKind) -> ReconciledBatch {
        let codec = codec();
        let mut reconciler = Reconciler::new(snapshot, Some(&codec), PasswordPolicy::default(), StdRng::seed_from_u64(9));
        reconciler.reconcile_batch(rows, kind).unwrap()
    }

    #[test]
    fn structural_errors_name_the_field() {
        let rows = vec![RawRow::Lecturer(RawLecturerRow {
            row: 2,
            lecturer_id: Some("L01".into()),
            ..Default::default()
        })];
        let batch = reconcile(StoreSnapshot::default(), rows, ImportKind::Lecturers);
        assert_eq!(batch.report.rejected[0].reason.to_string(), "missing field: name");
    }

    #[test]
    fn in_batch_duplicates_are_case_insensitive() {
        let rows = vec![lecturer(2, "l01", "Asha"), lecturer(3, "L01", "Ravi")];
        let batch = reconcile(StoreSnapshot::default(), rows, ImportKind::Lecturers);
        assert_eq!(batch.report.accepted, 1);
        assert_eq!(batch.report.rejected[0].row, 3);
        assert_eq!(batch.report.rejected[0].reason.to_string(), "duplicate identifier");
    }

    #[test]
    fn a_rejected_row_does_not_claim_its_identifier() {
        let rows = vec![lecturer(2, "L01", "R2D2"), lecturer(3, "L01", "Ravi")];
        let batch = reconcile(StoreSnapshot::default(), rows, ImportKind::Lecturers);
        assert_eq!(batch.report.rejected[0].reason.to_string(), "invalid format");
        assert_eq!(batch.lecturers[0].row, 3);
    }

    #[test]
    fn usernames_avoid_existing_ones() {
        let snapshot = StoreSnapshot::default().with_username("asha_l02");
        let batch = reconcile(snapshot, vec![lecturer(2, "L02", "Asha Rao")], ImportKind::Lecturers);
        assert_eq!(batch.report.credentials[0].username, "asha_l02_1");
        assert_eq!(batch.lecturers[0].record.username, "asha_l02_1");
    }

    #[test]
    fn unknown_subject_codes_only_warn() {
        let snapshot = StoreSnapshot::default().with_subject("CS101", 4);
        let rows = vec![RawRow::Lecturer(RawLecturerRow {
            row: 2,
            lecturer_id: Some("L01".into()),
            name: Some("Asha".into()),
            email: None,
            subjects: vec!["CS101".into(), "XX9".into()],
        })];
        let batch = reconcile(snapshot, rows, ImportKind::Lecturers);
        assert_eq!(batch.report.accepted, 1);
        assert_eq!(batch.lecturers[0].subject_ids, vec![4]);
        assert_eq!(batch.report.warnings.len(), 1);
    }

    #[test]
    fn students_need_a_known_course_and_a_year_within_it() {
        let snapshot = StoreSnapshot::default().with_course("BCA", 1, 3).with_identifier("bca001");
        let rows = vec![
            student(2, "BCA001", "BCA", "1"),
            student(3, "BCA002", "BSC", "1"),
            student(4, "BCA003", "BCA", "IV"),
            student(5, "BCA004", "bca", "2nd"),
        ];
        let batch = reconcile(snapshot, rows, ImportKind::Students);
        let reasons: Vec<String> = batch.report.rejected.iter().map(|r| r.reason.to_string()).collect();
        assert_eq!(reasons, vec!["duplicate identifier", "unknown course", "invalid format"]);
        assert_eq!(batch.students.len(), 1);
        assert_eq!(batch.students[0].record.academic_year, 2);
        assert_eq!(batch.students[0].record.current_semester, 3);
    }

    #[test]
    fn only_lecturer_rows_need_a_codec() {
        let snapshot = StoreSnapshot::default().with_course("BCA", 1, 3);
        let mut reconciler = Reconciler::new(snapshot, None, PasswordPolicy::default(), StdRng::seed_from_u64(1));
        let batch = reconciler.reconcile_batch(vec![student(2, "BCA001", "BCA", "1")], ImportKind::Students).unwrap();
        assert_eq!(batch.report.accepted, 1);

        let mut reconciler = Reconciler::new(StoreSnapshot::default(), None, PasswordPolicy::default(), StdRng::seed_from_u64(1));
        let result = reconciler.reconcile_batch(vec![lecturer(2, "L01", "Asha")], ImportKind::Lecturers);
        assert!(matches!(result, Err(CodecError::MissingKey)));
    }

    #[test]
    fn rows_of_the_other_kind_are_rejected() {
        let batch = reconcile(StoreSnapshot::default(), vec![lecturer(2, "L01", "Asha")], ImportKind::Students);
        assert_eq!(batch.report.accepted, 0);
        assert_eq!(batch.report.rejected.len(), 1);
    }
}
