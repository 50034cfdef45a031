#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigLoaded,
    ConfigModuleDatabase,
    ConfigModuleThresholds,
    ConfigModulePassword,
    EncryptionKeyGenerated,
    EncryptionKeyRotated,

    // === PROMPTS ===
    PromptSelectModules,
    PromptRotateKey,
    PromptDatabasePath,
    PromptAttendanceThreshold,
    PromptMarksThreshold,
    PromptPasswordLength,
    PromptPassword,
    PromptPasswordConfirm,
    PasswordMismatch,

    // === COURSE AND SUBJECT MESSAGES ===
    CourseCreated(String),
    CoursesListed(usize),
    NoCoursesFound,
    CourseDeleted(String, i64, i64), // code, students, subjects
    SubjectCreated(String),
    SubjectNotFound(String),
    SubjectsListed(usize),
    NoSubjectsFound,
    SubjectDeleted(String, i64), // code, dependent records
    SubjectRequired(String),

    // === LECTURER MESSAGES ===
    LecturerCreated(String),
    LecturersListed(usize),
    NoLecturersFound,
    LecturerStatusChanged(String, bool),
    LecturerRenamed(String, String),
    LecturerInactive(String),
    PasswordReset(String),
    PasswordShown(String),
    PasswordTooWeak(usize),
    SubjectAssigned(String, String, i32), // subject, lecturer, academic year
    SubjectUnassigned(String, String),
    NotAssigned(String, String), // lecturer, subject
    AssignmentsListed(usize),
    NoAssignmentsFound(String),

    // === STUDENT MESSAGES ===
    StudentCreated(String),
    StudentsListed(usize),
    NoStudentsFound,
    StudentStatusChanged(String, bool),
    StudentInactive(String),
    StudentEnrolled(String, usize),
    StudentUnenrolled(String, String),
    NotEnrolled(String, String), // roll number, subject
    NoEnrollments(String),
    NoStudentsEnrolled(String),

    // === LOGIN MESSAGES ===
    AdminCreated(String),
    LoginSuccessful(String),
    InvalidCredentials,

    // === IMPORT MESSAGES ===
    ImportCompleted(usize, usize), // accepted, rejected
    ImportDryRun(usize, usize),
    RowsRejected(usize),
    CredentialsWritten(String),

    // === ATTENDANCE AND MARKS MESSAGES ===
    AttendanceMarked(String, String, usize, usize), // subject, date, present, absent
    AttendanceListed(usize),
    NoAttendanceRecords(String),
    MarksRecorded(String, String, usize), // subject, assessment, entries
    MarksListed(usize),
    NoMarksFound(String),

    // === REPORT MESSAGES ===
    StudentReportReady(String),
    AttendanceShortIn(String),
    ShortageFound(usize, f64),
    NoShortage(String, f64),
    DeficiencyFound(usize, f64),
    NoDeficiency(String, f64),
    ClassMarksReady(String),
    CourseOverviewReady(String),

    // === EXPORT MESSAGES ===
    ExportingData(String, String), // data, format
    ExportCompleted(String, usize), // path, rows

    // === MIGRATION MESSAGES ===
    MigrationsFound(usize),
    RunningMigration(u32, String),
    MigrationFailed(u32, String),
    DatabaseVersion(u32),
    DatabaseUpToDate,
    DatabaseNeedsUpdate,
    MigrationHistory(usize),
    NoMigrationsApplied,
}
