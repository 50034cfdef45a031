#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use registrar::db::assignments::Assignments;
    use registrar::db::courses::{Courses, NewCourse};
    use registrar::db::db::Db;
    use registrar::db::lecturers::{Lecturers, NewLecturer};
    use registrar::db::students::Students;
    use registrar::db::subjects::{NewSubject, Subjects};
    use registrar::libs::credentials::PasswordPolicy;
    use registrar::libs::import::{commit, ImportKind, RawLecturerRow, RawRow, RawStudentRow, ReconciledBatch, Reconciler, StoreSnapshot};
    use registrar::libs::secret::CredentialCodec;
    use registrar::libs::sheet;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct ImportTestContext {
        _temp_dir: TempDir,
        db: Db,
        codec: CredentialCodec,
    }

    impl TestContext for ImportTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db = Db::open(temp_dir.path().join("registrar.db")).unwrap();
            ImportTestContext {
                _temp_dir: temp_dir,
                db,
                codec: CredentialCodec::new([42; 32]),
            }
        }
    }

    fn lecturer(row: usize, id: &str, name: &str, subjects: &[&str]) -> RawRow {
        RawRow::Lecturer(RawLecturerRow {
            row,
            lecturer_id: Some(id.to_string()),
            name: Some(name.to_string()),
            email: None,
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn student(row: usize, roll: &str, course: &str, year: &str) -> RawRow {
        RawRow::Student(RawStudentRow {
            row,
            roll_number: Some(roll.to_string()),
            name: Some("Meera Nair".to_string()),
            course_code: Some(course.to_string()),
            academic_year: Some(year.to_string()),
            email: Some("NA".to_string()),
        })
    }

    fn reconcile(ctx: &ImportTestContext, rows: Vec<RawRow>, kind: ImportKind) -> ReconciledBatch {
        let snapshot = StoreSnapshot::load(&ctx.db.conn, kind).unwrap();
        let mut reconciler = Reconciler::new(snapshot, Some(&ctx.codec), PasswordPolicy::default(), StdRng::seed_from_u64(1));
        reconciler.reconcile_batch(rows, kind).unwrap()
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_duplicate_in_batch_keeps_first_row(ctx: &mut ImportTestContext) {
        let rows = vec![lecturer(2, "L01", "Asha Rao", &[]), lecturer(3, "L01", "Ravi Kumar", &[])];
        let mut batch = reconcile(ctx, rows, ImportKind::Lecturers);

        assert_eq!(batch.report.accepted, 1);
        assert_eq!(batch.report.rejected.len(), 1);
        assert_eq!(batch.report.rejected[0].row, 3);
        assert_eq!(batch.report.rejected[0].reason.to_string(), "duplicate identifier");

        assert_eq!(commit(&mut ctx.db.conn, &mut batch, 2024).unwrap(), 1);
        assert!(batch.report.committed);
        let stored = Lecturers::new(&ctx.db.conn).require("L01").unwrap();
        assert_eq!(stored.name, "Asha Rao");
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_persisted_identifiers_reject_case_insensitively(ctx: &mut ImportTestContext) {
        let mut first = reconcile(ctx, vec![lecturer(2, "L01", "Asha Rao", &[])], ImportKind::Lecturers);
        commit(&mut ctx.db.conn, &mut first, 2024).unwrap();
        Lecturers::new(&ctx.db.conn).toggle("L01").unwrap();

        let second = reconcile(ctx, vec![lecturer(2, "l01", "Asha Rao", &[])], ImportKind::Lecturers);
        assert_eq!(second.report.accepted, 0);
        assert_eq!(second.report.rejected[0].reason.to_string(), "duplicate identifier");
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_issued_credentials_are_stored_recoverably(ctx: &mut ImportTestContext) {
        let mut batch = reconcile(ctx, vec![lecturer(2, "L07", "Asha Rao", &[])], ImportKind::Lecturers);
        commit(&mut ctx.db.conn, &mut batch, 2024).unwrap();

        let issued = &batch.report.credentials[0];
        let stored = Lecturers::new(&ctx.db.conn).get_by_username(&issued.username).unwrap().unwrap();
        assert_eq!(stored.lecturer_id, "L07");
        assert_ne!(stored.password_hash, issued.password);
        assert!(ctx.codec.verify(&issued.password, &stored.password_hash));
        assert_eq!(ctx.codec.decode(&stored.password_encrypted).unwrap(), issued.password);
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_store_failure_rolls_back_whole_batch(ctx: &mut ImportTestContext) {
        let mut batch = reconcile(
            ctx,
            vec![lecturer(2, "L01", "Asha Rao", &[]), lecturer(3, "L02", "Ravi Kumar", &[])],
            ImportKind::Lecturers,
        );
        assert_eq!(batch.report.accepted, 2);

        // Someone else claims L02 between reconciliation and commit.
        Lecturers::new(&ctx.db.conn)
            .insert(&NewLecturer {
                lecturer_id: "L02".to_string(),
                name: "Other".to_string(),
                username: "other_l02".to_string(),
                email: None,
                password: ctx.codec.encode("Secret123").unwrap(),
            })
            .unwrap();

        assert!(commit(&mut ctx.db.conn, &mut batch, 2024).is_err());
        assert!(!batch.report.committed);
        assert!(Lecturers::new(&ctx.db.conn).get_by_lecturer_id("L01").unwrap().is_none());
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_lecturer_subjects_become_assignments(ctx: &mut ImportTestContext) {
        let bca = Courses::new(&ctx.db.conn).insert(&NewCourse::new("BCA", "Bachelor of Computer Applications")).unwrap();
        let bcom = Courses::new(&ctx.db.conn).insert(&NewCourse::new("BCOM", "Bachelor of Commerce")).unwrap();
        let subjects = Subjects::new(&ctx.db.conn);
        for (code, course) in [("CS101", bca), ("ENG1", bca), ("ENG1", bcom)] {
            subjects
                .insert(&NewSubject {
                    code: code.to_string(),
                    name: "Subject".to_string(),
                    course_id: course,
                    year: 1,
                    semester: 1,
                    credits: 3,
                })
                .unwrap();
        }

        let mut batch = reconcile(ctx, vec![lecturer(2, "L01", "Asha Rao", &["cs101", "ENG1", "MA9"])], ImportKind::Lecturers);
        assert_eq!(batch.report.accepted, 1);
        assert_eq!(batch.report.warnings.len(), 2);
        commit(&mut ctx.db.conn, &mut batch, 2024).unwrap();

        let lecturer = Lecturers::new(&ctx.db.conn).require("L01").unwrap();
        let assignments = Assignments::new(&ctx.db.conn).for_lecturer(lecturer.id).unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].subject_code, "CS101");
        assert_eq!(assignments[0].academic_year, 2024);
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_students_need_a_known_course_and_valid_year(ctx: &mut ImportTestContext) {
        Courses::new(&ctx.db.conn).insert(&NewCourse::new("BCA", "Bachelor of Computer Applications")).unwrap();

        let rows = vec![
            student(2, "BCA001", "bca", "II"),
            student(3, "BCA002", "BSC", "1"),
            student(4, "BCA003", "BCA", "4"),
            student(5, "BCA004", "BCA", ""),
        ];
        let mut batch = reconcile(ctx, rows, ImportKind::Students);
        let reasons: Vec<String> = batch.report.rejected.iter().map(|r| r.reason.to_string()).collect();
        assert_eq!(batch.report.accepted, 1);
        assert_eq!(reasons[0], "unknown course");
        assert_eq!(reasons[1], "invalid format");
        assert_eq!(reasons[2], "missing field: academic_year");

        commit(&mut ctx.db.conn, &mut batch, 2024).unwrap();
        let stored = Students::new(&ctx.db.conn).require("BCA001").unwrap();
        assert_eq!((stored.academic_year, stored.current_semester), (2, 3));
        assert_eq!(stored.email, None);
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_sheet_rows_flow_into_reconciler(ctx: &mut ImportTestContext) {
        let text = "Lecturer ID,Lecturer Name,Email,Subjects\nL01,Asha Rao,asha@college.edu,\n,Nameless,,\nL01,Asha Again,,\n";
        let path = ctx._temp_dir.path().join("lecturers.csv");
        std::fs::write(&path, text).unwrap();

        let rows = sheet::read_rows(&path, ImportKind::Lecturers).unwrap();
        let batch = reconcile(ctx, rows, ImportKind::Lecturers);
        assert_eq!(batch.report.total, 3);
        assert_eq!(batch.report.accepted, 1);
        assert_eq!(batch.report.rejected[0].reason.to_string(), "missing field: lecturer_id");
        assert_eq!(batch.report.rejected[1].reason.to_string(), "duplicate identifier");
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_headerless_lecturer_sheet_assigns_subject_codes(ctx: &mut ImportTestContext) {
        let course = Courses::new(&ctx.db.conn).insert(&NewCourse::new("BCA", "Bachelor of Computer Applications")).unwrap();
        Subjects::new(&ctx.db.conn)
            .insert(&NewSubject {
                code: "CS101".to_string(),
                name: "Programming in C".to_string(),
                course_id: course,
                year: 1,
                semester: 1,
                credits: 4,
            })
            .unwrap();
        let path = ctx._temp_dir.path().join("lecturers.csv");
        std::fs::write(&path, "BBHCF002,Asha Rao,CS101\n").unwrap();

        let rows = sheet::read_rows(&path, ImportKind::Lecturers).unwrap();
        let mut batch = reconcile(ctx, rows, ImportKind::Lecturers);
        assert_eq!(batch.report.accepted, 1);
        assert!(batch.report.rejected.is_empty());
        assert!(batch.report.warnings.is_empty());

        commit(&mut ctx.db.conn, &mut batch, 2024).unwrap();
        let lecturer = Lecturers::new(&ctx.db.conn).require("BBHCF002").unwrap();
        assert_eq!(lecturer.email, None);
        let assignments = Assignments::new(&ctx.db.conn).for_lecturer(lecturer.id).unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].subject_code, "CS101");
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_preview_withholds_generated_passwords(ctx: &mut ImportTestContext) {
        let batch = reconcile(ctx, vec![lecturer(2, "L01", "Asha Rao", &[]), lecturer(3, "L02", "Ravi Kumar", &[])], ImportKind::Lecturers);
        assert_eq!(batch.report.credentials.len(), 2);

        let report = batch.preview();
        assert_eq!(report.accepted, 2);
        assert!(report.credentials.is_empty());
        assert!(!report.committed);
        assert!(Lecturers::new(&ctx.db.conn).get_by_lecturer_id("L01").unwrap().is_none());
    }

    #[test_context(ImportTestContext)]
    #[test]
    fn test_students_are_not_accepted_into_inactive_courses(ctx: &mut ImportTestContext) {
        Courses::new(&ctx.db.conn).insert(&NewCourse::new("BCA", "Bachelor of Computer Applications")).unwrap();
        ctx.db.conn.execute("UPDATE courses SET is_active = 0 WHERE code = 'BCA'", []).unwrap();

        let batch = reconcile(ctx, vec![student(2, "BCA001", "BCA", "1")], ImportKind::Students);
        assert_eq!(batch.report.accepted, 0);
        assert_eq!(batch.report.rejected[0].reason.to_string(), "unknown course");
    }
}
