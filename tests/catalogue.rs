#[cfg(test)]
mod tests {
    use registrar::db::assignments::Assignments;
    use registrar::db::courses::{Courses, NewCourse};
    use registrar::db::db::Db;
    use registrar::db::enrollments::Enrollments;
    use registrar::db::students::{NewStudent, StudentFilter, Students};
    use registrar::db::subjects::{NewSubject, Subjects};
    use registrar::libs::error::{RegistrarError, StoreError, ValidationError};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct CatalogueTestContext {
        _temp_dir: TempDir,
        db: Db,
    }

    impl TestContext for CatalogueTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db = Db::open(temp_dir.path().join("registrar.db")).unwrap();
            CatalogueTestContext { _temp_dir: temp_dir, db }
        }
    }

    fn seed_course(db: &Db, code: &str) -> i64 {
        Courses::new(&db.conn).insert(&NewCourse::new(code, "Bachelor of Computer Applications")).unwrap()
    }

    fn seed_subject(db: &Db, code: &str, course_id: i64) -> i64 {
        Subjects::new(&db.conn)
            .insert(&NewSubject {
                code: code.to_string(),
                name: "Programming in C".to_string(),
                course_id,
                year: 1,
                semester: 1,
                credits: 4,
            })
            .unwrap()
    }

    fn seed_student(db: &Db, roll: &str, course_id: i64) -> i64 {
        Students::new(&db.conn)
            .insert(&NewStudent {
                roll_number: roll.to_string(),
                name: "Asha Rao".to_string(),
                course_id,
                academic_year: 1,
                current_semester: 1,
                email: None,
            })
            .unwrap()
    }

    #[test_context(CatalogueTestContext)]
    #[test]
    fn test_course_codes_are_unique_ignoring_case(ctx: &mut CatalogueTestContext) {
        seed_course(&ctx.db, "BCA");
        let err = Courses::new(&ctx.db.conn).insert(&NewCourse::new("bca", "Duplicate")).unwrap_err();
        assert!(matches!(err, RegistrarError::Validation(ValidationError::DuplicateIdentifier { .. })));
        assert_eq!(err.to_string(), "duplicate identifier");
    }

    #[test_context(CatalogueTestContext)]
    #[test]
    fn test_course_delete_is_blocked_by_dependents(ctx: &mut CatalogueTestContext) {
        let course = seed_course(&ctx.db, "BCA");
        seed_subject(&ctx.db, "CS101", course);
        seed_student(&ctx.db, "BCA001", course);

        let err = Courses::new(&ctx.db.conn).delete("BCA", false).unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::Store(StoreError::CourseInUse {
                students: 1,
                subjects: 1,
                ..
            })
        ));
        assert!(Courses::new(&ctx.db.conn).get_by_code("BCA").unwrap().is_some());
    }

    #[test_context(CatalogueTestContext)]
    #[test]
    fn test_course_cascade_removes_everything_below_it(ctx: &mut CatalogueTestContext) {
        let course = seed_course(&ctx.db, "BCA");
        let subject = seed_subject(&ctx.db, "CS101", course);
        let student = seed_student(&ctx.db, "BCA001", course);
        Enrollments::new(&ctx.db.conn).enroll(student, subject).unwrap();

        let removed = Courses::new(&ctx.db.conn).delete("bca", true).unwrap();
        assert_eq!((removed.students, removed.subjects), (1, 1));
        assert!(Courses::new(&ctx.db.conn).list().unwrap().is_empty());
        assert!(Students::new(&ctx.db.conn).list(&StudentFilter::default()).unwrap().is_empty());
        assert!(Subjects::new(&ctx.db.conn).list(None).unwrap().is_empty());
    }

    #[test_context(CatalogueTestContext)]
    #[test]
    fn test_subject_codes_resolve_per_course(ctx: &mut CatalogueTestContext) {
        let bca = seed_course(&ctx.db, "BCA");
        let bcom = seed_course(&ctx.db, "BCOM");
        seed_subject(&ctx.db, "ENG1", bca);
        seed_subject(&ctx.db, "ENG1", bcom);

        let subjects = Subjects::new(&ctx.db.conn);
        assert!(subjects.resolve("ENG1", None).is_err());
        assert_eq!(subjects.resolve("eng1", Some("bcom")).unwrap().course_id, bcom);
        assert!(subjects.resolve("ENG9", Some("BCA")).is_err());
    }

    #[test_context(CatalogueTestContext)]
    #[test]
    fn test_enrollment_reactivates_after_unenroll(ctx: &mut CatalogueTestContext) {
        let course = seed_course(&ctx.db, "BCA");
        let subject = seed_subject(&ctx.db, "CS101", course);
        let student = seed_student(&ctx.db, "BCA001", course);
        let enrollments = Enrollments::new(&ctx.db.conn);

        enrollments.enroll(student, subject).unwrap();
        assert!(enrollments.unenroll(student, subject).unwrap());
        assert!(!enrollments.unenroll(student, subject).unwrap());
        assert!(!enrollments.is_enrolled(student, subject).unwrap());

        enrollments.enroll(student, subject).unwrap();
        assert!(enrollments.is_enrolled(student, subject).unwrap());
        assert_eq!(enrollments.count_in(subject).unwrap(), 1);
    }

    #[test_context(CatalogueTestContext)]
    #[test]
    fn test_subject_delete_requires_cascade_when_in_use(ctx: &mut CatalogueTestContext) {
        let course = seed_course(&ctx.db, "BCA");
        let subject_id = seed_subject(&ctx.db, "CS101", course);
        let student = seed_student(&ctx.db, "BCA001", course);
        Enrollments::new(&ctx.db.conn).enroll(student, subject_id).unwrap();

        let subjects = Subjects::new(&ctx.db.conn);
        let subject = subjects.resolve("CS101", None).unwrap();
        assert!(subjects.delete(&subject, false).is_err());
        assert_eq!(subjects.delete(&subject, true).unwrap(), 1);
        assert!(subjects.get_by_id(subject_id).unwrap().is_none());
        assert_eq!(Assignments::new(&ctx.db.conn).active_count_for_course(course).unwrap(), 0);
    }
}
