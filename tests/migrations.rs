#[cfg(test)]
mod tests {
    use registrar::db::db::Db;
    use registrar::db::migrations::{get_db_version, needs_migration, MigrationManager};
    use std::path::PathBuf;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct MigrationTestContext {
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl TestContext for MigrationTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db_path = temp_dir.path().join("registrar.db");
            MigrationTestContext {
                _temp_dir: temp_dir,
                db_path,
            }
        }
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_opening_applies_every_migration(ctx: &mut MigrationTestContext) {
        let db = Db::open(&ctx.db_path).unwrap();

        assert!(get_db_version(&db.conn).unwrap() > 0);
        assert!(!needs_migration(&db.conn).unwrap());
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_fresh_file_needs_migration(ctx: &mut MigrationTestContext) {
        let conn = Db::new_without_migrations(&ctx.db_path).unwrap();

        assert_eq!(get_db_version(&conn).unwrap(), 0);
        assert!(needs_migration(&conn).unwrap());
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_history_is_recorded_in_order(ctx: &mut MigrationTestContext) {
        let mut conn = Db::new_without_migrations(&ctx.db_path).unwrap();
        let manager = MigrationManager::new();
        manager.run_migrations(&mut conn).unwrap();

        let history = manager.get_migration_history(&conn).unwrap();
        assert!(!history.is_empty());
        for (i, (version, name, _)) in history.iter().enumerate() {
            assert_eq!(*version as usize, i + 1);
            assert!(!name.is_empty());
        }
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_migrations_are_idempotent(ctx: &mut MigrationTestContext) {
        let mut conn = Db::new_without_migrations(&ctx.db_path).unwrap();
        let manager = MigrationManager::new();

        manager.run_migrations(&mut conn).unwrap();
        let first = get_db_version(&conn).unwrap();
        manager.run_migrations(&mut conn).unwrap();

        assert_eq!(get_db_version(&conn).unwrap(), first);
        assert_eq!(manager.get_migration_history(&conn).unwrap().len() as u32, first);
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_reopening_keeps_data(ctx: &mut MigrationTestContext) {
        {
            let db = Db::open(&ctx.db_path).unwrap();
            db.conn.execute("INSERT INTO courses (code, name) VALUES ('BCA', 'Computer Applications')", []).unwrap();
        }
        let db = Db::open(&ctx.db_path).unwrap();
        let count: i64 = db.conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 1);
    }
}
