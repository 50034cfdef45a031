#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use registrar::db::db::Db;
    use registrar::db::lecturers::{Lecturers, NewLecturer};
    use registrar::db::management::Management;
    use registrar::libs::credentials::{generate_password, meets_policy, PasswordPolicy};
    use registrar::libs::error::CodecError;
    use registrar::libs::secret::{hash_password, verify_password, CredentialCodec};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct CredentialsTestContext {
        _temp_dir: TempDir,
        db: Db,
        codec: CredentialCodec,
    }

    impl TestContext for CredentialsTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db = Db::open(temp_dir.path().join("registrar.db")).unwrap();
            CredentialsTestContext {
                _temp_dir: temp_dir,
                db,
                codec: CredentialCodec::from_base64(&CredentialCodec::generate_key()).unwrap(),
            }
        }
    }

    fn seed_lecturer(ctx: &CredentialsTestContext, password: &str) -> i64 {
        Lecturers::new(&ctx.db.conn)
            .insert(&NewLecturer {
                lecturer_id: "L01".to_string(),
                name: "Asha Rao".to_string(),
                username: "asha_l01".to_string(),
                email: Some("asha@college.edu".to_string()),
                password: ctx.codec.encode(password).unwrap(),
            })
            .unwrap()
    }

    #[test_context(CredentialsTestContext)]
    #[test]
    fn test_reset_replaces_both_stored_forms(ctx: &mut CredentialsTestContext) {
        let id = seed_lecturer(ctx, "FirstPass1");
        let mut rng = StdRng::seed_from_u64(3);
        let fresh = generate_password(&mut rng, &PasswordPolicy::default());
        assert!(meets_policy(&fresh, &PasswordPolicy::default()));

        let lecturers = Lecturers::new(&ctx.db.conn);
        lecturers.update_password(id, &ctx.codec.encode(&fresh).unwrap()).unwrap();

        let stored = lecturers.require("L01").unwrap();
        assert!(verify_password(&fresh, &stored.password_hash));
        assert!(!verify_password("FirstPass1", &stored.password_hash));
        assert_eq!(ctx.codec.decode(&stored.password_encrypted).unwrap(), fresh);
    }

    #[test_context(CredentialsTestContext)]
    #[test]
    fn test_rotated_key_loses_recoverable_copy_only(ctx: &mut CredentialsTestContext) {
        seed_lecturer(ctx, "FirstPass1");
        let stored = Lecturers::new(&ctx.db.conn).require("L01").unwrap();

        let rotated = CredentialCodec::from_base64(&CredentialCodec::generate_key()).unwrap();
        assert!(matches!(rotated.decode(&stored.password_encrypted), Err(CodecError::Unrecoverable)));
        assert!(rotated.verify("FirstPass1", &stored.password_hash));
    }

    #[test_context(CredentialsTestContext)]
    #[test]
    fn test_serialized_lecturer_omits_credentials(ctx: &mut CredentialsTestContext) {
        seed_lecturer(ctx, "FirstPass1");
        let stored = Lecturers::new(&ctx.db.conn).require("L01").unwrap();

        let json = serde_json::to_value(&stored).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_encrypted").is_none());
        assert_eq!(json["username"], "asha_l01");
    }

    #[test_context(CredentialsTestContext)]
    #[test]
    fn test_admin_accounts_store_only_a_hash(ctx: &mut CredentialsTestContext) {
        let management = Management::new(&ctx.db.conn);
        let id = management.create("registrar", &hash_password("Admin1234").unwrap()).unwrap();
        assert!(management.create("REGISTRAR", &hash_password("Other1234").unwrap()).is_err());

        let admin = management.get_by_username("Registrar").unwrap().unwrap();
        assert_eq!(admin.id, id);
        assert_ne!(admin.password_hash, "Admin1234");
        assert!(verify_password("Admin1234", &admin.password_hash));
        assert!(admin.last_login.is_none());

        management.touch_login(id).unwrap();
        assert!(management.get_by_username("registrar").unwrap().unwrap().last_login.is_some());
    }
}
