#[cfg(test)]
mod tests {
    use registrar::libs::config::{Config, DatabaseConfig, CONFIG_FILE_NAME, ENCRYPTION_KEY_ENV};
    use registrar::libs::credentials::PasswordPolicy;
    use registrar::libs::data_storage::DataStorage;
    use registrar::libs::error::CodecError;
    use registrar::libs::secret::CredentialCodec;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct ConfigTestContext {
        _temp_dir: TempDir,
        storage: DataStorage,
    }

    impl TestContext for ConfigTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let storage = DataStorage::with_base(temp_dir.path().join("registrar"));
            ConfigTestContext {
                _temp_dir: temp_dir,
                storage,
            }
        }
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_missing_file_yields_defaults(ctx: &mut ConfigTestContext) {
        let config = Config::read_from(&ctx.storage).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.attendance_threshold, 75.0);
        assert_eq!(config.marks_threshold, 35.0);
        assert!(config.encryption_key.is_none());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_save_and_read_round_trip(ctx: &mut ConfigTestContext) {
        let config = Config {
            database: DatabaseConfig {
                path: Some(ctx._temp_dir.path().join("college.db")),
            },
            encryption_key: Some(CredentialCodec::generate_key()),
            attendance_threshold: 80.0,
            marks_threshold: 40.0,
            password: PasswordPolicy { length: 12 },
            ..Config::default()
        };
        config.save_to(&ctx.storage).unwrap();

        let read = Config::read_from(&ctx.storage).unwrap();
        assert_eq!(read, config);
        assert_eq!(read.database_path().unwrap(), ctx._temp_dir.path().join("college.db"));
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_partial_file_fills_missing_sections(ctx: &mut ConfigTestContext) {
        let path = ctx.storage.get_path(CONFIG_FILE_NAME).unwrap();
        std::fs::write(path, r#"{ "attendance_threshold": 60.0 }"#).unwrap();

        let config = Config::read_from(&ctx.storage).unwrap();
        assert_eq!(config.attendance_threshold, 60.0);
        assert_eq!(config.marks_threshold, 35.0);
        assert_eq!(config.ordering, Config::default().ordering);
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_malformed_file_is_an_error(ctx: &mut ConfigTestContext) {
        let path = ctx.storage.get_path(CONFIG_FILE_NAME).unwrap();
        std::fs::write(path, "{ not json").unwrap();
        assert!(Config::read_from(&ctx.storage).is_err());
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_stored_key_builds_a_working_codec(ctx: &mut ConfigTestContext) {
        if std::env::var(ENCRYPTION_KEY_ENV).is_ok() {
            return;
        }
        let config = Config {
            encryption_key: Some(CredentialCodec::generate_key()),
            ..Config::default()
        };
        config.save_to(&ctx.storage).unwrap();

        let codec = Config::read_from(&ctx.storage).unwrap().codec().unwrap();
        let encrypted = codec.encrypt("Secret123").unwrap();
        assert_eq!(codec.decode(&encrypted).unwrap(), "Secret123");
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_malformed_key_is_rejected(_ctx: &mut ConfigTestContext) {
        if std::env::var(ENCRYPTION_KEY_ENV).is_ok() {
            return;
        }
        let config = Config {
            encryption_key: Some("too-short".to_string()),
            ..Config::default()
        };
        assert!(matches!(config.codec(), Err(CodecError::InvalidKey)));
    }
}
