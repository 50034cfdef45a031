//! Configuration for the registrar application.
//!
//! Settings live in `config.json` inside the application data directory
//! managed by [`DataStorage`]. A missing file yields the defaults, so the
//! tool runs without any setup except for the encryption key, which must be
//! present before any lecturer credential can be created or viewed.
//!
//! ## Sections
//!
//! - **database**: optional override of the SQLite file location
//! - **encryption_key**: base64 encoded 32-byte key for recoverable passwords
//! - **attendance_threshold** / **marks_threshold**: percentages below which a
//!   student shows up in shortage and deficiency reports
//! - **password**: length policy for generated passwords
//! - **ordering**: identifier tiers and course buckets for listings
//!
//! The environment variable `REGISTRAR_ENCRYPTION_KEY` (also read from a
//! `.env` file) takes precedence over the stored key.
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use registrar::libs::config::Config;
//!
//! let config = Config::read()?;
//! let codec = config.codec()?;
//! println!("shortage below {}%", config.attendance_threshold);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::credentials::{PasswordPolicy, MIN_PASSWORD_LEN};
use super::data_storage::DataStorage;
use super::error::CodecError;
use super::ordering::OrderingRules;
use super::secret::CredentialCodec;
use crate::db::db::DB_FILE_NAME;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable holding the encryption key.
pub const ENCRYPTION_KEY_ENV: &str = "REGISTRAR_ENCRYPTION_KEY";

/// A configurable section offered by the setup wizard.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to `registrar.db` in the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Root configuration object.
///
/// Every field has a default, so older or hand-edited files missing a section
/// still load.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,

    /// Attendance percentage below which a student is short.
    pub attendance_threshold: f64,

    /// Marks percentage below which a student is deficient.
    pub marks_threshold: f64,

    pub password: PasswordPolicy,

    pub ordering: OrderingRules,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            encryption_key: None,
            attendance_threshold: 75.0,
            marks_threshold: 35.0,
            password: PasswordPolicy::default(),
            ordering: OrderingRules::default(),
        }
    }
}

impl Config {
    /// Reads the configuration from the default data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read() -> Result<Config> {
        Self::read_from(&DataStorage::new())
    }

    pub fn read_from(storage: &DataStorage) -> Result<Config> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&DataStorage::new())
    }

    pub fn save_to(&self, storage: &DataStorage) -> Result<()> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Configured database file, or `registrar.db` in the data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(DataStorage::new().get_path(DB_FILE_NAME)?),
        }
    }

    /// The key from the environment, else from the file.
    pub fn encryption_key(&self) -> Option<String> {
        env::var(ENCRYPTION_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.encryption_key.clone())
    }

    /// Builds the credential codec from the configured key.
    pub fn codec(&self) -> Result<CredentialCodec, CodecError> {
        let key = self.encryption_key().ok_or(CodecError::MissingKey)?;
        CredentialCodec::from_base64(&key)
    }

    /// Runs the interactive setup wizard, starting from the current values.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        if config.encryption_key.is_none() {
            msg_print!(Message::EncryptionKeyGenerated);
            config.encryption_key = Some(CredentialCodec::generate_key());
        } else if Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptRotateKey.to_string())
            .default(false)
            .interact()?
        {
            msg_print!(Message::EncryptionKeyRotated);
            config.encryption_key = Some(CredentialCodec::generate_key());
        }

        let modules = [
            ConfigModule {
                key: "database".to_string(),
                name: Message::ConfigModuleDatabase.to_string(),
            },
            ConfigModule {
                key: "thresholds".to_string(),
                name: Message::ConfigModuleThresholds.to_string(),
            },
            ConfigModule {
                key: "password".to_string(),
                name: Message::ConfigModulePassword.to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "database" => {
                    let default = config.database_path()?;
                    let path: String = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptDatabasePath.to_string())
                        .default(default.display().to_string())
                        .interact_text()?;
                    config.database.path = Some(PathBuf::from(path));
                }
                "thresholds" => {
                    config.attendance_threshold = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptAttendanceThreshold.to_string())
                        .default(config.attendance_threshold)
                        .validate_with(|v: &f64| if (0.0..=100.0).contains(v) { Ok(()) } else { Err("0 - 100") })
                        .interact_text()?;
                    config.marks_threshold = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptMarksThreshold.to_string())
                        .default(config.marks_threshold)
                        .validate_with(|v: &f64| if (0.0..=100.0).contains(v) { Ok(()) } else { Err("0 - 100") })
                        .interact_text()?;
                }
                "password" => {
                    config.password.length = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptPasswordLength.to_string())
                        .default(config.password.length)
                        .validate_with(|v: &usize| {
                            if *v >= MIN_PASSWORD_LEN {
                                Ok(())
                            } else {
                                Err(format!("at least {}", MIN_PASSWORD_LEN))
                            }
                        })
                        .interact_text()?;
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
