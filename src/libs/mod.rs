//! Core library modules for registrar.
//!
//! - **Records**: ordering rules, import reconciliation, validation
//! - **Credentials**: password generation, hashing and the recoverable codec
//! - **Academics**: grading, reports
//! - **Infrastructure**: configuration, data storage, messages, errors
//! - **Presentation**: terminal tables, file export, JSON responses
//!
//! ```rust
//! use registrar::libs::ordering::{order, OrderingRules};
//! use registrar::db::{db::Db, lecturers::Lecturers};
//!
//! let db = Db::in_memory()?;
//! let lecturers = order(Lecturers::new(&db.conn).list()?, &OrderingRules::default());
//! assert!(lecturers.is_empty());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod credentials;
pub mod data_storage;
pub mod error;
pub mod export;
pub mod grading;
pub mod import;
pub mod messages;
pub mod ordering;
pub mod report;
pub mod response;
pub mod secret;
pub mod sheet;
pub mod validate;
pub mod view;
