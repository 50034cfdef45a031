//! # Registrar - college records administration
//!
//! A command-line utility for managing courses, subjects, lecturers and
//! students of a college, with bulk spreadsheet import, attendance, marks,
//! reports and exports.
//!
//! - **Ordering**: lecturer and student lists in a stable, rule-driven order
//! - **Import**: batch reconciliation of sheet rows with per-row rejections
//! - **Credentials**: generated logins, hashed and recoverably encrypted
//!
//! ## Usage
//!
//! ```rust,no_run
//! use registrar::commands::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     Cli::menu()
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
