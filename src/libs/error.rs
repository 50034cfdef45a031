//! Error taxonomy shared by the store, the import reconciler and the codec.
//!
//! Validation and reference errors are user-facing and never fatal to a batch:
//! the reconciler records them against the offending row and moves on.
//! Codec and store errors abort the operation they occur in.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// A value failed structural or format validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(String),

    #[error("invalid format")]
    InvalidFormat { field: String },

    /// Uniqueness conflict with a persisted record or an earlier row of the batch.
    #[error("duplicate identifier")]
    DuplicateIdentifier { identifier: String },

    #[error("invalid {field}: {detail}")]
    OutOfRange { field: String, detail: String },
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self::MissingField(field.to_string())
    }

    pub fn format(field: &str) -> Self {
        Self::InvalidFormat { field: field.to_string() }
    }

    pub fn duplicate(identifier: &str) -> Self {
        Self::DuplicateIdentifier {
            identifier: identifier.to_string(),
        }
    }

    pub fn out_of_range(field: &str, detail: impl Into<String>) -> Self {
        Self::OutOfRange {
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    pub fn is_uniqueness_conflict(&self) -> bool {
        matches!(self, Self::DuplicateIdentifier { .. })
    }
}

/// A record refers to something that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("unknown course")]
    UnknownCourse { code: String },

    #[error("unknown subject")]
    UnknownSubject { code: String },

    #[error("unknown student")]
    UnknownStudent { roll_number: String },

    #[error("unknown lecturer")]
    UnknownLecturer { lecturer_id: String },
}

#[derive(Debug, Error)]
pub enum CodecError {
    /// Wrong or rotated key, or corrupted input. Never yields partial plaintext.
    #[error("stored password is unrecoverable")]
    Unrecoverable,

    #[error("encryption key is not configured; set REGISTRAR_ENCRYPTION_KEY or run `registrar init`")]
    MissingKey,

    #[error("encryption key must be 32 bytes encoded as base64")]
    InvalidKey,

    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot delete course {code}: {students} student(s) and {subjects} subject(s) still reference it")]
    CourseInUse { code: String, students: i64, subjects: i64 },

    #[error("cannot delete subject {code}: {records} dependent record(s) still reference it")]
    SubjectInUse { code: String, records: i64 },

    #[error("record not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for RegistrarError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Sqlite(err))
    }
}

pub type RegistrarResult<T> = std::result::Result<T, RegistrarError>;

/// Why the reconciler turned a row away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

impl Serialize for RejectReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_reasons_render_user_facing_text() {
        assert_eq!(RejectReason::from(ValidationError::missing("name")).to_string(), "missing field: name");
        assert_eq!(RejectReason::from(ValidationError::format("roll_number")).to_string(), "invalid format");
        assert_eq!(RejectReason::from(ValidationError::duplicate("L01")).to_string(), "duplicate identifier");
        assert_eq!(
            RejectReason::from(ReferenceError::UnknownCourse { code: "BSC".into() }).to_string(),
            "unknown course"
        );
    }

    #[test]
    fn duplicate_is_a_uniqueness_conflict() {
        assert!(ValidationError::duplicate("X").is_uniqueness_conflict());
        assert!(!ValidationError::missing("X").is_uniqueness_conflict());
    }
}
