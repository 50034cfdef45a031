//! Field validators shared by single-record commands and the import reconciler.

use super::error::ValidationError;
use regex::Regex;
use std::sync::OnceLock;

pub const MAX_IDENTIFIER_LEN: usize = 20;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_SEMESTER: u32 = 8;

static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
static PERSON_NAME: OnceLock<Regex> = OnceLock::new();
static EMAIL: OnceLock<Regex> = OnceLock::new();

fn identifier_pattern() -> &'static Regex {
    IDENTIFIER.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern compiles"))
}

fn name_pattern() -> &'static Regex {
    PERSON_NAME.get_or_init(|| Regex::new(r"^[A-Za-z\s.\-']+$").expect("name pattern compiles"))
}

fn email_pattern() -> &'static Regex {
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"))
}

/// Trimmed, non-empty value or `missing field: <field>`.
pub fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::missing(field)),
    }
}

/// Lecturer identifiers, roll numbers, course and subject codes.
pub fn identifier(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_IDENTIFIER_LEN || !identifier_pattern().is_match(value) {
        return Err(ValidationError::format(field));
    }
    Ok(())
}

pub fn person_name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_NAME_LEN || !name_pattern().is_match(value) {
        return Err(ValidationError::format(field));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    if !email_pattern().is_match(value) {
        return Err(ValidationError::format("email"));
    }
    Ok(())
}

/// Placeholder cells that spreadsheets use for "no email".
pub fn optional_email(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if matches!(v.to_lowercase().as_str(), "none" | "na" | "n/a" | "-") => Ok(None),
        Some(v) => email(v).map(|_| Some(v.to_string())),
    }
}

/// Academic year written as digits, roman numerals or an ordinal such as `2nd`.
pub fn parse_academic_year(value: &str) -> Option<u32> {
    let text = value.trim().to_uppercase();
    let text = text.strip_prefix("YEAR").map(str::trim).unwrap_or(&text);
    match text {
        "I" => return Some(1),
        "II" => return Some(2),
        "III" => return Some(3),
        "IV" => return Some(4),
        "V" => return Some(5),
        _ => {}
    }
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    let rest = &text[digits.len()..];
    if digits.is_empty() || !matches!(rest, "" | "ST" | "ND" | "RD" | "TH") {
        return None;
    }
    digits.parse().ok().filter(|year| *year > 0)
}

pub fn academic_year(value: u32, duration_years: u32) -> Result<(), ValidationError> {
    if value == 0 || value > duration_years {
        return Err(ValidationError::format("academic_year"));
    }
    Ok(())
}

pub fn semester(value: u32) -> Result<(), ValidationError> {
    if value == 0 || value > MAX_SEMESTER {
        return Err(ValidationError::out_of_range("semester", format!("must be between 1 and {}", MAX_SEMESTER)));
    }
    Ok(())
}

pub fn marks(obtained: f64, max: f64) -> Result<(), ValidationError> {
    if !max.is_finite() || max <= 0.0 {
        return Err(ValidationError::out_of_range("max_marks", "must be greater than zero"));
    }
    if !obtained.is_finite() || obtained < 0.0 || obtained > max {
        return Err(ValidationError::out_of_range("marks", format!("must be between 0 and {}", max)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(identifier("lecturer_id", "BBHCF001").is_ok());
        assert!(identifier("lecturer_id", "L-01_a").is_ok());
        assert!(identifier("lecturer_id", "L 01").is_err());
        assert!(identifier("lecturer_id", "ABCDEFGHIJKLMNOPQRSTU").is_err());
    }

    #[test]
    fn names() {
        assert!(person_name("name", "Mary O'Neil-Smith Jr.").is_ok());
        assert!(person_name("name", "R2D2").is_err());
    }

    #[test]
    fn required_trims_and_reports_the_field() {
        assert_eq!(required("name", Some("  Asha ")).unwrap(), "Asha");
        assert_eq!(required("name", Some("   ")).unwrap_err().to_string(), "missing field: name");
        assert_eq!(required("name", None).unwrap_err().to_string(), "missing field: name");
    }

    #[test]
    fn academic_year_spellings() {
        assert_eq!(parse_academic_year("2"), Some(2));
        assert_eq!(parse_academic_year("II"), Some(2));
        assert_eq!(parse_academic_year("2nd"), Some(2));
        assert_eq!(parse_academic_year("Year 3"), Some(3));
        assert_eq!(parse_academic_year("second"), None);
        assert_eq!(parse_academic_year("0"), None);
    }

    #[test]
    fn marks_bounds() {
        assert!(marks(0.0, 50.0).is_ok());
        assert!(marks(50.0, 50.0).is_ok());
        assert!(marks(50.5, 50.0).is_err());
        assert!(marks(-1.0, 50.0).is_err());
        assert!(marks(10.0, 0.0).is_err());
    }

    #[test]
    fn placeholder_emails_are_dropped() {
        assert_eq!(optional_email(Some("N/A")).unwrap(), None);
        assert_eq!(optional_email(Some("a@b.co")).unwrap(), Some("a@b.co".to_string()));
        assert!(optional_email(Some("not-an-email")).is_err());
    }
}
