//! Turns an uploaded sheet into tagged raw rows for the import reconciler.
//!
//! Accepts comma, tab, semicolon or pipe separated text, UTF-8 (with or
//! without BOM) or Windows-1252. Columns are located by header aliases; a
//! sheet without a recognisable header row is read by fixed column position.

use super::import::{ImportKind, RawLecturerRow, RawRow, RawStudentRow};
use anyhow::Result;
use encoding_rs::WINDOWS_1252;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

const DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

const ROLL_ALIASES: &[&str] = &["roll number", "roll_number", "rollno", "roll no", "roll", "roll_no"];
const NAME_ALIASES: &[&str] = &["name", "full name", "student name", "lecturer name"];
const COURSE_ALIASES: &[&str] = &["course code", "course", "course_code", "course name", "course short code"];
const YEAR_ALIASES: &[&str] = &["academic year", "year", "year level", "class year", "academic_year"];
const CLASS_ALIASES: &[&str] = &["class", "class name", "year/class", "year & course", "class section", "class & section"];
const EMAIL_ALIASES: &[&str] = &["email", "email id", "e-mail", "email address"];
const LECTURER_ID_ALIASES: &[&str] = &["lecturer id", "lecturer_id", "lecturerid", "id", "staff id", "employee id"];
const SUBJECT_ALIASES: &[&str] = &["subjects", "subject codes", "subject_codes", "subject", "subject code"];

/// Column positions of one sheet.
#[derive(Debug, Clone, PartialEq)]
struct Columns {
    identifier: Option<usize>,
    name: Option<usize>,
    email: Option<usize>,
    course: Option<usize>,
    year: Option<usize>,
    class: Option<usize>,
    subjects: Option<usize>,
}

impl Columns {
    fn positional(kind: ImportKind) -> Self {
        match kind {
            // Headerless lecturer sheets carry no email column.
            ImportKind::Lecturers => Self {
                identifier: Some(0),
                name: Some(1),
                email: None,
                course: None,
                year: None,
                class: None,
                subjects: Some(2),
            },
            ImportKind::Students => Self {
                identifier: Some(0),
                name: Some(1),
                course: Some(2),
                year: Some(3),
                email: Some(4),
                class: None,
                subjects: None,
            },
        }
    }

    /// `None` when no cell of `header` names a known column.
    fn from_header(kind: ImportKind, header: &[String]) -> Option<Self> {
        let index: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        let find = |aliases: &[&str]| aliases.iter().find_map(|alias| index.get(*alias).copied());

        let identifier = match kind {
            ImportKind::Lecturers => find(LECTURER_ID_ALIASES),
            ImportKind::Students => find(ROLL_ALIASES),
        };
        let name = find(NAME_ALIASES);
        if identifier.is_none() && name.is_none() {
            return None;
        }

        let fallback = Self::positional(kind);
        let columns = match kind {
            ImportKind::Lecturers => Self {
                identifier: identifier.or(fallback.identifier),
                name: name.or(fallback.name),
                email: find(EMAIL_ALIASES),
                course: None,
                year: None,
                class: None,
                subjects: find(SUBJECT_ALIASES),
            },
            ImportKind::Students => {
                // Any header mentioning "class" counts as the combined class column.
                let class = find(CLASS_ALIASES).or_else(|| {
                    header
                        .iter()
                        .position(|h| h.to_lowercase().contains("class") && !YEAR_ALIASES.contains(&h.trim().to_lowercase().as_str()))
                });
                Self {
                    identifier: identifier.or(fallback.identifier),
                    name: name.or(fallback.name),
                    email: find(EMAIL_ALIASES),
                    course: find(COURSE_ALIASES),
                    year: find(YEAR_ALIASES),
                    class,
                    subjects: None,
                }
            }
        };
        Some(columns)
    }
}

/// Reads `path` and returns one raw row per non-blank data row.
pub fn read_rows(path: &Path, kind: ImportKind) -> Result<Vec<RawRow>> {
    let bytes = fs::read(path)?;
    let text = decode(&bytes);
    parse_rows(&text, kind)
}

/// UTF-8 when valid, Windows-1252 otherwise. A leading BOM is dropped.
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    DELIMITERS
        .iter()
        .copied()
        .max_by_key(|d| first_line.bytes().filter(|b| b == d).count())
        .filter(|d| first_line.as_bytes().contains(d))
        .unwrap_or(b',')
}

pub fn parse_rows(text: &str, kind: ImportKind) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(text))
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(records.len() + 1);
        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        records.push((line, cells));
    }

    let mut rows = Vec::new();
    let mut records = records.into_iter().filter(|(_, cells)| cells.iter().any(|c| !c.is_empty())).peekable();

    if records.peek().is_none() {
        return Ok(rows);
    }
    let from_header = records.peek().and_then(|(_, header)| Columns::from_header(kind, header));
    let columns = match from_header {
        Some(columns) => {
            records.next();
            columns
        }
        None => Columns::positional(kind),
    };

    for (line, cells) in records {
        rows.push(build_row(kind, &columns, line, &cells));
    }
    Ok(rows)
}

fn cell(cells: &[String], position: Option<usize>) -> Option<String> {
    position
        .and_then(|i| cells.get(i))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn build_row(kind: ImportKind, columns: &Columns, line: usize, cells: &[String]) -> RawRow {
    match kind {
        ImportKind::Lecturers => RawRow::Lecturer(RawLecturerRow {
            row: line,
            lecturer_id: cell(cells, columns.identifier),
            name: cell(cells, columns.name),
            email: cell(cells, columns.email),
            subjects: cell(cells, columns.subjects).map(|s| split_subject_codes(&s)).unwrap_or_default(),
        }),
        ImportKind::Students => {
            let roll_number = cell(cells, columns.identifier);
            let mut course_code = cell(cells, columns.course).and_then(|c| normalize_course_code(&c));
            let mut academic_year = cell(cells, columns.year);

            if course_code.is_none() || academic_year.is_none() {
                if let Some((class_course, class_year)) = cell(cells, columns.class).map(|c| parse_class(&c)) {
                    course_code = course_code.or(class_course);
                    academic_year = academic_year.or(class_year.map(|y| y.to_string()));
                }
            }
            if course_code.is_none() {
                course_code = roll_number.as_deref().and_then(roll_prefix).and_then(|p| normalize_course_code(&p));
            }

            RawRow::Student(RawStudentRow {
                row: line,
                roll_number,
                name: cell(cells, columns.name),
                course_code,
                academic_year,
                email: cell(cells, columns.email),
            })
        }
    }
}

pub fn split_subject_codes(value: &str) -> Vec<String> {
    value
        .split([',', ';', '/', '|'])
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
        .collect()
}

fn is_roman_year(token: &str) -> bool {
    matches!(token, "I" | "II" | "III")
}

fn roman_year(token: &str) -> Option<u32> {
    match token {
        "I" => Some(1),
        "II" => Some(2),
        "III" => Some(3),
        _ => None,
    }
}

/// `II_BCA_B` -> `BCA`: the longest alphabetic token that is not a roman year.
pub fn normalize_course_code(raw: &str) -> Option<String> {
    static TOKENS: OnceLock<Regex> = OnceLock::new();
    let tokens = TOKENS.get_or_init(|| Regex::new(r"[A-Za-z]+").expect("token pattern compiles"));
    let upper = raw.to_uppercase();
    let mut best: Option<&str> = None;
    for token in tokens.find_iter(&upper).map(|m| m.as_str()) {
        if is_roman_year(token) {
            continue;
        }
        if best.map_or(true, |b| token.len() > b.len()) {
            best = Some(token);
        }
    }
    best.map(str::to_string)
}

/// `II BCA B` -> (`BCA`, 2); `BCA II B` -> (`BCA`, 2); `1 BCOM A` -> (`BCOM`, 1).
pub fn parse_class(value: &str) -> (Option<String>, Option<u32>) {
    let parts: Vec<String> = value.split_whitespace().map(str::to_uppercase).collect();

    let Some(first) = parts.first().map(String::as_str) else {
        return (None, None);
    };
    if let Some(year) = roman_year(first).or_else(|| leading_year(first)) {
        return (parts.get(1).and_then(|p| letters_of(p)), Some(year));
    }

    let course = parts.iter().filter(|p| !is_roman_year(p.as_str())).find_map(|p| letters_of(p));
    let year = parts.iter().find_map(|p| roman_year(p).or_else(|| leading_year(p)));
    (course, year)
}

fn letters_of(token: &str) -> Option<String> {
    let code: String = token.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    (!code.is_empty()).then_some(code)
}

fn leading_year(token: &str) -> Option<u32> {
    token.chars().find(|c| c.is_ascii_digit()).and_then(|c| c.to_digit(10)).filter(|y| (1..=3).contains(y))
}

/// Letter prefix of a roll number, `BCA23081` -> `BCA`.
fn roll_prefix(roll: &str) -> Option<String> {
    let prefix: String = roll.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    (!prefix.is_empty()).then_some(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn students(rows: Vec<RawRow>) -> Vec<RawStudentRow> {
        rows.into_iter()
            .map(|r| match r {
                RawRow::Student(s) => s,
                RawRow::Lecturer(_) => panic!("expected student row"),
            })
            .collect()
    }

    #[test]
    fn header_aliases_map_columns() {
        let text = "Roll No,Student Name,E-mail,Course,Year\nBCA001,Asha Rao,asha@x.in,BCA,2\n";
        let rows = students(parse_rows(text, ImportKind::Students).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].roll_number.as_deref(), Some("BCA001"));
        assert_eq!(rows[0].name.as_deref(), Some("Asha Rao"));
        assert_eq!(rows[0].email.as_deref(), Some("asha@x.in"));
        assert_eq!(rows[0].course_code.as_deref(), Some("BCA"));
        assert_eq!(rows[0].academic_year.as_deref(), Some("2"));
    }

    #[test]
    fn headerless_sheet_uses_positions() {
        let text = "BCA001;Asha Rao;BCA;1;\nBCA002;Ravi;BCA;1;ravi@x.in\n";
        let rows = students(parse_rows(text, ImportKind::Students).unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 1);
        assert_eq!(rows[1].email.as_deref(), Some("ravi@x.in"));
    }

    #[test]
    fn headerless_lecturer_sheet_reads_subject_codes_third() {
        let text = "BBHCF002,Asha Rao,CS101\nLECT001,Ravi Kumar,\"CS101; MA102\"\n";
        let rows = parse_rows(text, ImportKind::Lecturers).unwrap();
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            RawRow::Lecturer(l) => {
                assert_eq!(l.row, 1);
                assert_eq!(l.lecturer_id.as_deref(), Some("BBHCF002"));
                assert_eq!(l.email, None);
                assert_eq!(l.subjects, vec!["CS101"]);
            }
            RawRow::Student(_) => panic!("expected lecturer row"),
        }
        match &rows[1] {
            RawRow::Lecturer(l) => assert_eq!(l.subjects, vec!["CS101", "MA102"]),
            RawRow::Student(_) => panic!("expected lecturer row"),
        }
    }

    #[test]
    fn class_column_supplies_course_and_year() {
        let text = "roll number\tname\tclass\nBCOM12\tMeena\tII BCOM A\n";
        let rows = students(parse_rows(text, ImportKind::Students).unwrap());
        assert_eq!(rows[0].course_code.as_deref(), Some("BCOM"));
        assert_eq!(rows[0].academic_year.as_deref(), Some("2"));
    }

    #[test]
    fn roll_prefix_is_last_resort_for_course() {
        let text = "roll,name\nBBA23081,Kiran\n";
        let rows = students(parse_rows(text, ImportKind::Students).unwrap());
        assert_eq!(rows[0].course_code.as_deref(), Some("BBA"));
        assert_eq!(rows[0].academic_year, None);
    }

    #[test]
    fn blank_rows_are_skipped_but_line_numbers_kept() {
        let text = "lecturer id,name,subjects\nL01,Asha,\"CS101, CS102\"\n,,\nL02,Ravi,\n";
        let rows = parse_rows(text, ImportKind::Lecturers).unwrap();
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            RawRow::Lecturer(l) => assert_eq!(l.subjects, vec!["CS101", "CS102"]),
            RawRow::Student(_) => panic!("expected lecturer row"),
        }
        match &rows[1] {
            RawRow::Lecturer(l) => assert_eq!(l.row, 4),
            RawRow::Student(_) => panic!("expected lecturer row"),
        }
    }

    #[test]
    fn course_code_normalisation() {
        assert_eq!(normalize_course_code("II_BCA_B").as_deref(), Some("BCA"));
        assert_eq!(normalize_course_code("bcom").as_deref(), Some("BCOM"));
        assert_eq!(normalize_course_code("III"), None);
        assert_eq!(parse_class("BCA II B"), (Some("BCA".to_string()), Some(2)));
        assert_eq!(parse_class("1 BBA"), (Some("BBA".to_string()), Some(1)));
    }

    #[test]
    fn windows_1252_fallback() {
        let bytes = b"L01,Jos\xe9\n";
        assert_eq!(decode(bytes), "L01,Jos\u{e9}\n");
        assert_eq!(decode(b"\xEF\xBB\xBFL01,A"), "L01,A");
    }
}
