//! Deterministic display ordering for lecturer and student listings.
//!
//! Ordering is a pure function of the records and the [`OrderingRules`]:
//! every listing recomputes its sort keys, nothing is cached or persisted.
//! Lecturers are ranked into identifier tiers, students into course buckets;
//! inside a tier or bucket records sort by the numeric value of their trailing
//! digits, then by identifier text. The sort is stable, so records whose keys
//! are exactly equal keep their input order, and ordering an already ordered
//! sequence leaves it unchanged.
//!
//! ```rust
//! use registrar::libs::ordering::{order, OrderingRules};
//!
//! let rules = OrderingRules::default();
//! let ids = vec!["BBHCF002", "BBHCF001", "BBHCFN001", "LECT001"];
//! let ordered = order(ids, &rules);
//! assert_eq!(ordered, vec!["BBHCF001", "BBHCFN001", "BBHCF002", "LECT001"]);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ranking rules. Defaults reproduce the institution's historical convention.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderingRules {
    /// Reserved identifier that always sorts first.
    pub primary_id: String,
    /// Prefix of the second tier, followed by digits only.
    pub secondary_prefix: String,
    /// Accepted digit counts after `secondary_prefix`.
    pub secondary_widths: Vec<usize>,
    /// Broader family prefix forming the third tier.
    pub family_prefix: String,
    /// Course-name patterns, highest priority first.
    pub course_priority: Vec<String>,
}

impl Default for OrderingRules {
    fn default() -> Self {
        Self {
            primary_id: "BBHCF001".to_string(),
            secondary_prefix: "BBHCFN".to_string(),
            secondary_widths: vec![2, 3],
            family_prefix: "BBHCF".to_string(),
            course_priority: vec!["I BCA".to_string(), "BCA".to_string(), "BCOM".to_string(), "BBA".to_string()],
        }
    }
}

/// Lecturer identifier tier, lowest value sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IdentifierTier {
    Primary,
    SecondaryFamily,
    PrimaryFamily,
    Other,
}

/// Student course bucket. `Other` always ranks after every configured pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CourseBucket {
    Ranked(usize),
    Other,
}

/// Decimal value of a digit string, compared without parsing so long
/// suffixes cannot overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericSuffix(String);

impl NumericSuffix {
    /// Trailing ASCII digits of `value`, if any.
    pub fn trailing(value: &str) -> Option<Self> {
        let digits_start = value.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let digits = &value[digits_start..];
        if digits.is_empty() {
            return None;
        }
        let significant = digits.trim_start_matches('0');
        Some(Self(significant.to_string()))
    }
}

impl Ord for NumericSuffix {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.len().cmp(&other.0.len()).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NumericSuffix {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numeric suffixes first in ascending order, then records without one.
fn cmp_suffix(a: &Option<NumericSuffix>, b: &Option<NumericSuffix>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Derived, display-only key. Never part of a record's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    rank: usize,
    suffix: Option<NumericSuffix>,
    folded: String,
    raw: String,
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| cmp_suffix(&self.suffix, &other.suffix))
            .then_with(|| self.folded.cmp(&other.folded))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl OrderingRules {
    pub fn lecturer_tier(&self, identifier: &str) -> IdentifierTier {
        let id = identifier.trim().to_uppercase();
        let primary = self.primary_id.to_uppercase();
        let secondary = self.secondary_prefix.to_uppercase();
        let family = self.family_prefix.to_uppercase();

        if !primary.is_empty() && id == primary {
            return IdentifierTier::Primary;
        }
        if !secondary.is_empty() {
            if let Some(rest) = id.strip_prefix(&secondary) {
                if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) && self.secondary_widths.contains(&rest.len()) {
                    return IdentifierTier::SecondaryFamily;
                }
            }
        }
        if !family.is_empty() && id.starts_with(&family) {
            return IdentifierTier::PrimaryFamily;
        }
        IdentifierTier::Other
    }

    pub fn course_bucket(&self, course_name: &str) -> CourseBucket {
        let name = course_name.to_uppercase();
        self.course_priority
            .iter()
            .position(|pattern| contains_at_word_start(&name, &pattern.to_uppercase()))
            .map(CourseBucket::Ranked)
            .unwrap_or(CourseBucket::Other)
    }

    pub fn lecturer_key(&self, identifier: &str) -> SortKey {
        let tier = self.lecturer_tier(identifier);
        // The last tier is purely lexicographic.
        let suffix = match tier {
            IdentifierTier::Other => None,
            _ => NumericSuffix::trailing(identifier.trim()),
        };
        SortKey {
            rank: tier as usize,
            suffix,
            folded: identifier.trim().to_uppercase(),
            raw: identifier.to_string(),
        }
    }

    pub fn student_key(&self, course_name: &str, roll_number: &str) -> SortKey {
        let rank = match self.course_bucket(course_name) {
            CourseBucket::Ranked(position) => position,
            CourseBucket::Other => self.course_priority.len(),
        };
        SortKey {
            rank,
            suffix: NumericSuffix::trailing(roll_number.trim()),
            folded: roll_number.trim().to_uppercase(),
            raw: roll_number.to_string(),
        }
    }
}

/// `needle` occurs in `haystack` starting at a word boundary, so `I BCA`
/// matches `I BCA B` but not `II BCA B`.
fn contains_at_word_start(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(index, _)| {
        haystack[..index]
            .chars()
            .next_back()
            .map_or(true, |previous| !previous.is_alphanumeric())
    })
}

/// Anything that can be placed in a display listing.
pub trait Ranked {
    fn sort_key(&self, rules: &OrderingRules) -> SortKey;
}

impl Ranked for &str {
    fn sort_key(&self, rules: &OrderingRules) -> SortKey {
        rules.lecturer_key(self)
    }
}

impl Ranked for String {
    fn sort_key(&self, rules: &OrderingRules) -> SortKey {
        rules.lecturer_key(self)
    }
}

/// Orders `records` for display. Stable, deterministic and idempotent.
pub fn order<T: Ranked>(records: impl IntoIterator<Item = T>, rules: &OrderingRules) -> Vec<T> {
    let mut keyed: Vec<(SortKey, T)> = records.into_iter().map(|record| (record.sort_key(rules), record)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, record)| record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        course: &'static str,
        roll: &'static str,
    }

    impl Ranked for Row {
        fn sort_key(&self, rules: &OrderingRules) -> SortKey {
            rules.student_key(self.course, self.roll)
        }
    }

    fn rolls(rows: Vec<Row>) -> Vec<&'static str> {
        rows.into_iter().map(|r| r.roll).collect()
    }

    #[test]
    fn lecturer_tiers_follow_institution_convention() {
        let rules = OrderingRules::default();
        let ordered = order(vec!["BBHCF002", "BBHCF001", "BBHCFN001", "LECT001"], &rules);
        assert_eq!(ordered, vec!["BBHCF001", "BBHCFN001", "BBHCF002", "LECT001"]);
    }

    #[test]
    fn secondary_family_accepts_both_widths_and_sorts_numerically() {
        let rules = OrderingRules::default();
        assert_eq!(rules.lecturer_tier("BBHCFN01"), IdentifierTier::SecondaryFamily);
        assert_eq!(rules.lecturer_tier("bbhcfn010"), IdentifierTier::SecondaryFamily);
        assert_eq!(rules.lecturer_tier("BBHCFN0001"), IdentifierTier::PrimaryFamily);
        assert_eq!(rules.lecturer_tier("BBHCFNX1"), IdentifierTier::PrimaryFamily);

        let ordered = order(vec!["BBHCFN010", "BBHCFN02", "BBHCFN001"], &rules);
        assert_eq!(ordered, vec!["BBHCFN001", "BBHCFN02", "BBHCFN010"]);
    }

    #[test]
    fn family_tier_orders_by_numeric_suffix_not_text() {
        let rules = OrderingRules::default();
        let ordered = order(vec!["BBHCF10", "BBHCF9", "BBHCF-X", "BBHCF002"], &rules);
        assert_eq!(ordered, vec!["BBHCF002", "BBHCF9", "BBHCF10", "BBHCF-X"]);
    }

    #[test]
    fn malformed_identifiers_fall_to_last_tier() {
        let rules = OrderingRules::default();
        let ordered = order(vec!["", "zz", "  ", "BBHCF001", "A-9"], &rules);
        assert_eq!(ordered[0], "BBHCF001");
        assert_eq!(&ordered[1..], &["", "  ", "A-9", "zz"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let rules = OrderingRules::default();
        let ordered: Vec<&str> = order(Vec::<&str>::new(), &rules);
        assert!(ordered.is_empty());
    }

    #[test]
    fn ordering_is_idempotent() {
        let rules = OrderingRules::default();
        let input = vec!["X9", "BBHCF3", "BBHCFN02", "BBHCF001", "a1", "A1", "BBHCF3"];
        let once = order(input, &rules);
        let twice = order(once.clone(), &rules);
        assert_eq!(once, twice);
    }

    #[test]
    fn huge_suffixes_do_not_overflow() {
        let rules = OrderingRules::default();
        let ordered = order(vec!["BBHCF99999999999999999999999", "BBHCF100000000000000000000000"], &rules);
        assert_eq!(ordered, vec!["BBHCF99999999999999999999999", "BBHCF100000000000000000000000"]);
    }

    #[test]
    fn student_buckets_then_roll_numbers() {
        let rules = OrderingRules::default();
        let rows = vec![
            Row { course: "BCOM", roll: "BCOM001" },
            Row { course: "BCA", roll: "BCA002" },
            Row { course: "BCA", roll: "BCA001" },
            Row { course: "I BCA B", roll: "BCA900" },
        ];
        assert_eq!(rolls(order(rows, &rules)), vec!["BCA900", "BCA001", "BCA002", "BCOM001"]);
    }

    #[test]
    fn second_year_course_is_not_mistaken_for_first_year_variant() {
        let rules = OrderingRules::default();
        assert_eq!(rules.course_bucket("I BCA B"), CourseBucket::Ranked(0));
        assert_eq!(rules.course_bucket("II BCA B"), CourseBucket::Ranked(1));
        assert_eq!(rules.course_bucket("Bachelor of Arts"), CourseBucket::Other);
        assert!(CourseBucket::Ranked(usize::MAX) < CourseBucket::Other);
    }

    #[test]
    fn non_numeric_rolls_sort_after_numeric_ones_within_bucket() {
        let rules = OrderingRules::default();
        let rows = vec![
            Row { course: "BBA", roll: "BBA-X" },
            Row { course: "BBA", roll: "BBA10" },
            Row { course: "History", roll: "H1" },
            Row { course: "BBA", roll: "BBA2" },
        ];
        assert_eq!(rolls(order(rows, &rules)), vec!["BBA2", "BBA10", "BBA-X", "H1"]);
    }

    #[test]
    fn exactly_equal_keys_keep_input_order() {
        let rules = OrderingRules::default();
        let rows = vec![Row { course: "BCA", roll: "BCA1" }, Row { course: "BCA Evening", roll: "BCA1" }];
        let ordered = order(rows, &rules);
        assert_eq!(ordered[0].course, "BCA");
        assert_eq!(ordered[1].course, "BCA Evening");
    }
}
