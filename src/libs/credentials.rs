//! Login credential generation for lecturers.
//!
//! Usernames are derived from the lecturer's first name and identifier
//! (`asha_l01`); collisions get `_1`, `_2`, ... appended. Passwords are random
//! alphanumeric strings containing at least one lower-case letter, one
//! upper-case letter and one digit.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MIN_PASSWORD_LEN: usize = 8;

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PasswordPolicy {
    pub length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { length: 10 }
    }
}

impl PasswordPolicy {
    pub fn effective_length(&self) -> usize {
        self.length.max(MIN_PASSWORD_LEN)
    }
}

pub fn generate_password<R: Rng + ?Sized>(rng: &mut R, policy: &PasswordPolicy) -> String {
    let alphabet: Vec<u8> = [LOWER, UPPER, DIGITS].concat();
    let mut chars = vec![
        *LOWER.choose(rng).unwrap_or(&b'a'),
        *UPPER.choose(rng).unwrap_or(&b'A'),
        *DIGITS.choose(rng).unwrap_or(&b'0'),
    ];
    while chars.len() < policy.effective_length() {
        chars.push(alphabet[rng.gen_range(0..alphabet.len())]);
    }
    chars.shuffle(rng);
    chars.into_iter().map(char::from).collect()
}

pub fn meets_policy(password: &str, policy: &PasswordPolicy) -> bool {
    password.chars().count() >= policy.effective_length()
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

fn sanitize(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// `<first-name>_<identifier>`, lower-cased and limited to `[a-z0-9_]`.
pub fn base_username(name: &str, identifier: &str) -> String {
    let first = name.split_whitespace().next().map(sanitize).unwrap_or_default();
    let id = sanitize(identifier);
    match (first.is_empty(), id.is_empty()) {
        (true, _) => id,
        (false, true) => first,
        (false, false) => format!("{}_{}", first, id),
    }
}

/// Usernames already claimed, compared case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct UsernameRegistry {
    taken: HashSet<String>,
}

impl UsernameRegistry {
    pub fn new<I, S>(existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            taken: existing.into_iter().map(|u| u.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn is_taken(&self, username: &str) -> bool {
        self.taken.contains(&username.to_lowercase())
    }

    /// Reserves the first free name among `base`, `base_1`, `base_2`, ...
    pub fn claim(&mut self, base: &str) -> String {
        let mut candidate = base.to_lowercase();
        let mut counter = 1;
        while self.is_taken(&candidate) {
            candidate = format!("{}_{}", base.to_lowercase(), counter);
            counter += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn username_from_first_name_and_identifier() {
        assert_eq!(base_username("Asha Rao", "L01"), "asha_l01");
        assert_eq!(base_username("  Dr. Kumar ", "BBHCF-002"), "dr_bbhcf002");
        assert_eq!(base_username("", "L9"), "l9");
    }

    #[test]
    fn collisions_get_numeric_suffix() {
        let mut registry = UsernameRegistry::new(["asha_l01", "ASHA_L01_1"]);
        assert_eq!(registry.claim("asha_l01"), "asha_l01_2");
        assert_eq!(registry.claim("asha_l01"), "asha_l01_3");
        assert_eq!(registry.claim("ravi_l02"), "ravi_l02");
    }

    #[test]
    fn generated_passwords_meet_policy() {
        let mut rng = StdRng::seed_from_u64(42);
        let policy = PasswordPolicy::default();
        for _ in 0..200 {
            let password = generate_password(&mut rng, &policy);
            assert_eq!(password.len(), 10);
            assert!(meets_policy(&password, &policy));
        }
    }

    #[test]
    fn short_policies_are_raised_to_minimum() {
        let mut rng = StdRng::seed_from_u64(7);
        let password = generate_password(&mut rng, &PasswordPolicy { length: 4 });
        assert_eq!(password.len(), MIN_PASSWORD_LEN);
    }
}
