//! Percentages, letter grades and performance bands for marks and attendance.

use serde::{Deserialize, Serialize};

pub const PASSING_PERCENTAGE: f64 = 35.0;
pub const DISTINCTION_PERCENTAGE: f64 = 75.0;

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole` as a percentage, 0 when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    round2(part / whole * 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 90.0 => Grade::APlus,
            p if p >= 80.0 => Grade::A,
            p if p >= 70.0 => Grade::BPlus,
            p if p >= 60.0 => Grade::B,
            p if p >= 50.0 => Grade::CPlus,
            p if p >= 40.0 => Grade::C,
            p if p >= PASSING_PERCENTAGE => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Performance {
    Excellent,
    VeryGood,
    Good,
    Average,
    BelowAverage,
    Poor,
}

impl Performance {
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 90.0 => Performance::Excellent,
            p if p >= DISTINCTION_PERCENTAGE => Performance::VeryGood,
            p if p >= 60.0 => Performance::Good,
            p if p >= 50.0 => Performance::Average,
            p if p >= PASSING_PERCENTAGE => Performance::BelowAverage,
            _ => Performance::Poor,
        }
    }
}

impl std::fmt::Display for Performance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Performance::Excellent => "Excellent",
            Performance::VeryGood => "Very Good",
            Performance::Good => "Good",
            Performance::Average => "Average",
            Performance::BelowAverage => "Below Average",
            Performance::Poor => "Poor",
        };
        f.write_str(text)
    }
}

pub fn is_passing(percentage: f64) -> bool {
    percentage >= PASSING_PERCENTAGE
}

pub fn is_distinction(percentage: f64) -> bool {
    percentage >= DISTINCTION_PERCENTAGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_boundaries() {
        let cases = [
            (100.0, "A+"),
            (90.0, "A+"),
            (89.99, "A"),
            (80.0, "A"),
            (70.0, "B+"),
            (60.0, "B"),
            (50.0, "C+"),
            (40.0, "C"),
            (35.0, "D"),
            (34.99, "F"),
            (0.0, "F"),
        ];
        for (pct, grade) in cases {
            assert_eq!(Grade::from_percentage(pct).as_str(), grade, "{}", pct);
        }
    }

    #[test]
    fn performance_bands() {
        assert_eq!(Performance::from_percentage(92.0).to_string(), "Excellent");
        assert_eq!(Performance::from_percentage(75.0).to_string(), "Very Good");
        assert_eq!(Performance::from_percentage(61.0).to_string(), "Good");
        assert_eq!(Performance::from_percentage(50.0).to_string(), "Average");
        assert_eq!(Performance::from_percentage(35.0).to_string(), "Below Average");
        assert_eq!(Performance::from_percentage(10.0).to_string(), "Poor");
    }

    #[test]
    fn percentage_rounds_and_handles_zero() {
        assert_eq!(percentage(2.0, 3.0), 66.67);
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert!(is_passing(35.0));
        assert!(!is_distinction(74.99));
    }
}
