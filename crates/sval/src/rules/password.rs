//! Password rules

use serde_json::json;

use super::{absent, shannon_entropy, type_mismatch, RuleSet};
use crate::errors::{ConfigError, ValidationErrors, ValidationResult};
use crate::params::Params;
use crate::types::Value;

const PARAMS: &[&str] = &[
    "required",
    "min_len",
    "max_len",
    "min_upper",
    "min_lower",
    "min_numbers",
    "min_special",
    "special_chars",
    "allowed_chars",
    "disallowed_chars",
    "max_repeat_run",
    "blacklist",
    "min_entropy",
    "detect_linear_patterns",
];

/// Canonical keyboard and alphabet sequences
const LINEAR_SEQUENCES: [&str; 4] = [
    "abcdefghijklmnopqrstuvwxyz",
    "qwertyuiopasdfghjklzxcvbnm",
    "1234567890",
    "0987654321",
];

/// Shortest run that counts as a linear pattern
const LINEAR_RUN: usize = 4;

/// Punctuation or symbol
fn is_special(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control()
}

/// Constraints for passwords
///
/// Checks run in a fixed order. Everything up to the linear pattern check
/// accumulates; `max_repeat_run`, `blacklist` and `min_entropy` stop at the
/// first failure.
#[derive(Debug, Clone, Default)]
pub struct PasswordRules {
    pub required: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub min_upper: Option<usize>,
    pub min_lower: Option<usize>,
    pub min_numbers: Option<usize>,
    pub min_special: Option<usize>,
    /// Allowed special characters; empty allows all
    pub special_chars: Vec<char>,
    /// Every character must be in this set; empty allows all
    pub allowed_chars: Vec<char>,
    pub disallowed_chars: Vec<char>,
    pub max_repeat_run: Option<usize>,
    pub blacklist: Vec<String>,
    pub min_entropy: Option<f64>,
    pub detect_linear_patterns: bool,
}

impl PasswordRules {
    pub fn from_params(params: &Params<'_>) -> Result<Self, ConfigError> {
        params.check_known(PARAMS)?;
        Ok(Self {
            required: params.flag("required")?,
            min_len: params.usize("min_len")?,
            max_len: params.usize("max_len")?,
            min_upper: params.usize("min_upper")?,
            min_lower: params.usize("min_lower")?,
            min_numbers: params.usize("min_numbers")?,
            min_special: params.usize("min_special")?,
            special_chars: params.chars("special_chars")?,
            allowed_chars: params.chars("allowed_chars")?,
            disallowed_chars: params.chars("disallowed_chars")?,
            max_repeat_run: params.usize("max_repeat_run")?,
            blacklist: params.strings("blacklist")?,
            min_entropy: params.f64("min_entropy")?,
            detect_linear_patterns: params.flag("detect_linear_patterns")?,
        })
    }

    fn check(&self, val: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let len = val.chars().count();

        if let Some(min) = self.min_len {
            if len < min {
                errors.add_error("min_len", min, val, "password too short");
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                errors.add_error("max_len", max, val, "password too long");
            }
        }

        let (mut upper, mut lower, mut numbers, mut special) = (0usize, 0usize, 0usize, 0usize);
        for c in val.chars() {
            if c.is_uppercase() {
                upper += 1;
            }
            if c.is_lowercase() {
                lower += 1;
            }
            if c.is_numeric() {
                numbers += 1;
            }
            if is_special(c) {
                if !self.special_chars.is_empty() && !self.special_chars.contains(&c) {
                    errors.add_error(
                        "special_chars",
                        json!(self.special_chars),
                        c.to_string(),
                        format!("special character '{}' is not allowed", c),
                    );
                } else {
                    special += 1;
                }
            }
            if !self.allowed_chars.is_empty() && !self.allowed_chars.contains(&c) {
                errors.add_error(
                    "allowed_chars",
                    json!(self.allowed_chars),
                    c.to_string(),
                    format!("character '{}' is not allowed", c),
                );
            }
            if self.disallowed_chars.contains(&c) {
                errors.add_error(
                    "disallowed_chars",
                    json!(self.disallowed_chars),
                    c.to_string(),
                    format!("character '{}' is not allowed", c),
                );
            }
        }

        let minimums = [
            ("min_upper", self.min_upper, upper, "not enough uppercase characters"),
            ("min_lower", self.min_lower, lower, "not enough lowercase characters"),
            ("min_numbers", self.min_numbers, numbers, "not enough digits"),
            ("min_special", self.min_special, special, "not enough special characters"),
        ];
        for (rule, min, count, message) in minimums {
            if let Some(min) = min {
                if count < min {
                    errors.add_error(rule, min, count, message);
                }
            }
        }

        if self.detect_linear_patterns {
            if let Some(pattern) = find_linear_pattern(val) {
                errors.add_error(
                    "detect_linear_patterns",
                    true,
                    pattern,
                    format!("password contains the sequence '{}'", pattern),
                );
            }
        }

        if let Some(max) = self.max_repeat_run {
            if longest_run(val) > max {
                errors.add_error("max_repeat_run", max, val, "too many repeated characters");
                return errors;
            }
        }

        if self.blacklist.iter().any(|b| b == val) {
            errors.add_error("blacklist", json!(self.blacklist), val, "password is too common");
            return errors;
        }

        if let Some(min) = self.min_entropy {
            if shannon_entropy(val) < min {
                errors.add_error("min_entropy", min, val, "password entropy too low");
                return errors;
            }
        }

        errors
    }
}

impl RuleSet for PasswordRules {
    fn validate(&self, value: &Value) -> ValidationResult<()> {
        match value {
            Value::Null => absent(self.required),
            Value::String(s) if s.is_empty() => absent(self.required),
            Value::String(s) => self.check(s).into_result(),
            other => type_mismatch("string", other, "value must be a string"),
        }
    }
}

/// Longest run of one identical character
fn longest_run(val: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut prev = None;
    for c in val.chars() {
        if Some(c) == prev {
            current += 1;
        } else {
            current = 1;
            prev = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}

/// First linear run found in the lower-cased password
fn find_linear_pattern(val: &str) -> Option<&'static str> {
    let lowered = val.to_lowercase();
    LINEAR_SEQUENCES.into_iter().find_map(|seq| {
        (0..=seq.len() - LINEAR_RUN)
            .map(|i| &seq[i..i + LINEAR_RUN])
            .find(|window| lowered.contains(window))
    })
}
