//! String rules

use regex::Regex;
use serde_json::json;

use super::{absent, shannon_entropy, type_mismatch, RuleSet};
use crate::errors::{ConfigError, ValidationErrors, ValidationResult};
use crate::params::Params;
use crate::types::Value;

const PARAMS: &[&str] = &[
    "required",
    "min_len",
    "max_len",
    "regex",
    "only_digits",
    "only_letters",
    "no_whitespace",
    "trim_space",
    "starts_with",
    "ends_with",
    "contains",
    "not_contains",
    "one_of",
    "min_entropy",
];

/// Constraints for free-form text
///
/// `trim_space` runs first: the empty/required check and every other
/// constraint see the trimmed value.
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub required: bool,
    /// Minimum length in code points
    pub min_len: Option<usize>,
    /// Maximum length in code points
    pub max_len: Option<usize>,
    pub regex: Option<Regex>,
    pub only_digits: bool,
    pub only_letters: bool,
    pub no_whitespace: bool,
    pub trim_space: bool,
    pub starts_with: Option<String>,
    pub ends_with: Option<String>,
    /// Every substring must be present
    pub contains: Vec<String>,
    /// No substring may be present
    pub not_contains: Vec<String>,
    /// Exact allowed values
    pub one_of: Vec<String>,
    /// Minimum Shannon entropy in bits per character
    pub min_entropy: Option<f64>,
}

impl StringRules {
    pub fn from_params(params: &Params<'_>) -> Result<Self, ConfigError> {
        params.check_known(PARAMS)?;
        Ok(Self {
            required: params.flag("required")?,
            min_len: params.usize("min_len")?,
            max_len: params.usize("max_len")?,
            regex: params.regex("regex")?,
            only_digits: params.flag("only_digits")?,
            only_letters: params.flag("only_letters")?,
            no_whitespace: params.flag("no_whitespace")?,
            trim_space: params.flag("trim_space")?,
            starts_with: params.string("starts_with")?,
            ends_with: params.string("ends_with")?,
            contains: params.strings("contains")?,
            not_contains: params.strings("not_contains")?,
            one_of: params.strings("one_of")?,
            min_entropy: params.f64("min_entropy")?,
        })
    }

    fn check(&self, val: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let len = val.chars().count();

        if let Some(min) = self.min_len {
            if len < min {
                errors.add_error("min_len", min, val, "value too short");
            }
        }

        if let Some(max) = self.max_len {
            if len > max {
                errors.add_error("max_len", max, val, "value too long");
            }
        }

        if let Some(re) = &self.regex {
            if !re.is_match(val) {
                errors.add_error("regex", re.as_str(), val, "value does not match pattern");
            }
        }

        if self.only_digits && !val.chars().all(char::is_numeric) {
            errors.add_error("only_digits", true, val, "value must contain only digits");
        }

        if self.only_letters && !val.chars().all(char::is_alphabetic) {
            errors.add_error("only_letters", true, val, "value must contain only letters");
        }

        if self.no_whitespace && val.chars().any(char::is_whitespace) {
            errors.add_error("no_whitespace", true, val, "value must not contain whitespace");
        }

        if let Some(prefix) = &self.starts_with {
            if !val.starts_with(prefix.as_str()) {
                errors.add_error("starts_with", prefix.as_str(), val, "value has wrong prefix");
            }
        }

        if let Some(suffix) = &self.ends_with {
            if !val.ends_with(suffix.as_str()) {
                errors.add_error("ends_with", suffix.as_str(), val, "value has wrong suffix");
            }
        }

        let missing: Vec<&str> = self
            .contains
            .iter()
            .map(String::as_str)
            .filter(|s| !val.contains(s))
            .collect();
        if !missing.is_empty() {
            errors.add_error(
                "contains",
                json!(self.contains),
                val,
                format!("value must contain: {}", missing.join(", ")),
            );
        }

        let present: Vec<&str> = self
            .not_contains
            .iter()
            .map(String::as_str)
            .filter(|s| val.contains(s))
            .collect();
        if !present.is_empty() {
            errors.add_error(
                "not_contains",
                json!(self.not_contains),
                val,
                format!("value must not contain: {}", present.join(", ")),
            );
        }

        if !self.one_of.is_empty() && !self.one_of.iter().any(|s| s == val) {
            errors.add_error("one_of", json!(self.one_of), val, "value is not one of the allowed values");
        }

        if let Some(min) = self.min_entropy {
            if shannon_entropy(val) < min {
                errors.add_error("min_entropy", min, val, "value entropy too low");
            }
        }

        errors
    }
}

impl RuleSet for StringRules {
    fn validate(&self, value: &Value) -> ValidationResult<()> {
        let raw = match value {
            Value::Null => return absent(self.required),
            Value::String(s) => s.as_str(),
            other => return type_mismatch("string", other, "value must be a string"),
        };

        let val = if self.trim_space { raw.trim() } else { raw };
        if val.is_empty() {
            return absent(self.required);
        }

        self.check(val).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleType;
    use serde_json::{json, Map, Value as JsonValue};

    fn rules(params: JsonValue) -> StringRules {
        let map: Map<String, JsonValue> = match params {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        StringRules::from_params(&Params::new(RuleType::String, &map)).unwrap()
    }

    fn failed_rules(rules: &StringRules, value: &str) -> Vec<String> {
        match rules.validate(&Value::from(value)) {
            Ok(()) => vec![],
            Err(errors) => errors.into_iter().map(|e| e.rule).collect(),
        }
    }

    #[test]
    fn test_required() {
        let r = rules(json!({"required": true}));
        assert_eq!(failed_rules(&r, ""), vec!["required"]);
        let errors = r.validate(&Value::Null).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(r.validate(&Value::from("x")).is_ok());

        let optional = rules(json!({"min_len": 3}));
        assert!(optional.validate(&Value::Null).is_ok());
        assert!(optional.validate(&Value::from("")).is_ok());
    }

    #[test]
    fn test_type_mismatch_short_circuits() {
        let r = rules(json!({"required": true, "min_len": 3}));
        let errors = r.validate(&Value::Int(5)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].rule, "type");
    }

    #[test]
    fn test_length_counts_code_points() {
        let value = "日本語";
        assert_eq!(value.len(), 9);
        assert_eq!(failed_rules(&rules(json!({"min_len": 4})), value), vec!["min_len"]);
        assert!(failed_rules(&rules(json!({"min_len": 3})), value).is_empty());
        assert!(failed_rules(&rules(json!({"max_len": 3})), value).is_empty());
        assert_eq!(failed_rules(&rules(json!({"max_len": 2})), value), vec!["max_len"]);
    }

    #[test]
    fn test_checks_accumulate() {
        let r = rules(json!({
            "min_len": 10,
            "regex": "^[a-z]+$",
            "only_digits": true,
            "starts_with": "x",
        }));
        assert_eq!(
            failed_rules(&r, "Ab"),
            vec!["min_len", "regex", "only_digits", "starts_with"]
        );
    }

    #[test]
    fn test_character_classes() {
        assert!(failed_rules(&rules(json!({"only_digits": true})), "0123").is_empty());
        assert!(failed_rules(&rules(json!({"only_letters": true})), "héllo").is_empty());
        assert_eq!(
            failed_rules(&rules(json!({"only_letters": true})), "abc1"),
            vec!["only_letters"]
        );
        assert_eq!(
            failed_rules(&rules(json!({"no_whitespace": true})), "a b"),
            vec!["no_whitespace"]
        );
    }

    #[test]
    fn test_trim_space_runs_first() {
        let r = rules(json!({"trim_space": true, "no_whitespace": true, "max_len": 3}));
        assert!(failed_rules(&r, "  abc  ").is_empty());

        let required = rules(json!({"trim_space": true, "required": true}));
        assert_eq!(failed_rules(&required, "   "), vec!["required"]);

        let untrimmed = rules(json!({"no_whitespace": true}));
        assert_eq!(failed_rules(&untrimmed, " abc"), vec!["no_whitespace"]);
    }

    #[test]
    fn test_prefix_suffix() {
        let r = rules(json!({"starts_with": "ab", "ends_with": "yz"}));
        assert!(failed_rules(&r, "abxyz").is_empty());
        assert_eq!(failed_rules(&r, "xyz"), vec!["starts_with"]);
        assert_eq!(failed_rules(&r, "abx"), vec!["ends_with"]);
    }

    #[test]
    fn test_contains_lists_missing() {
        let r = rules(json!({"contains": ["foo", "bar", "baz"]}));
        assert!(r.validate(&Value::from("foobarbaz")).is_ok());

        let errors = r.validate(&Value::from("foo")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].message, "value must contain: bar, baz");
    }

    #[test]
    fn test_not_contains() {
        let r = rules(json!({"not_contains": ["admin", "root"]}));
        assert!(failed_rules(&r, "user").is_empty());
        assert_eq!(failed_rules(&r, "superadmin"), vec!["not_contains"]);
    }

    #[test]
    fn test_one_of() {
        let r = rules(json!({"one_of": ["red", "green"]}));
        assert!(failed_rules(&r, "red").is_empty());
        assert_eq!(failed_rules(&r, "Red"), vec!["one_of"]);
    }

    #[test]
    fn test_min_entropy() {
        let r = rules(json!({"min_entropy": 2.0}));
        assert_eq!(failed_rules(&r, "aaaa"), vec!["min_entropy"]);
        assert!(failed_rules(&r, "abcd").is_empty());
    }

    #[test]
    fn test_violation_payload() {
        let errors = rules(json!({"min_len": 5})).validate(&Value::from("abc")).unwrap_err();
        let e = &errors.errors[0];
        assert_eq!(e.field, "");
        assert_eq!(e.rule_values, json!(5));
        assert_eq!(e.provided, json!("abc"));
        assert_eq!(e.message, "value too short");
    }
}
