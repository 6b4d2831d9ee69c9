//! Parameter coercion
//!
//! Rule parameters arrive as loosely typed JSON/YAML values. [`Params`] turns
//! them into strongly typed values for one rule, rejecting anything malformed
//! with a [`ConfigError`] naming the rule and the parameter.

use regex::Regex;
use serde_json::{Map, Value as JsonValue};

use crate::errors::ConfigError;
use crate::registry::RuleType;

/// Typed view over the raw parameter map of one rule
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    rule: RuleType,
    map: &'a Map<String, JsonValue>,
}

impl<'a> Params<'a> {
    pub fn new(rule: RuleType, map: &'a Map<String, JsonValue>) -> Self {
        Self { rule, map }
    }

    /// Rule type these parameters belong to
    pub fn rule_type(&self) -> RuleType {
        self.rule
    }

    /// Reject any parameter name not in `known`
    pub fn check_known(&self, known: &[&str]) -> Result<(), ConfigError> {
        match self.map.keys().find(|key| !known.contains(&key.as_str())) {
            Some(key) => Err(ConfigError::UnknownParameter {
                rule: self.rule,
                param: key.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Raw value; `null` counts as unset
    pub fn raw(&self, key: &str) -> Option<&'a JsonValue> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Build an invalid-parameter error for this rule
    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::invalid(self.rule, key, reason)
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.raw(key) {
            None => Ok(None),
            Some(JsonValue::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.invalid(key, "expected a boolean")),
        }
    }

    /// Boolean flag, `false` when unset
    pub fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(self.bool(key)?.unwrap_or(false))
    }

    /// Integer; accepts integral numbers in float encoding (`3.0`)
    pub fn i64(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => integral(value)
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected an integer")),
        }
    }

    /// Non-negative count
    pub fn usize(&self, key: &str) -> Result<Option<usize>, ConfigError> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => integral(value)
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected a non-negative integer")),
        }
    }

    pub fn f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.raw(key) {
            None => Ok(None),
            Some(JsonValue::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected a number")),
            Some(_) => Err(self.invalid(key, "expected a number")),
        }
    }

    pub fn string(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.raw(key) {
            None => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(key, "expected a string")),
        }
    }

    /// List of strings; a single string is a one-element list
    pub fn strings(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        match self.raw(key) {
            None => Ok(Vec::new()),
            Some(value) => to_string_list(value).map_err(|reason| self.invalid(key, reason)),
        }
    }

    /// Character set (see [`to_char_list`])
    pub fn chars(&self, key: &str) -> Result<Vec<char>, ConfigError> {
        match self.raw(key) {
            None => Ok(Vec::new()),
            Some(value) => to_char_list(value).map_err(|reason| self.invalid(key, reason)),
        }
    }

    /// Compile a regex parameter; compile failures are configuration errors
    pub fn regex(&self, key: &str) -> Result<Option<Regex>, ConfigError> {
        match self.string(key)? {
            None => Ok(None),
            Some(pattern) => Regex::new(&pattern)
                .map(Some)
                .map_err(|source| ConfigError::InvalidRegex {
                    rule: self.rule,
                    param: key.to_string(),
                    source,
                }),
        }
    }
}

// ============================================================================
// Loose conversions
// ============================================================================

/// Integer value of a number in integer or integral float encoding
fn integral(value: &JsonValue) -> Option<i64> {
    let n = match value {
        JsonValue::Number(n) => n,
        _ => return None,
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Convert a list of strings (or one string) into a string list
pub fn to_string_list(value: &JsonValue) -> Result<Vec<String>, String> {
    match value {
        JsonValue::String(s) => Ok(vec![s.clone()]),
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                JsonValue::String(s) => Ok(s.clone()),
                other => Err(format!("unsupported value at index {}: {}", i, other)),
            })
            .collect(),
        other => Err(format!("expected a list of strings, got {}", other)),
    }
}

/// Convert a loosely encoded character set into characters.
///
/// Accepts a list of single-character strings, a list of integers taken as
/// code points, a mix of both, or a plain string exploded into its characters.
pub fn to_char_list(value: &JsonValue) -> Result<Vec<char>, String> {
    match value {
        JsonValue::String(s) => Ok(s.chars().collect()),
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                JsonValue::String(s) => {
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Ok(c),
                        _ => Err(format!(
                            "string at index {} must contain exactly one character: {:?}",
                            i, s
                        )),
                    }
                }
                JsonValue::Number(n) => n
                    .as_u64()
                    .and_then(|code| u32::try_from(code).ok())
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid code point at index {}: {}", i, n)),
                other => Err(format!("unsupported value at index {}: {}", i, other)),
            })
            .collect(),
        other => Err(format!("expected a character list, got {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_integers_accept_float_encoding() {
        let m = map(json!({"a": 3, "b": 4.0, "c": 4.5, "d": -1, "e": "7"}));
        let p = Params::new(RuleType::String, &m);
        assert_eq!(p.usize("a").unwrap(), Some(3));
        assert_eq!(p.usize("b").unwrap(), Some(4));
        assert!(p.usize("c").is_err());
        assert!(p.usize("d").is_err());
        assert_eq!(p.i64("d").unwrap(), Some(-1));
        assert!(p.i64("e").is_err());
        assert_eq!(p.usize("missing").unwrap(), None);
    }

    #[test]
    fn test_null_means_unset() {
        let m = map(json!({"min_len": null}));
        let p = Params::new(RuleType::String, &m);
        assert_eq!(p.usize("min_len").unwrap(), None);
        assert!(p.check_known(&["min_len"]).is_ok());
    }

    #[test]
    fn test_unknown_parameter() {
        let m = map(json!({"min_len": 1, "max_lenght": 3}));
        let p = Params::new(RuleType::String, &m);
        let err = p.check_known(&["min_len", "max_len"]).unwrap_err();
        assert_eq!(err.to_string(), "string rule: unknown parameter 'max_lenght'");
    }

    #[test]
    fn test_char_lists() {
        assert_eq!(to_char_list(&json!(["!", "@"])).unwrap(), vec!['!', '@']);
        assert_eq!(to_char_list(&json!([33, 64])).unwrap(), vec!['!', '@']);
        assert_eq!(to_char_list(&json!("!@#")).unwrap(), vec!['!', '@', '#']);
        assert_eq!(to_char_list(&json!(["!", 64])).unwrap(), vec!['!', '@']);
        assert!(to_char_list(&json!(["ab"])).is_err());
        assert!(to_char_list(&json!([0xD800])).is_err());
        assert!(to_char_list(&json!(true)).is_err());
    }

    #[test]
    fn test_string_lists() {
        assert_eq!(to_string_list(&json!(["a", "b"])).unwrap(), vec!["a", "b"]);
        assert_eq!(to_string_list(&json!("a")).unwrap(), vec!["a"]);
        assert!(to_string_list(&json!([1])).is_err());
    }

    #[test]
    fn test_regex_errors_are_config_errors() {
        let m = map(json!({"regex": "[unclosed"}));
        let p = Params::new(RuleType::String, &m);
        assert!(matches!(p.regex("regex"), Err(ConfigError::InvalidRegex { .. })));
    }
}
