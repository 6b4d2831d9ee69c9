//! Validation error types
//!
//! Two error families live here:
//! - [`ValidationErrors`]: per-call data describing every rule violation found
//!   in a value, qualified with the field path it was found at.
//! - [`ConfigError`]: failures while turning a rule configuration into a
//!   [`Validator`](crate::Validator).

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::registry::RuleType;

/// Message used for every `required` violation
pub const FIELD_IS_REQUIRED: &str = "field is required";

// ============================================================================
// Validation Result
// ============================================================================

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationErrors>;

// ============================================================================
// Validation Errors Collection
// ============================================================================

/// Collection of rule violations
///
/// Violations are kept in the order they were found: field traversal order
/// first, then the order in which a rule runs its checks. Nothing is ever
/// deduplicated or dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors {
    /// List of individual violations
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the number of errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Add a ready-made violation
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record one violation with an empty field path.
    ///
    /// The field is filled in by [`add_context`](Self::add_context) as the
    /// error travels back up the data tree.
    pub fn add_error(
        &mut self,
        rule: impl Into<String>,
        rule_values: impl Into<JsonValue>,
        provided: impl Into<JsonValue>,
        message: impl Into<String>,
    ) {
        self.errors.push(ValidationError::new(
            rule,
            rule_values,
            provided,
            message,
        ));
    }

    /// Append every violation of `other`, preserving order
    pub fn append(&mut self, other: ValidationErrors) {
        if other.is_empty() {
            return;
        }
        self.errors.extend(other.errors);
    }

    /// Alias of [`append`](Self::append)
    pub fn merge(&mut self, other: ValidationErrors) {
        self.append(other);
    }

    /// Append the violations carried by a rule result (no-op for `Ok`)
    pub fn append_result(&mut self, result: ValidationResult<()>) {
        if let Err(other) = result {
            self.append(other);
        }
    }

    /// Prefix every violation's field with `prefix`.
    ///
    /// An index segment (`[3]...`) is glued directly to the prefix, a named
    /// segment is joined with `.`.
    pub fn add_context(&mut self, prefix: &str) {
        if prefix.is_empty() {
            return;
        }
        for error in &mut self.errors {
            error.field = if error.field.is_empty() {
                prefix.to_string()
            } else if error.field.starts_with('[') {
                format!("{}{}", prefix, error.field)
            } else {
                format!("{}.{}", prefix, error.field)
            };
        }
    }

    /// Convert to Result - Ok if no errors, Err if there are errors
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Get errors as a slice
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Iterate over the violations
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Render the structured document (`{"errors": [...]}`)
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    /// Render the structured document as indented JSON text
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| "error encoding validation errors".to_string())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("error encoding validation errors"),
        }
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

// ============================================================================
// Single Validation Error
// ============================================================================

/// A single rule violation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Field path (e.g. "users[2].email"), empty until an ancestor fills it
    pub field: String,

    /// Name of the rule that failed (e.g. "required", "min_len")
    pub rule: String,

    /// Constraint value(s) that were violated
    pub rule_values: JsonValue,

    /// The offending input
    pub provided: JsonValue,

    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    /// Create a new violation with an empty field path
    pub fn new(
        rule: impl Into<String>,
        rule_values: impl Into<JsonValue>,
        provided: impl Into<JsonValue>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: String::new(),
            rule: rule.into(),
            rule_values: rule_values.into(),
            provided: provided.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{} [{}]", self.message, self.rule)
        } else {
            write!(f, "{}: {} [{}]", self.field, self.message, self.rule)
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while building a validator from configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown rule type: {0}")]
    UnknownRuleType(String),

    #[error("{rule} rule: unknown parameter '{param}'")]
    UnknownParameter { rule: RuleType, param: String },

    #[error("{rule} rule: invalid parameter '{param}': {reason}")]
    InvalidParameter {
        rule: RuleType,
        param: String,
        reason: String,
    },

    #[error("{rule} rule: invalid regex in '{param}': {source}")]
    InvalidRegex {
        rule: RuleType,
        param: String,
        #[source]
        source: regex::Error,
    },

    #[error("field {path}: {source}")]
    Field {
        path: String,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("no config file found (looked for {0})")]
    NotFound(String),
}

impl ConfigError {
    pub(crate) fn invalid(rule: RuleType, param: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            rule,
            param: param.to_string(),
            reason: reason.into(),
        }
    }

    /// Attach the rule path this error was raised for
    pub fn at_path(self, path: impl Into<String>) -> Self {
        ConfigError::Field {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one(rule: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add_error(rule, json!(3), json!("ab"), "value too short");
        errors
    }

    #[test]
    fn test_validation_errors_empty() {
        let errors = ValidationErrors::new();
        assert!(errors.is_empty());
        assert!(!errors.has_errors());
        assert_eq!(errors.len(), 0);
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_add_error_leaves_field_empty() {
        let errors = one("min_len");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors[0].field, "");
        assert_eq!(errors.errors[0].rule, "min_len");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut errors = one("first");
        errors.append(one("second"));
        errors.append(ValidationErrors::new());
        let rules: Vec<_> = errors.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(rules, vec!["first", "second"]);
    }

    #[test]
    fn test_append_result() {
        let mut errors = ValidationErrors::new();
        errors.append_result(Ok(()));
        assert!(errors.is_empty());
        errors.append_result(Err(one("max_len")));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_add_context_joins_segments() {
        let mut errors = one("min");
        errors.add_context("value");
        assert_eq!(errors.errors[0].field, "value");

        errors.add_context("[0]");
        assert_eq!(errors.errors[0].field, "[0].value");

        errors.add_context("items");
        assert_eq!(errors.errors[0].field, "items[0].value");

        errors.add_context("storage");
        assert_eq!(errors.errors[0].field, "storage.items[0].value");
    }

    #[test]
    fn test_add_context_nested_indices() {
        let mut errors = one("min");
        errors.add_context("[1]");
        errors.add_context("[0]");
        errors.add_context("matrix");
        assert_eq!(errors.errors[0].field, "matrix[0][1]");
    }

    #[test]
    fn test_display_renders_full_document() {
        let mut errors = one("min_len");
        errors.add_context("name");
        let rendered = errors.to_string();
        let parsed: JsonValue = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            parsed,
            json!({
                "errors": [{
                    "field": "name",
                    "rule": "min_len",
                    "rule_values": 3,
                    "provided": "ab",
                    "message": "value too short"
                }]
            })
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnknownRuleType("uuid".to_string()).at_path("user.id");
        assert_eq!(err.to_string(), "field user.id: unknown rule type: uuid");

        let err = ConfigError::invalid(RuleType::String, "min_len", "expected a non-negative integer");
        assert_eq!(
            err.to_string(),
            "string rule: invalid parameter 'min_len': expected a non-negative integer"
        );
    }
}
