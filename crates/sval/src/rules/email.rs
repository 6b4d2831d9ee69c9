//! Email rules

use regex::Regex;
use serde_json::json;
use std::fmt;
use std::str::FromStr;

use super::{absent, type_mismatch, RuleSet};
use crate::errors::{ConfigError, ValidationErrors, ValidationResult};
use crate::formats;
use crate::params::Params;
use crate::types::Value;

const PARAMS: &[&str] = &[
    "required",
    "strategy",
    "min_domain_len",
    "excluded_domains",
    "allowed_domains",
    "regex",
];

/// Address grammar used by an email rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmailStrategy {
    /// SMTP grammar (RFC 5321)
    Rfc5321,
    /// Message-format grammar with quoted local parts (RFC 5322)
    #[default]
    Rfc5322,
    /// WHATWG `input[type=email]` pattern
    Html,
}

impl EmailStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStrategy::Rfc5321 => "rfc5321",
            EmailStrategy::Rfc5322 => "rfc5322",
            EmailStrategy::Html => "html",
        }
    }

    /// Check an address against this grammar
    pub fn is_valid(&self, email: &str) -> bool {
        match self {
            EmailStrategy::Rfc5321 => formats::validate_email_rfc5321(email),
            EmailStrategy::Rfc5322 => formats::validate_email_rfc5322(email),
            EmailStrategy::Html => formats::validate_email_html(email),
        }
    }
}

impl fmt::Display for EmailStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rfc5321" => Ok(EmailStrategy::Rfc5321),
            "rfc5322" => Ok(EmailStrategy::Rfc5322),
            "html" => Ok(EmailStrategy::Html),
            _ => Err(format!("unknown email strategy '{}'", s)),
        }
    }
}

/// Constraints for email addresses
#[derive(Debug, Clone, Default)]
pub struct EmailRules {
    pub required: bool,
    pub strategy: EmailStrategy,
    /// Minimum domain length in bytes
    pub min_domain_len: Option<usize>,
    pub excluded_domains: Vec<String>,
    pub allowed_domains: Vec<String>,
    /// Extra pattern applied to the whole address
    pub regex: Option<Regex>,
}

impl EmailRules {
    pub fn from_params(params: &Params<'_>) -> Result<Self, ConfigError> {
        params.check_known(PARAMS)?;
        let strategy = match params.string("strategy")? {
            Some(name) => name
                .parse::<EmailStrategy>()
                .map_err(|reason| params.invalid("strategy", reason))?,
            None => EmailStrategy::default(),
        };
        Ok(Self {
            required: params.flag("required")?,
            strategy,
            min_domain_len: params.usize("min_domain_len")?,
            excluded_domains: params.strings("excluded_domains")?,
            allowed_domains: params.strings("allowed_domains")?,
            regex: params.regex("regex")?,
        })
    }
}

impl RuleSet for EmailRules {
    fn validate(&self, value: &Value) -> ValidationResult<()> {
        let val = match value {
            Value::Null => return absent(self.required),
            Value::String(s) if s.is_empty() => return absent(self.required),
            Value::String(s) => s.as_str(),
            other => return type_mismatch("string", other, "value must be a string"),
        };

        let mut errors = ValidationErrors::new();

        if !self.strategy.is_valid(val) {
            errors.add_error(
                "strategy",
                self.strategy.as_str(),
                val,
                format!("invalid email address ({})", self.strategy),
            );
        }

        if let Some((_, domain)) = val.rsplit_once('@') {
            if let Some(min) = self.min_domain_len {
                if domain.len() < min {
                    errors.add_error("min_domain_len", min, val, "email domain too short");
                }
            }

            if self
                .excluded_domains
                .iter()
                .any(|d| d.eq_ignore_ascii_case(domain))
            {
                errors.add_error(
                    "excluded_domains",
                    json!(self.excluded_domains),
                    val,
                    "email domain is not allowed",
                );
            }

            if !self.allowed_domains.is_empty()
                && !self
                    .allowed_domains
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(domain))
            {
                errors.add_error(
                    "allowed_domains",
                    json!(self.allowed_domains),
                    val,
                    "email domain is not in the allowed list",
                );
            }
        }

        if let Some(re) = &self.regex {
            if !re.is_match(val) {
                errors.add_error("regex", re.as_str(), val, "email does not match pattern");
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleType;
    use serde_json::{json, Map, Value as JsonValue};

    fn rules(params: JsonValue) -> Result<EmailRules, ConfigError> {
        let map: Map<String, JsonValue> = match params {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        EmailRules::from_params(&Params::new(RuleType::Email, &map))
    }

    fn failed_rules(rules: &EmailRules, value: &str) -> Vec<String> {
        match rules.validate(&Value::from(value)) {
            Ok(()) => vec![],
            Err(errors) => errors.into_iter().map(|e| e.rule).collect(),
        }
    }

    #[test]
    fn test_default_strategy_is_rfc5322() {
        let r = rules(json!({})).unwrap();
        assert_eq!(r.strategy, EmailStrategy::Rfc5322);
        assert!(failed_rules(&r, "\"John Doe\"@example.com").is_empty());
        assert_eq!(failed_rules(&r, "\"test\"test\"@example.com"), vec!["strategy"]);
    }

    #[test]
    fn test_rfc5321_strategy() {
        let r = rules(json!({"strategy": "rfc5321"})).unwrap();
        assert!(failed_rules(&r, "user@example.com").is_empty());
        assert_eq!(failed_rules(&r, "user@example.c0m"), vec!["strategy"]);
        assert_eq!(failed_rules(&r, "user@localhost"), vec!["strategy"]);
    }

    #[test]
    fn test_html_strategy() {
        let r = rules(json!({"strategy": "HTML"})).unwrap();
        assert!(failed_rules(&r, "user@localhost").is_empty());
        assert_eq!(failed_rules(&r, "not an email"), vec!["strategy"]);
    }

    #[test]
    fn test_unknown_strategy_is_config_error() {
        let err = rules(json!({"strategy": "loose"})).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { ref param, .. } if param == "strategy"));
    }

    #[test]
    fn test_required_and_empty() {
        let r = rules(json!({"required": true})).unwrap();
        assert_eq!(failed_rules(&r, ""), vec!["required"]);
        assert!(rules(json!({})).unwrap().validate(&Value::from("")).is_ok());
        let errors = r.validate(&Value::Int(1)).unwrap_err();
        assert_eq!(errors.errors[0].rule, "type");
    }

    #[test]
    fn test_domain_checks() {
        let r = rules(json!({
            "min_domain_len": 9,
            "excluded_domains": ["spam.com"],
            "allowed_domains": ["example.com", "Example.org"],
        }))
        .unwrap();
        assert!(failed_rules(&r, "user@example.org").is_empty());
        assert!(failed_rules(&r, "user@EXAMPLE.COM").is_empty());
        assert_eq!(
            failed_rules(&r, "user@spam.com"),
            vec!["min_domain_len", "excluded_domains", "allowed_domains"]
        );
    }

    #[test]
    fn test_custom_regex_per_instance() {
        let corp = rules(json!({"regex": "@corp\\.com$"})).unwrap();
        let other = rules(json!({"regex": "^admin@"})).unwrap();
        assert!(failed_rules(&corp, "user@corp.com").is_empty());
        assert_eq!(failed_rules(&other, "user@corp.com"), vec!["regex"]);
        assert_eq!(failed_rules(&corp, "admin@example.com"), vec!["regex"]);
    }

    #[test]
    fn test_bad_regex_is_config_error() {
        assert!(matches!(
            rules(json!({"regex": "(unclosed"})),
            Err(ConfigError::InvalidRegex { .. })
        ));
    }
}
