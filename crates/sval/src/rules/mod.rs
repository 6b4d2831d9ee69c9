//! Rule sets
//!
//! One strongly-typed rule set per supported type. Every rule set follows the
//! same contract:
//!
//! - absent value (`Value::Null`, or an empty string for textual rules) and
//!   `required` → exactly one `required` violation;
//! - absent and not required → valid;
//! - wrong underlying type → exactly one `type` violation;
//! - otherwise every configured constraint runs and all violations are
//!   collected, unless a rule documents a short-circuit.

use serde_json::Value as JsonValue;

use crate::errors::{ValidationErrors, ValidationResult, FIELD_IS_REQUIRED};
use crate::registry::RuleType;
use crate::types::Value;

pub mod email;
pub mod ip;
pub mod mac;
pub mod number;
pub mod password;
pub mod string;
pub mod time;

pub use email::{EmailRules, EmailStrategy};
pub use ip::{IpRules, IpVersion, Subnet};
pub use mac::{MacCase, MacFormat, MacRules, MacType};
pub use number::{FloatRules, IntRules};
pub use password::PasswordRules;
pub use string::StringRules;
pub use time::{BusinessHours, TimeRules};

/// Rule name of the presence check
pub const RULE_REQUIRED: &str = "required";
/// Rule name of the type check
pub const RULE_TYPE: &str = "type";

// ============================================================================
// RuleSet Trait
// ============================================================================

/// A compiled set of constraints for one field
pub trait RuleSet: std::fmt::Debug + Send + Sync {
    /// Validate one value, returning every violation found
    fn validate(&self, value: &Value) -> ValidationResult<()>;
}

// ============================================================================
// Rule - closed set of rule types
// ============================================================================

/// A compiled rule set of any supported type
#[derive(Debug, Clone)]
pub enum Rule {
    String(StringRules),
    Email(EmailRules),
    Password(PasswordRules),
    Int(IntRules),
    Float(FloatRules),
    Ip(IpRules),
    Mac(MacRules),
    Time(TimeRules),
}

impl Rule {
    /// Type tag of this rule
    pub fn rule_type(&self) -> RuleType {
        match self {
            Rule::String(_) => RuleType::String,
            Rule::Email(_) => RuleType::Email,
            Rule::Password(_) => RuleType::Password,
            Rule::Int(_) => RuleType::Int,
            Rule::Float(_) => RuleType::Float,
            Rule::Ip(_) => RuleType::Ip,
            Rule::Mac(_) => RuleType::Mac,
            Rule::Time(_) => RuleType::Time,
        }
    }
}

impl RuleSet for Rule {
    fn validate(&self, value: &Value) -> ValidationResult<()> {
        match self {
            Rule::String(rules) => rules.validate(value),
            Rule::Email(rules) => rules.validate(value),
            Rule::Password(rules) => rules.validate(value),
            Rule::Int(rules) => rules.validate(value),
            Rule::Float(rules) => rules.validate(value),
            Rule::Ip(rules) => rules.validate(value),
            Rule::Mac(rules) => rules.validate(value),
            Rule::Time(rules) => rules.validate(value),
        }
    }
}

macro_rules! rule_from {
    ($($variant:ident($rules:ty)),* $(,)?) => {
        $(
            impl From<$rules> for Rule {
                fn from(rules: $rules) -> Self {
                    Rule::$variant(rules)
                }
            }
        )*
    };
}

rule_from!(
    String(StringRules),
    Email(EmailRules),
    Password(PasswordRules),
    Int(IntRules),
    Float(FloatRules),
    Ip(IpRules),
    Mac(MacRules),
    Time(TimeRules),
);

// ============================================================================
// Shared helpers
// ============================================================================

/// Outcome for an absent value
pub(crate) fn absent(required: bool) -> ValidationResult<()> {
    if required {
        let mut errors = ValidationErrors::new();
        errors.add_error(RULE_REQUIRED, true, JsonValue::Null, FIELD_IS_REQUIRED);
        Err(errors)
    } else {
        Ok(())
    }
}

/// Single `type` violation
pub(crate) fn type_mismatch(expected: &str, value: &Value, message: &str) -> ValidationResult<()> {
    let mut errors = ValidationErrors::new();
    errors.add_error(
        RULE_TYPE,
        expected,
        value.to_json(),
        format!("{} (got {})", message, value.type_name()),
    );
    Err(errors)
}

/// Shannon entropy in bits per character over the character distribution
pub fn shannon_entropy(s: &str) -> f64 {
    let mut counts = std::collections::HashMap::new();
    let mut total = 0usize;
    for c in s.chars() {
        *counts.entry(c).or_insert(0usize) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}
