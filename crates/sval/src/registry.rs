//! Rule factory
//!
//! Maps a rule type name plus a raw parameter map onto a compiled [`Rule`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::params::Params;
use crate::rules::{
    EmailRules, FloatRules, IntRules, IpRules, MacRules, PasswordRules, Rule, StringRules,
    TimeRules,
};

/// Closed set of rule type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RuleType {
    String,
    Email,
    Password,
    Int,
    Float,
    Ip,
    Mac,
    Time,
}

impl RuleType {
    /// Every supported rule type
    pub const ALL: [RuleType; 8] = [
        RuleType::String,
        RuleType::Email,
        RuleType::Password,
        RuleType::Int,
        RuleType::Float,
        RuleType::Ip,
        RuleType::Mac,
        RuleType::Time,
    ];

    /// Configuration name of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::String => "string",
            RuleType::Email => "email",
            RuleType::Password => "password",
            RuleType::Int => "int",
            RuleType::Float => "float",
            RuleType::Ip => "ip",
            RuleType::Mac => "mac",
            RuleType::Time => "time",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        RuleType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownRuleType(s.to_string()))
    }
}

impl TryFrom<String> for RuleType {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RuleType> for String {
    fn from(t: RuleType) -> Self {
        t.as_str().to_string()
    }
}

/// Build a compiled rule from a type and its raw parameters
pub fn create_rule(rule_type: RuleType, params: &Map<String, JsonValue>) -> Result<Rule, ConfigError> {
    let params = Params::new(rule_type, params);
    let rule = match rule_type {
        RuleType::String => StringRules::from_params(&params)?.into(),
        RuleType::Email => EmailRules::from_params(&params)?.into(),
        RuleType::Password => PasswordRules::from_params(&params)?.into(),
        RuleType::Int => IntRules::from_params(&params)?.into(),
        RuleType::Float => FloatRules::from_params(&params)?.into(),
        RuleType::Ip => IpRules::from_params(&params)?.into(),
        RuleType::Mac => MacRules::from_params(&params)?.into(),
        RuleType::Time => TimeRules::from_params(&params)?.into(),
    };
    Ok(rule)
}

/// Build a compiled rule from a type name and its raw parameters
pub fn create_rule_by_name(name: &str, params: &Map<String, JsonValue>) -> Result<Rule, ConfigError> {
    create_rule(name.parse()?, params)
}
