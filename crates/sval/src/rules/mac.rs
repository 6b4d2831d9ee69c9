//! MAC (hardware) address rules

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value as JsonValue};
use std::str::FromStr;

use super::{absent, type_mismatch, RuleSet};
use crate::errors::{ConfigError, ValidationErrors, ValidationResult};
use crate::params::Params;
use crate::types::Value;

const PARAMS: &[&str] = &[
    "required",
    "formats",
    "cases",
    "types",
    "allow_zero",
    "allow_broadcast",
    "allow_multicast",
    "oui_whitelist",
    "blacklist",
    "max_octets",
];

// ============================================================================
// Pre-compiled Regex Patterns (EUI-48 and EUI-64)
// ============================================================================

/// `00:1a:2b:3c:4d:5e`
static COLON_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}((:[0-9A-Fa-f]{2}){2})?$").unwrap()
});

/// `00-1a-2b-3c-4d-5e`
static HYPHEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(-[0-9A-Fa-f]{2}){5}((-[0-9A-Fa-f]{2}){2})?$").unwrap()
});

/// `001a.2b3c.4d5e`
static DOT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{4}(\.[0-9A-Fa-f]{4}){2}(\.[0-9A-Fa-f]{4})?$").unwrap()
});

/// `001a2b3c4d5e`
static RAW_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{12}|[0-9A-Fa-f]{16})$").unwrap()
});

// ============================================================================
// Options
// ============================================================================

macro_rules! named_options {
    ($(#[$meta:meta])* $name:ident, $what:literal { $($variant:ident => $text:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),*
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)*
                    _ => Err(format!("unknown MAC {} '{}'", $what, s)),
                }
            }
        }
    };
}

named_options!(
    /// Separator layout of a written address
    MacFormat, "format" {
        Any => "any",
        Colon => "colon",
        Hyphen => "hyphen",
        Dot => "dot",
        Raw => "raw",
    }
);

named_options!(
    /// Letter case of a written address
    MacCase, "case" {
        Any => "any",
        Lower => "lower",
        Upper => "upper",
        Camel => "camel",
    }
);

named_options!(
    /// Address class from the first octet's flag bits
    MacType, "type" {
        Unicast => "unicast",
        Multicast => "multicast",
        Universal => "universal",
        Local => "local",
    }
);

impl MacFormat {
    fn matches(&self, mac: &str) -> bool {
        match self {
            MacFormat::Any => true,
            MacFormat::Colon => COLON_REGEX.is_match(mac),
            MacFormat::Hyphen => HYPHEN_REGEX.is_match(mac),
            MacFormat::Dot => DOT_REGEX.is_match(mac),
            MacFormat::Raw => RAW_REGEX.is_match(mac),
        }
    }
}

impl MacCase {
    fn matches(&self, mac: &str) -> bool {
        match self {
            MacCase::Any => true,
            MacCase::Lower => !mac.chars().any(|c| c.is_ascii_uppercase()),
            // Camel only constrains hex letters; layout belongs to `formats`
            MacCase::Upper | MacCase::Camel => !mac.chars().any(|c| c.is_ascii_lowercase()),
        }
    }
}

impl MacType {
    fn matches(&self, first_octet: u8) -> bool {
        match self {
            MacType::Unicast => first_octet & 0x01 == 0,
            MacType::Multicast => first_octet & 0x01 == 1,
            MacType::Universal => first_octet & 0x02 == 0,
            MacType::Local => first_octet & 0x02 == 2,
        }
    }
}

/// Strip `:`, `-` and `.` and lower-case; `None` unless whole hex octets remain
pub fn normalize_mac(mac: &str) -> Option<String> {
    let normalized: String = mac
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if normalized.is_empty()
        || normalized.len() % 2 != 0
        || !normalized.chars().all(|c| c.is_ascii_hexdigit())
    {
        return None;
    }
    Some(normalized)
}

fn names<T: Copy>(items: &[T], name: fn(&T) -> &'static str) -> JsonValue {
    json!(items.iter().map(name).collect::<Vec<_>>())
}

// ============================================================================
// MacRules
// ============================================================================

/// Constraints for hardware addresses
///
/// Special addresses are gated in priority order: a broadcast address is
/// governed by `allow_broadcast` alone, otherwise an all-zero address by
/// `allow_zero`, otherwise the multicast bit by `allow_multicast`.
#[derive(Debug, Clone, Default)]
pub struct MacRules {
    pub required: bool,
    /// At least one must match the address as written; empty allows all
    pub formats: Vec<MacFormat>,
    /// At least one must match; empty allows all
    pub cases: Vec<MacCase>,
    /// At least one must match; empty allows all
    pub types: Vec<MacType>,
    pub allow_zero: bool,
    pub allow_broadcast: bool,
    pub allow_multicast: bool,
    /// Allowed vendor prefixes (first 3 octets)
    pub oui_whitelist: Vec<String>,
    /// Rejected prefixes
    pub blacklist: Vec<String>,
    pub max_octets: Option<usize>,
}

impl MacRules {
    pub fn from_params(params: &Params<'_>) -> Result<Self, ConfigError> {
        params.check_known(PARAMS)?;
        Ok(Self {
            required: params.flag("required")?,
            formats: parse_options(params, "formats")?,
            cases: parse_options(params, "cases")?,
            types: parse_options(params, "types")?,
            allow_zero: params.flag("allow_zero")?,
            allow_broadcast: params.flag("allow_broadcast")?,
            allow_multicast: params.flag("allow_multicast")?,
            oui_whitelist: params.strings("oui_whitelist")?,
            blacklist: params.strings("blacklist")?,
            max_octets: params.usize("max_octets")?,
        })
    }

    fn check(&self, mac: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        let normalized = match normalize_mac(mac) {
            Some(n) => n,
            None => {
                let formats = if self.formats.is_empty() {
                    json!([MacFormat::Any.as_str()])
                } else {
                    names(&self.formats, MacFormat::as_str)
                };
                errors.add_error("formats", formats, mac, "invalid MAC address format");
                return errors;
            }
        };
        let octets = normalized.len() / 2;
        let first_octet = u8::from_str_radix(&normalized[..2], 16).unwrap_or(0);

        if let Some(max) = self.max_octets {
            if octets > max {
                errors.add_error("max_octets", max, mac, "too many octets in MAC address");
            }
        }

        if !self.formats.is_empty() && !self.formats.iter().any(|f| f.matches(mac)) {
            errors.add_error(
                "formats",
                names(&self.formats, MacFormat::as_str),
                mac,
                "invalid MAC address format",
            );
        }

        if !self.cases.is_empty() && !self.cases.iter().any(|c| c.matches(mac)) {
            errors.add_error(
                "cases",
                names(&self.cases, MacCase::as_str),
                mac,
                "incorrect MAC address case",
            );
        }

        if !self.types.is_empty() && !self.types.iter().any(|t| t.matches(first_octet)) {
            errors.add_error(
                "types",
                names(&self.types, MacType::as_str),
                mac,
                "MAC address does not match any of the required types",
            );
        }

        if !self.oui_whitelist.is_empty() {
            let oui = normalized.get(..6);
            let listed = self
                .oui_whitelist
                .iter()
                .filter_map(|entry| normalize_mac(entry))
                .any(|entry| Some(entry.as_str()) == oui);
            if !listed {
                errors.add_error(
                    "oui_whitelist",
                    json!(self.oui_whitelist),
                    mac,
                    "MAC address OUI not in allowed list",
                );
            }
        }

        if self
            .blacklist
            .iter()
            .filter_map(|entry| normalize_mac(entry))
            .any(|entry| normalized.starts_with(&entry))
        {
            errors.add_error("blacklist", json!(self.blacklist), mac, "MAC address is blacklisted");
        }

        if normalized.chars().all(|c| c == 'f') {
            if !self.allow_broadcast {
                errors.add_error("allow_broadcast", false, mac, "broadcast MAC address is not allowed");
            }
        } else if normalized.chars().all(|c| c == '0') {
            if !self.allow_zero {
                errors.add_error("allow_zero", false, mac, "zero MAC address is not allowed");
            }
        } else if MacType::Multicast.matches(first_octet) && !self.allow_multicast {
            errors.add_error("allow_multicast", false, mac, "multicast MAC address is not allowed");
        }

        errors
    }
}

fn parse_options<T: FromStr<Err = String>>(params: &Params<'_>, key: &str) -> Result<Vec<T>, ConfigError> {
    params
        .strings(key)?
        .iter()
        .map(|name| name.parse::<T>().map_err(|reason| params.invalid(key, reason)))
        .collect()
}

impl RuleSet for MacRules {
    fn validate(&self, value: &Value) -> ValidationResult<()> {
        match value {
            Value::Null => absent(self.required),
            Value::String(s) if s.is_empty() => absent(self.required),
            Value::Mac(hw) if hw.is_empty() => absent(self.required),
            Value::String(s) => self.check(s).into_result(),
            Value::Mac(hw) => self.check(&hw.to_string()).into_result(),
            other => type_mismatch("mac", other, "value must be a MAC address or string"),
        }
    }
}
