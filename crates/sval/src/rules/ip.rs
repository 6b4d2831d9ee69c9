//! IP address rules

use serde_json::json;
use std::borrow::Cow;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use super::{absent, type_mismatch, RuleSet};
use crate::errors::{ConfigError, ValidationErrors, ValidationResult};
use crate::params::Params;
use crate::types::Value;

const PARAMS: &[&str] = &[
    "required",
    "version",
    "allow_private",
    "allowed_subnets",
    "excluded_subnets",
];

// ============================================================================
// Subnet
// ============================================================================

/// CIDR block (`192.168.0.0/16`, `2001:db8::/32`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    addr: IpAddr,
    prefix: u8,
}

impl Subnet {
    /// Network address as written
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// True when `ip` lies inside this block; families never mix
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - self.prefix as u32).unwrap_or(0);
                u32::from(net) & mask == u32::from(*ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - self.prefix as u32).unwrap_or(0);
                u128::from(net) & mask == u128::from(*ip) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for Subnet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid CIDR '{}'", s);
        let (addr, prefix) = s.trim().split_once('/').ok_or_else(invalid)?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(invalid());
        }
        Ok(Self { addr, prefix })
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

// ============================================================================
// Private ranges
// ============================================================================

fn is_private_v4(ip: &Ipv4Addr) -> bool {
    ip.is_private() || ip.is_link_local()
}

fn is_private_v6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    // fc00::/7 unique local, fe80::/10 link local
    (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}

/// Private or link-local address
pub fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

// ============================================================================
// IpRules
// ============================================================================

/// Accepted address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpVersion {
    #[default]
    Any,
    V4,
    V6,
}

impl IpVersion {
    fn number(&self) -> u8 {
        match self {
            IpVersion::Any => 0,
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

/// Constraints for IP addresses
///
/// Subnets are kept as written for reporting. Rules built from configuration
/// parse them once up front (see [`IpRules::compile`]); otherwise they are
/// parsed per call and an entry that does not parse is reported as a
/// violation.
#[derive(Debug, Clone, Default)]
pub struct IpRules {
    pub required: bool,
    pub version: IpVersion,
    pub allow_private: bool,
    pub allowed_subnets: Vec<String>,
    pub excluded_subnets: Vec<String>,
    compiled: Option<CompiledSubnets>,
}

#[derive(Debug, Clone)]
struct CompiledSubnets {
    allowed: Vec<Subnet>,
    excluded: Vec<Subnet>,
}

fn parse_subnets(list: &[String]) -> Result<Vec<Subnet>, String> {
    list.iter().map(|entry| entry.parse::<Subnet>()).collect()
}

impl IpRules {
    pub fn from_params(params: &Params<'_>) -> Result<Self, ConfigError> {
        params.check_known(PARAMS)?;
        let version = match params.i64("version")? {
            None | Some(0) => IpVersion::Any,
            Some(4) => IpVersion::V4,
            Some(6) => IpVersion::V6,
            Some(_) => return Err(params.invalid("version", "expected 4, 6 or 0")),
        };
        let rules = Self {
            required: params.flag("required")?,
            version,
            allow_private: params.flag("allow_private")?,
            allowed_subnets: params.strings("allowed_subnets")?,
            excluded_subnets: params.strings("excluded_subnets")?,
            compiled: None,
        };
        rules
            .compile()
            .map_err(|(key, reason)| params.invalid(key, reason))
    }

    /// Parse both subnet lists once, failing on the first malformed entry.
    ///
    /// The error names the offending list. Call again after editing a list.
    pub fn compile(mut self) -> Result<Self, (&'static str, String)> {
        let allowed = parse_subnets(&self.allowed_subnets).map_err(|e| ("allowed_subnets", e))?;
        let excluded = parse_subnets(&self.excluded_subnets).map_err(|e| ("excluded_subnets", e))?;
        self.compiled = Some(CompiledSubnets { allowed, excluded });
        Ok(self)
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// Compiled subnets when present; otherwise parse `list`, recording a
    /// violation for every malformed entry
    fn subnets<'s>(
        &self,
        rule: &str,
        compiled: Option<&'s [Subnet]>,
        list: &[String],
        errors: &mut ValidationErrors,
        provided: &str,
    ) -> Cow<'s, [Subnet]> {
        if let Some(subnets) = compiled {
            return Cow::Borrowed(subnets);
        }
        let mut subnets = Vec::with_capacity(list.len());
        for entry in list {
            match entry.parse::<Subnet>() {
                Ok(subnet) => subnets.push(subnet),
                Err(reason) => errors.add_error(rule, entry.as_str(), provided, reason),
            }
        }
        Cow::Owned(subnets)
    }

    fn check(&self, ip: IpAddr) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let ip = ip.to_canonical();
        let provided = ip.to_string();

        let version_ok = match self.version {
            IpVersion::Any => true,
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
        };
        if !version_ok {
            errors.add_error(
                "version",
                self.version.number(),
                provided.as_str(),
                format!("value must be an IPv{} address", self.version.number()),
            );
        }

        if !self.allow_private && is_private(&ip) {
            errors.add_error("allow_private", false, provided.as_str(), "private IP address is not allowed");
        }

        if !self.allowed_subnets.is_empty() {
            let compiled = self.compiled.as_ref().map(|c| c.allowed.as_slice());
            let allowed = self.subnets("allowed_subnets", compiled, &self.allowed_subnets, &mut errors, &provided);
            if !allowed.iter().any(|s| s.contains(&ip)) {
                errors.add_error(
                    "allowed_subnets",
                    json!(self.allowed_subnets),
                    provided.as_str(),
                    "IP address is not in any allowed subnet",
                );
            }
        }

        if !self.excluded_subnets.is_empty() {
            let compiled = self.compiled.as_ref().map(|c| c.excluded.as_slice());
            let excluded = self.subnets("excluded_subnets", compiled, &self.excluded_subnets, &mut errors, &provided);
            if excluded.iter().any(|s| s.contains(&ip)) {
                errors.add_error(
                    "excluded_subnets",
                    json!(self.excluded_subnets),
                    provided.as_str(),
                    "IP address is in an excluded subnet",
                );
            }
        }

        errors
    }
}

impl RuleSet for IpRules {
    fn validate(&self, value: &Value) -> ValidationResult<()> {
        let ip = match value {
            Value::Null => return absent(self.required),
            Value::String(s) if s.is_empty() => return absent(self.required),
            Value::String(s) => match s.trim().parse::<IpAddr>() {
                Ok(ip) => ip,
                Err(_) => {
                    let mut errors = ValidationErrors::new();
                    errors.add_error("format", "ip", s.as_str(), "invalid IP address");
                    return Err(errors);
                }
            },
            Value::Ip(ip) => *ip,
            other => return type_mismatch("ip", other, "value must be an IP address or string"),
        };

        self.check(ip).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleType;
    use serde_json::{Map, Value as JsonValue};

    fn rules(version: IpVersion, allow_private: bool) -> IpRules {
        IpRules {
            version,
            allow_private,
            ..Default::default()
        }
    }

    fn failed_rules(rules: &IpRules, value: impl Into<Value>) -> Vec<String> {
        match rules.validate(&value.into()) {
            Ok(()) => vec![],
            Err(errors) => errors.into_iter().map(|e| e.rule).collect(),
        }
    }

    #[test]
    fn test_subnet_parse_and_contains() {
        let net: Subnet = "192.168.0.0/16".parse().unwrap();
        assert!(net.contains(&"192.168.44.1".parse().unwrap()));
        assert!(!net.contains(&"192.169.0.1".parse().unwrap()));
        assert!(!net.contains(&"::1".parse().unwrap()));

        let v6: Subnet = "2001:db8::/32".parse().unwrap();
        assert!(v6.contains(&"2001:db8::1".parse().unwrap()));
        assert!(!v6.contains(&"2002:db8::1".parse().unwrap()));

        let all: Subnet = "0.0.0.0/0".parse().unwrap();
        assert!(all.contains(&"8.8.8.8".parse().unwrap()));
        assert_eq!(all.to_string(), "0.0.0.0/0");

        assert!("invalid-cidr".parse::<Subnet>().is_err());
        assert!("10.0.0.0/33".parse::<Subnet>().is_err());
        assert!("10.0.0.0".parse::<Subnet>().is_err());
    }

    #[test]
    fn test_private_ranges() {
        for ip in ["10.1.2.3", "172.16.0.1", "172.31.255.255", "192.168.1.1", "169.254.0.1", "fc00::1", "fd12::1", "fe80::1"] {
            assert!(is_private(&ip.parse().unwrap()), "{} should be private", ip);
        }
        for ip in ["8.8.8.8", "127.0.0.1", "0.0.0.0", "172.32.0.1", "::1", "::", "2001:db8::1"] {
            assert!(!is_private(&ip.parse().unwrap()), "{} should not be private", ip);
        }
    }

    #[test]
    fn test_private_gate() {
        assert_eq!(failed_rules(&rules(IpVersion::V4, false), "192.168.1.1"), vec!["allow_private"]);
        assert!(failed_rules(&rules(IpVersion::V4, true), "192.168.1.1").is_empty());
        assert_eq!(failed_rules(&rules(IpVersion::V6, false), "fe80::1"), vec!["allow_private"]);
    }

    #[test]
    fn test_version() {
        assert_eq!(failed_rules(&rules(IpVersion::V4, true), "::1"), vec!["version"]);
        assert_eq!(failed_rules(&rules(IpVersion::V6, true), "8.8.8.8"), vec!["version"]);
        assert!(failed_rules(&rules(IpVersion::Any, true), "::1").is_empty());
        // IPv4-mapped IPv6 counts as IPv4
        assert!(failed_rules(&rules(IpVersion::V4, true), "::ffff:8.8.8.8").is_empty());
    }

    #[test]
    fn test_native_addresses() {
        let r = rules(IpVersion::V4, false);
        assert!(failed_rules(&r, Ipv4Addr::new(8, 8, 8, 8)).is_empty());
        assert_eq!(failed_rules(&r, Ipv4Addr::new(10, 0, 0, 1)), vec!["allow_private"]);
    }

    #[test]
    fn test_format_and_type() {
        let r = IpRules {
            required: true,
            ..Default::default()
        };
        assert_eq!(failed_rules(&r, "999.1.1.1"), vec!["format"]);
        assert_eq!(failed_rules(&r, ""), vec!["required"]);
        assert_eq!(failed_rules(&r, Value::Null), vec!["required"]);
        assert_eq!(failed_rules(&r, 42), vec!["type"]);
    }

    #[test]
    fn test_subnets() {
        let r = IpRules {
            version: IpVersion::V4,
            allow_private: true,
            allowed_subnets: vec!["192.168.0.0/16".into()],
            excluded_subnets: vec!["192.168.0.0/24".into()],
            ..Default::default()
        };
        assert!(failed_rules(&r, "192.168.1.1").is_empty());
        assert_eq!(failed_rules(&r, "192.168.0.1"), vec!["excluded_subnets"]);
        assert_eq!(failed_rules(&r, "172.16.1.1"), vec!["allowed_subnets"]);
    }

    #[test]
    fn test_malformed_subnet_is_violation() {
        let r = IpRules {
            allow_private: true,
            excluded_subnets: vec!["invalid-cidr".into()],
            ..Default::default()
        };
        assert_eq!(failed_rules(&r, "192.168.1.1"), vec!["excluded_subnets"]);
    }

    #[test]
    fn test_compile() {
        let r = IpRules {
            allow_private: true,
            allowed_subnets: vec!["10.0.0.0/8".into()],
            excluded_subnets: vec!["10.9.0.0/16".into()],
            ..Default::default()
        };
        assert!(!r.is_compiled());
        let compiled = r.clone().compile().unwrap();
        assert!(compiled.is_compiled());
        for ip in ["10.1.1.1", "10.9.1.1", "8.8.8.8"] {
            assert_eq!(failed_rules(&r, ip), failed_rules(&compiled, ip), "{}", ip);
        }

        let bad = IpRules {
            excluded_subnets: vec!["invalid-cidr".into()],
            ..Default::default()
        };
        let (key, reason) = bad.compile().unwrap_err();
        assert_eq!(key, "excluded_subnets");
        assert!(reason.contains("invalid-cidr"));
    }

    #[test]
    fn test_from_params() {
        let map: Map<String, JsonValue> = serde_json::from_str(
            r#"{"version": 4, "allow_private": true, "allowed_subnets": ["10.0.0.0/8"]}"#,
        )
        .unwrap();
        let r = IpRules::from_params(&Params::new(RuleType::Ip, &map)).unwrap();
        assert_eq!(r.version, IpVersion::V4);
        assert!(r.is_compiled());
        assert!(failed_rules(&r, "10.2.3.4").is_empty());
        assert_eq!(failed_rules(&r, "11.2.3.4"), vec!["allowed_subnets"]);

        let bad: Map<String, JsonValue> = serde_json::from_str(r#"{"allowed_subnets": ["nope"]}"#).unwrap();
        assert!(IpRules::from_params(&Params::new(RuleType::Ip, &bad)).is_err());

        let bad: Map<String, JsonValue> = serde_json::from_str(r#"{"version": 5}"#).unwrap();
        assert!(IpRules::from_params(&Params::new(RuleType::Ip, &bad)).is_err());
    }
}
