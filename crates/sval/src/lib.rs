//! sval
//!
//! Configuration-driven validation of nested records.
//!
//! Rules are registered under rule paths (`user.email`, `items[].value`) and
//! applied to every leaf whose concrete path normalizes onto one of them.
//! Every violation found is returned, each qualified with the concrete path
//! of the offending field.
//!
//! # Example
//!
//! ```rust
//! use sval::{impl_shape, Validator};
//!
//! struct Item {
//!     value: i64,
//! }
//!
//! struct Order {
//!     email: String,
//!     items: Vec<Item>,
//! }
//!
//! impl_shape!(Item { value => "value" });
//! impl_shape!(Order { email => "email", items => "items" });
//!
//! let validator = Validator::from_yaml_str(r#"
//! rules:
//!   email:
//!     type: email
//!     params: { required: true }
//!   items[].value:
//!     type: int
//!     params: { min: 0 }
//! "#).unwrap();
//!
//! let order = Order {
//!     email: "buyer@example.com".to_string(),
//!     items: vec![Item { value: 3 }, Item { value: -1 }],
//! };
//!
//! let errors = validator.validate(&order).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors.errors[0].field, "items[1].value");
//! assert_eq!(errors.errors[0].rule, "min");
//! ```

pub mod config;
pub mod errors;
pub mod formats;
pub mod params;
pub mod path;
pub mod registry;
pub mod rules;
pub mod shape;
pub mod types;
pub mod validator;

pub use config::{
    default_config_loader, discover_config, ConfigFormat, ConfigLoader, FileConfigLoader,
    RuleConfig, StaticConfigLoader, ValidatorConfig, DEFAULT_CONFIG_FILES,
};
pub use errors::{
    ConfigError, ValidationError, ValidationErrors, ValidationResult, FIELD_IS_REQUIRED,
};
pub use path::{normalize_path, PathContext};
pub use registry::{create_rule, create_rule_by_name, RuleType};
pub use rules::{
    BusinessHours, EmailRules, EmailStrategy, FloatRules, IntRules, IpRules, IpVersion, MacCase,
    MacFormat, MacRules, MacType, PasswordRules, Rule, RuleSet, StringRules, Subnet, TimeRules,
};
pub use shape::{Node, Shape};
pub use types::{HardwareAddr, Value};
pub use validator::Validator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_programmatic_registry() {
        let validator = Validator::new().with_rule(
            "name",
            StringRules {
                min_len: Some(3),
                ..Default::default()
            },
        );
        assert!(validator.validate(&serde_json::json!({"name": "abc"})).is_ok());
        assert!(validator.validate(&serde_json::json!({"name": "ab"})).is_err());
    }
}
