//! Integer and float rules

use super::{absent, type_mismatch, RuleSet};
use crate::errors::{ConfigError, ValidationErrors, ValidationResult};
use crate::params::Params;
use crate::types::Value;

const PARAMS: &[&str] = &["required", "min", "max"];

// ============================================================================
// Integer
// ============================================================================

/// Inclusive bounds for integers
#[derive(Debug, Clone, Default)]
pub struct IntRules {
    pub required: bool,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IntRules {
    pub fn from_params(params: &Params<'_>) -> Result<Self, ConfigError> {
        params.check_known(PARAMS)?;
        Ok(Self {
            required: params.flag("required")?,
            min: params.i64("min")?,
            max: params.i64("max")?,
        })
    }
}

impl RuleSet for IntRules {
    fn validate(&self, value: &Value) -> ValidationResult<()> {
        let val = match value {
            Value::Null => return absent(self.required),
            Value::Int(i) => *i,
            other => return type_mismatch("int", other, "value must be int"),
        };

        let mut errors = ValidationErrors::new();
        if let Some(min) = self.min {
            if val < min {
                errors.add_error("min", min, val, "value must be greater than or equal to min");
            }
        }
        if let Some(max) = self.max {
            if val > max {
                errors.add_error("max", max, val, "value must be less than or equal to max");
            }
        }
        errors.into_result()
    }
}

// ============================================================================
// Float
// ============================================================================

/// Inclusive bounds for floats; integers are widened
#[derive(Debug, Clone, Default)]
pub struct FloatRules {
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FloatRules {
    pub fn from_params(params: &Params<'_>) -> Result<Self, ConfigError> {
        params.check_known(PARAMS)?;
        Ok(Self {
            required: params.flag("required")?,
            min: params.f64("min")?,
            max: params.f64("max")?,
        })
    }
}

impl RuleSet for FloatRules {
    fn validate(&self, value: &Value) -> ValidationResult<()> {
        let val = match value {
            Value::Null => return absent(self.required),
            Value::Float(f) => *f,
            Value::Int(i) => *i as f64,
            other => return type_mismatch("float", other, "value must be a float"),
        };
        // NaN compares false against any bound
        if !val.is_finite() {
            return type_mismatch("float", value, "value must be a finite number");
        }

        let mut errors = ValidationErrors::new();
        if let Some(min) = self.min {
            if val < min {
                errors.add_error("min", min, value, "value must be greater than or equal to min");
            }
        }
        if let Some(max) = self.max {
            if val > max {
                errors.add_error("max", max, value, "value must be less than or equal to max");
            }
        }
        errors.into_result()
    }
}
