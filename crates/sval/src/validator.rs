//! Path-addressed validator
//!
//! Holds one compiled rule per rule path and walks host values through their
//! [`Shape`], applying the rule registered at each leaf's normalized path.

use serde_json::Map;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

use crate::config::{default_config_loader, ConfigLoader, ValidatorConfig};
use crate::errors::{ConfigError, ValidationErrors, ValidationResult};
use crate::path::{normalize_path, PathContext};
use crate::registry::{create_rule_by_name, RuleType};
use crate::rules::{Rule, RuleSet};
use crate::shape::{Node, Shape};
use crate::types::Value;

/// Registry of rules keyed by rule path
///
/// Immutable once built; share it freely across threads.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rules: HashMap<String, Rule>,
}

impl Validator {
    /// Create a validator with no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule` under `path`, replacing any previous rule there
    pub fn add_rule(&mut self, path: impl Into<String>, rule: impl Into<Rule>) -> &mut Self {
        let path = path.into();
        let rule = rule.into();
        debug!(path = %path, rule_type = %rule.rule_type(), "Registered rule");
        self.rules.insert(path, rule);
        self
    }

    /// Builder form of [`add_rule`](Self::add_rule)
    pub fn with_rule(mut self, path: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.add_rule(path, rule);
        self
    }

    /// Rule registered at exactly `path`
    pub fn rule(&self, path: &str) -> Option<&Rule> {
        self.rules.get(path)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered paths, sorted
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Build from a configuration document.
    ///
    /// All or nothing: the first bad rule aborts the build, and the error
    /// names the path it was configured under.
    pub fn from_config(config: &ValidatorConfig) -> Result<Self, ConfigError> {
        let mut validator = Self::new();
        for (path, rule_config) in &config.rules {
            let rule = create_rule_by_name(&rule_config.rule_type, &rule_config.params)
                .map_err(|e| e.at_path(path.as_str()))?;
            validator.add_rule(path.as_str(), rule);
        }
        debug!(rules = validator.len(), "Built validator from config");
        Ok(validator)
    }

    /// Build from whatever `loader` yields
    pub fn from_loader(loader: &dyn ConfigLoader) -> Result<Self, ConfigError> {
        Self::from_config(&loader.load()?)
    }

    /// Build from `sval.yaml`, `sval.yml` or `sval.json` in the working directory
    pub fn from_default_config() -> Result<Self, ConfigError> {
        Self::from_loader(&default_config_loader()?)
    }

    /// Build from a YAML document
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Self::from_config(&ValidatorConfig::from_yaml_str(text)?)
    }

    /// Build from a JSON document
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Self::from_config(&ValidatorConfig::from_json_str(text)?)
    }

    /// Build a single rule and register it
    pub fn add_rule_config(
        &mut self,
        path: impl Into<String>,
        rule_type: RuleType,
        params: &Map<String, serde_json::Value>,
    ) -> Result<&mut Self, ConfigError> {
        let path = path.into();
        let rule = crate::registry::create_rule(rule_type, params)
            .map_err(|e| e.at_path(path.as_str()))?;
        Ok(self.add_rule(path, rule))
    }

    /// Validate a value, collecting every violation in traversal order
    pub fn validate<T: Shape + ?Sized>(&self, value: &T) -> ValidationResult<()> {
        let mut ctx = PathContext::new();
        let root: &dyn Shape = &value;
        self.visit(root, &mut ctx).into_result()
    }

    fn visit(&self, value: &dyn Shape, ctx: &mut PathContext) -> ValidationErrors {
        match value.shape() {
            Node::Leaf(leaf) => self.apply(&leaf, ctx),
            Node::Optional(Some(inner)) => self.visit(inner, ctx),
            Node::Optional(None) => self.apply(&Value::Null, ctx),
            Node::Record(fields) => self.visit_fields(&fields, ctx),
            Node::Object(fields) => {
                let mut errors = self.visit_fields(&fields, ctx);
                for segment in self.missing_fields(&fields, ctx) {
                    ctx.push_field(segment);
                    trace!(path = %ctx.current_path(), "Key missing from document");
                    let mut child = self.apply(&Value::Null, ctx);
                    ctx.pop();
                    child.add_context(segment);
                    errors.append(child);
                }
                errors
            }
            Node::List(items) => {
                let mut errors = ValidationErrors::new();
                for (index, item) in items.into_iter().enumerate() {
                    ctx.push_index(index);
                    let mut child = self.visit(item, ctx);
                    ctx.pop();
                    child.add_context(&format!("[{}]", index));
                    errors.append(child);
                }
                errors
            }
        }
    }

    fn visit_fields(&self, fields: &[(&str, &dyn Shape)], ctx: &mut PathContext) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for (tag, field) in fields {
            if tag.is_empty() {
                continue;
            }
            ctx.push_field(tag);
            let mut child = self.visit(*field, ctx);
            ctx.pop();
            child.add_context(tag);
            errors.append(child);
        }
        errors
    }

    /// Registered direct children of the current path absent from `present`, sorted
    fn missing_fields(&self, present: &[(&str, &dyn Shape)], ctx: &PathContext) -> Vec<&str> {
        let path = ctx.current_path();
        let prefix = normalize_path(&path);
        let mut missing: Vec<&str> = self
            .rules
            .keys()
            .filter_map(|key| {
                let segment = if prefix.is_empty() {
                    key.as_str()
                } else {
                    key.strip_prefix(&*prefix)?.strip_prefix('.')?
                };
                let direct = !segment.is_empty() && !segment.contains(['.', '[']);
                (direct && !present.iter().any(|(tag, _)| *tag == segment)).then_some(segment)
            })
            .collect();
        missing.sort_unstable();
        missing
    }

    fn apply(&self, value: &Value, ctx: &PathContext) -> ValidationErrors {
        // Nothing to look up above the first field
        if ctx.is_root() || self.rules.is_empty() {
            return ValidationErrors::new();
        }
        let path = ctx.current_path();
        let key = normalize_path(&path);
        let Some(rule) = self.rules.get(key.as_ref()) else {
            return ValidationErrors::new();
        };

        trace!(path = %path, rule_type = %rule.rule_type(), "Applying rule");
        match rule.validate(value) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in self.paths() {
            if let Some(rule) = self.rules.get(path) {
                writeln!(f, "{}: {}", path, rule.rule_type())?;
            }
        }
        Ok(())
    }
}
