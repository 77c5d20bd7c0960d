//! Rule-based data-quality validation.
//!
//! Validation here is soft: violations are collected and counted, never
//! raised. Hard structural failures are handled separately by the
//! decode step in batch processing.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of a data-quality rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A named data-quality rule. Immutable once registered.
#[derive(Clone)]
pub struct ValidationRule {
    /// Rule name, referenced by per-field rule selections.
    pub name: String,

    /// Message attached to violations of this rule.
    pub message: String,

    /// How severe a violation of this rule is.
    pub severity: Severity,

    check: Predicate,
}

impl ValidationRule {
    /// Create a rule from a predicate over a JSON value.
    pub fn new(
        name: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            severity,
            check: Arc::new(check),
        }
    }

    /// Evaluate the rule against a field value.
    pub fn passes(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl std::fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRule")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A recorded rule violation for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the violated rule.
    pub rule: String,

    /// Severity of the violated rule.
    pub severity: Severity,

    /// Human-readable message.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Per-field selection of rule names.
///
/// Fields without an entry (or with an empty list) are checked against
/// every registered rule.
pub type FieldRules = HashMap<String, Vec<String>>;

/// Map from field name to the violations found on it.
pub type ViolationMap = HashMap<String, Vec<Violation>>;

/// Rule registry evaluating records field by field.
#[derive(Debug, Default)]
pub struct DataQualityValidator {
    rules: IndexMap<String, ValidationRule>,
}

impl DataQualityValidator {
    /// Create an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator preloaded with the common rules.
    pub fn with_common_rules() -> Self {
        let mut validator = Self::new();
        validator.add_rule(ValidationRule::new(
            "not_empty",
            Severity::Error,
            "Value cannot be empty",
            |value| match value {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            },
        ));
        validator.add_rule(ValidationRule::new(
            "valid_email",
            Severity::Warning,
            "Invalid email format",
            |value| match value {
                Value::Null => true,
                Value::String(s) => s.is_empty() || s.contains('@'),
                _ => true,
            },
        ));
        validator.add_rule(ValidationRule::new(
            "positive_number",
            Severity::Warning,
            "Number must be positive",
            |value| match value {
                Value::Null => true,
                Value::Number(n) => n.as_f64().map(|f| f > 0.0).unwrap_or(false),
                _ => false,
            },
        ));
        validator
    }

    /// Register a rule. Later rules with the same name replace earlier ones.
    pub fn add_rule(&mut self, rule: ValidationRule) {
        self.rules.insert(rule.name.clone(), rule);
    }

    /// Builder-style rule registration.
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.add_rule(rule);
        self
    }

    /// Names of registered rules, in registration order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    /// Validate a record, returning violations keyed by field.
    ///
    /// For each field, either the explicitly named rules for that field
    /// are evaluated, or every registered rule when none are named.
    /// Never fails; a fully conforming record yields an empty map.
    pub fn validate(&self, record: &Map<String, Value>, field_rules: Option<&FieldRules>) -> ViolationMap {
        let mut violations = ViolationMap::new();

        for (field, value) in record {
            let selected = field_rules
                .and_then(|rules| rules.get(field))
                .filter(|names| !names.is_empty());

            let field_violations: Vec<Violation> = self
                .rules
                .values()
                .filter(|rule| {
                    selected
                        .map(|names| names.iter().any(|n| n == &rule.name))
                        .unwrap_or(true)
                })
                .filter(|rule| !rule.passes(value))
                .map(|rule| Violation {
                    rule: rule.name.clone(),
                    severity: rule.severity,
                    message: rule.message.clone(),
                })
                .collect();

            if !field_violations.is_empty() {
                violations.insert(field.clone(), field_violations);
            }
        }

        violations
    }

    /// Whether any violation in the map is error-severity.
    pub fn has_errors(violations: &ViolationMap) -> bool {
        violations
            .values()
            .flatten()
            .any(|v| v.severity == Severity::Error)
    }
}
