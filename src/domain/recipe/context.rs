//! Per-execution variable context and parameter substitution
//!
//! Substitution is textual and single-level: a parameter value that is
//! exactly the string `${name}` is replaced by the raw value bound to
//! `name`. Anything else - including strings that merely embed a reference -
//! passes through unmodified. Unresolved references degrade to their literal
//! `${name}` text rather than raising an error.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Regex matching a parameter value that is exactly one variable reference
static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$\{([^}]+)\}$").unwrap());

/// Mutable mapping of names to values, scoped to a single recipe run
///
/// Seeded with caller-supplied input variables; grows by one
/// `step_<id>_result` binding per completed step, which is what gives later
/// steps visibility into earlier results.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    variables: HashMap<String, Value>,
}

impl VariableContext {
    /// Create a context seeded with the caller's input variables
    pub fn new(variables: HashMap<String, Value>) -> Self {
        Self { variables }
    }

    /// Get the value bound to a name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Bind a value to a name, replacing any prior binding
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Bind a completed step's result under the conventional
    /// `step_<id>_result` name
    pub fn bind_step_result(&mut self, step_id: &str, result: Value) {
        self.bind(Self::step_result_name(step_id), result);
    }

    /// The conventional variable name for a step's recorded result
    pub fn step_result_name(step_id: &str) -> String {
        format!("step_{}_result", step_id)
    }

    /// Resolve a single parameter value
    ///
    /// Returns the bound value (any JSON type, not coerced to string) when
    /// the value is exactly a `${name}` reference to a bound name; returns
    /// the value unchanged otherwise.
    pub fn resolve_value(&self, value: &Value) -> Value {
        if let Value::String(text) = value {
            if let Some(caps) = REFERENCE_PATTERN.captures(text) {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                if let Some(bound) = self.variables.get(name) {
                    return bound.clone();
                }
            }
        }

        value.clone()
    }

    /// Resolve every value in a step's parameter map
    pub fn resolve_parameters(&self, parameters: &HashMap<String, Value>) -> HashMap<String, Value> {
        parameters
            .iter()
            .map(|(key, value)| (key.clone(), self.resolve_value(value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context_with(entries: &[(&str, Value)]) -> VariableContext {
        VariableContext::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_resolve_exact_reference() {
        let ctx = context_with(&[("target", json!("http://x"))]);

        assert_eq!(ctx.resolve_value(&json!("${target}")), json!("http://x"));
    }

    #[test]
    fn test_resolve_preserves_value_type() {
        let ctx = context_with(&[
            ("count", json!(42)),
            ("flags", json!({"verbose": true})),
            ("items", json!([1, 2, 3])),
        ]);

        assert_eq!(ctx.resolve_value(&json!("${count}")), json!(42));
        assert_eq!(ctx.resolve_value(&json!("${flags}")), json!({"verbose": true}));
        assert_eq!(ctx.resolve_value(&json!("${items}")), json!([1, 2, 3]));
    }

    #[test]
    fn test_unresolved_reference_stays_literal() {
        let ctx = VariableContext::default();

        assert_eq!(ctx.resolve_value(&json!("${missing}")), json!("${missing}"));
    }

    #[test]
    fn test_embedded_reference_passes_through() {
        let ctx = context_with(&[("name", json!("World"))]);

        // Only exact `${name}` values are substituted
        assert_eq!(
            ctx.resolve_value(&json!("Hello ${name}!")),
            json!("Hello ${name}!")
        );
    }

    #[test]
    fn test_non_reference_values_pass_through() {
        let ctx = context_with(&[("target", json!("http://x"))]);

        assert_eq!(ctx.resolve_value(&json!("plain text")), json!("plain text"));
        assert_eq!(ctx.resolve_value(&json!(7)), json!(7));
        assert_eq!(ctx.resolve_value(&Value::Null), Value::Null);
    }

    #[test]
    fn test_resolve_parameters() {
        let ctx = context_with(&[("target", json!("http://x"))]);

        let mut parameters = HashMap::new();
        parameters.insert("url".to_string(), json!("${target}"));
        parameters.insert("method".to_string(), json!("GET"));

        let resolved = ctx.resolve_parameters(&parameters);
        assert_eq!(resolved["url"], json!("http://x"));
        assert_eq!(resolved["method"], json!("GET"));
    }

    #[test]
    fn test_bind_step_result() {
        let mut ctx = VariableContext::default();
        ctx.bind_step_result("fetch", json!("DATA"));

        assert_eq!(ctx.get("step_fetch_result"), Some(&json!("DATA")));
        assert_eq!(
            ctx.resolve_value(&json!("${step_fetch_result}")),
            json!("DATA")
        );
    }

    #[test]
    fn test_bind_replaces_prior_value() {
        let mut ctx = context_with(&[("target", json!("first"))]);
        ctx.bind("target", json!("second"));

        assert_eq!(ctx.get("target"), Some(&json!("second")));
    }

    #[test]
    fn test_step_result_name() {
        assert_eq!(
            VariableContext::step_result_name("fetch"),
            "step_fetch_result"
        );
    }
}
