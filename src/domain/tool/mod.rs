//! Tool domain - the capability contract consumed by recipe steps
//!
//! Recipes never hold a reference to a concrete tool. Steps carry a
//! `tool_name` that is resolved against a [`ToolRegistry`] at execution time
//! (late binding), so definitions can be saved before their tools exist.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the capability boundary
///
/// Absence of a tool is a distinct variant so callers can tell "no such
/// capability" apart from "the capability ran and failed".
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
}

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Opaque execution-scoped handle passed unchanged to every tool in a run
///
/// The engine never inspects the payload; it exists so a host can thread
/// session state (user identity, conversation handles, UI channels) through
/// to its tools.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    payload: Value,
}

impl ToolContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context carrying host-defined data
    pub fn with_payload(payload: Value) -> Self {
        Self { payload }
    }

    /// Get the host-defined payload
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// A named, invocable capability
#[async_trait]
pub trait Tool: Send + Sync + std::fmt::Debug {
    /// Stable name that recipe steps are resolved against
    fn name(&self) -> &str;

    /// Invoke the tool with already-substituted parameters
    ///
    /// The returned value is any serializable JSON value; it becomes the
    /// step's recorded result. Synchronous tools simply complete
    /// immediately.
    async fn invoke(
        &self,
        context: &ToolContext,
        params: HashMap<String, Value>,
    ) -> Result<Value, ToolError>;
}

/// Registry of available tools, populated at startup
#[async_trait]
pub trait ToolRegistry: Send + Sync + std::fmt::Debug {
    /// Check whether a tool with this name is registered
    fn contains(&self, name: &str) -> bool;

    /// Resolve and invoke a tool by name
    ///
    /// Returns [`ToolError::NotFound`] when the name does not resolve,
    /// [`ToolError::Execution`] when the tool itself fails.
    async fn invoke(
        &self,
        name: &str,
        context: &ToolContext,
        params: HashMap<String, Value>,
    ) -> Result<Value, ToolError>;
}
