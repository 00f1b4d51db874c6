//! Typed access to tool call arguments.

use crate::error::GenieError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Parse the raw argument string of a tool call.
    ///
    /// Blank input is treated as an empty object.
    pub fn from_json_str(raw: &str) -> Result<Self, GenieError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(serde_json::json!({})));
        }
        serde_json::from_str(trimmed)
            .map(Self::new)
            .map_err(|e| GenieError::Parse(format!("Malformed tool arguments: {e}")))
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, GenieError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| GenieError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, GenieError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            GenieError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
