use crate::{FilekitError, Result};
use serde_json::Value;

/// Two-space indented JSON with the input's key order.
pub fn format_json(text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| FilekitError::invalid(format!("invalid JSON: {e}")))?;
    serde_json::to_string_pretty(&value)
        .map_err(|e| FilekitError::invalid(format!("invalid JSON: {e}")))
}
