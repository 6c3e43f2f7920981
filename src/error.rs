use std::error::Error;
use std::fmt;
use wasm_bindgen::JsValue;

/// Failures surfaced to the driver as rejected promises.
///
/// "Element not found" is deliberately absent: resolution operations report
/// it as `Ok(None)` so the driver can retry without treating it as a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeError {
    InvalidSelector { selector: String, error: String },
    InvalidPattern { pattern: String, error: String },
    InvalidNode { message: String },
    ResourceFailed { message: String },
    SerializationError { message: String },
    JsError { message: String },
}

impl ProbeError {
    pub(crate) fn invalid_node(message: impl Into<String>) -> Self {
        ProbeError::InvalidNode { message: message.into() }
    }

    pub(crate) fn pattern(pattern: &str, err: JsValue) -> Self {
        ProbeError::InvalidPattern {
            pattern: pattern.to_string(),
            error: describe(&err),
        }
    }

    pub(crate) fn selector(selector: &str, err: JsValue) -> Self {
        ProbeError::InvalidSelector {
            selector: selector.to_string(),
            error: describe(&err),
        }
    }

    /// Wraps a rejected load/fetch promise without altering its reason.
    pub(crate) fn resource(err: JsValue) -> Self {
        ProbeError::ResourceFailed { message: describe(&err) }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::InvalidSelector { selector, error } => write!(f, "InvalidSelector: Invalid selector '{}'. Details: {}", selector, error),
            ProbeError::InvalidPattern { pattern, error } => write!(f, "InvalidPattern: Invalid pattern '{}'. Details: {}", pattern, error),
            ProbeError::InvalidNode { message } => write!(f, "InvalidNode: {}", message),
            ProbeError::ResourceFailed { message } => write!(f, "ResourceFailed: {}", message),
            ProbeError::SerializationError { message } => write!(f, "SerializationError: {}", message),
            ProbeError::JsError { message } => write!(f, "JsError: {}", message),
        }
    }
}

impl Error for ProbeError {}

impl From<JsValue> for ProbeError {
    fn from(value: JsValue) -> Self {
        ProbeError::JsError { message: describe(&value) }
    }
}

impl From<ProbeError> for JsValue {
    fn from(err: ProbeError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

// Thrown DOMExceptions and Error objects are not strings, so pull their message out.
fn describe(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| {
            js_sys::Reflect::get(value, &JsValue::from_str("type"))
                .ok()
                .and_then(|t| t.as_string())
                .map(|t| format!("{} event", t))
        })
        .unwrap_or_else(|| "Unknown JsValue error".to_string())
}
