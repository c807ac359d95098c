//! Responses emitted by the control plugin.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status value marking a successful execution.
pub const SUCCESS_STATUS: &str = "success";

/// Message reported when a failure response omits its `error` field.
pub const DEFAULT_ERROR_MESSAGE: &str = "Unknown error";

/// Message sent from the control plugin in reply to a request.
///
/// Fields accept any JSON value. Any `status` other than the string
/// [`SUCCESS_STATUS`], including a missing or non-string one, denotes
/// failure. Non-string `output` and `error` values are rendered as JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Execution status reported by the plugin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    /// Captured output of a successful execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error detail of a failed execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// Interpreted result of a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The plugin executed the code; carries its output.
    Success(String),
    /// The plugin rejected or failed the code; carries its error text.
    Failure(String),
}

impl Response {
    /// Builds a success response carrying `output`.
    #[must_use]
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            status: Some(Value::from(SUCCESS_STATUS)),
            output: Some(Value::String(output.into())),
            error: None,
        }
    }

    /// Builds a failure response carrying `error`.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: Some(Value::from("error")),
            output: None,
            error: Some(Value::String(error.into())),
        }
    }

    /// Returns true when the status marks success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_ref().and_then(Value::as_str) == Some(SUCCESS_STATUS)
    }

    /// Converts the response into its outcome, applying field defaults.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        if self.is_success() {
            Outcome::Success(self.output.map(render).unwrap_or_default())
        } else {
            Outcome::Failure(
                self.error
                    .map_or_else(|| DEFAULT_ERROR_MESSAGE.to_owned(), render),
            )
        }
    }

    /// Serialises the response as one JSON record.
    ///
    /// # Errors
    ///
    /// Returns an error when serialisation fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn render(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
