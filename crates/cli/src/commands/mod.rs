pub mod config;
pub mod doctor;
pub mod invoke;
pub mod migrate;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::render(0, outcome(command, "ok", None, message.into(), None))
    }

    pub fn success_with_data(command: &str, message: impl Into<String>, data: Value) -> Self {
        Self::render(0, outcome(command, "ok", None, message.into(), Some(data)))
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::render(exit_code, outcome(command, "error", Some(error_class), message.into(), None))
    }

    fn render(exit_code: u8, payload: CommandOutcome) -> Self {
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn outcome(
    command: &str,
    status: &str,
    error_class: Option<&str>,
    message: String,
    data: Option<Value>,
) -> CommandOutcome {
    CommandOutcome {
        command: command.to_string(),
        status: status.to_string(),
        error_class: error_class.map(str::to_string),
        message,
        data,
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            escape_json(&error.to_string())
        )
    })
}

pub(crate) fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
