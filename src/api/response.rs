use crate::api::models::ReplyMessage;
use crate::error::{Result, RunixError};
use serde_json::Value;

/// Pull the assistant message out of a non-streaming `/api/chat` body.
pub fn extract_message(response_json: &Value) -> Result<ReplyMessage> {
    if let Some(error) = extract_error(response_json) {
        return Err(RunixError::Other(error));
    }

    let message = response_json
        .get("message")
        .ok_or_else(|| RunixError::Other("No message in response".to_string()))?;

    Ok(serde_json::from_value(message.clone())?)
}

/// The backend reports failures as `{ "error": ... }`; non-string errors are
/// stringified as JSON.
pub fn extract_error(response_json: &Value) -> Option<String> {
    match response_json.get("error")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Turn a non-2xx body into an `ApiError`, preferring the backend's own
/// error text over the raw body.
pub fn api_error(status: u16, body: &str) -> RunixError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| extract_error(&v))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.trim().to_string()
            }
        });
    RunixError::ApiError { status, message }
}
