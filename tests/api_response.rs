use runix_chat::api::models::ChatRequest;
use runix_chat::api::response::{api_error, extract_error, extract_message};
use runix_chat::error::RunixError;
use runix_chat::models::{Agent, Author, Message};
use serde_json::json;

#[test]
fn test_extract_message_with_content() {
    let response = json!({
        "message": { "id": 0, "author": "AI", "content": "Define the primary endpoint first." }
    });

    let message = extract_message(&response).unwrap();
    assert_eq!(message.content, "Define the primary endpoint first.");
    assert_eq!(message.author.as_deref(), Some("AI"));
}

#[test]
fn test_extract_message_missing() {
    let response = json!({ "reply": "legacy shape" });
    assert!(extract_message(&response).is_err());
}

#[test]
fn test_extract_message_reports_backend_error() {
    let response = json!({ "error": "Missing OpenAI API key" });
    let err = extract_message(&response).unwrap_err();
    assert_eq!(err.to_string(), "Missing OpenAI API key");
}

#[test]
fn test_extract_error_stringifies_objects() {
    assert_eq!(
        extract_error(&json!({ "error": { "detail": "bad" } })),
        Some(r#"{"detail":"bad"}"#.to_string())
    );
    assert_eq!(extract_error(&json!({ "error": null })), None);
    assert_eq!(extract_error(&json!({ "message": {} })), None);
}

#[test]
fn test_api_error_prefers_backend_error_text() {
    match api_error(401, r#"{"error":"Missing OpenAI API key"}"#) {
        RunixError::ApiError { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Missing OpenAI API key");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    match api_error(502, "Bad Gateway") {
        RunixError::ApiError { message, .. } => assert_eq!(message, "Bad Gateway"),
        other => panic!("unexpected error: {:?}", other),
    }

    match api_error(500, "  ") {
        RunixError::ApiError { message, .. } => assert_eq!(message, "Unknown error"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_chat_request_wire_shape() {
    let request = ChatRequest {
        messages: vec![Message::new(1, Author::User, "Hello")],
        agent: Agent::Falcon,
        stream: true,
        temperature: None,
        max_output_tokens: Some(800),
    };

    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(body["agent"], "falcon");
    assert_eq!(body["stream"], true);
    assert_eq!(body["max_output_tokens"], 800);
    assert!(body.get("temperature").is_none());

    let message = &body["messages"][0];
    assert_eq!(message["id"], 1);
    assert_eq!(message["author"], "User");
    assert_eq!(message["content"], "Hello");
    assert!(message["createdAt"].is_string());
}
