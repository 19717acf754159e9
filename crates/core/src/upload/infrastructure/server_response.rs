use serde::Deserialize;
use serde_json::Value;

use crate::shared::constants::ENROLLMENT_CONFIRMATION;
use crate::upload::domain::upload_payload::{ServerAck, UploadError};

const UNKNOWN_ERROR: &str = "Unknown error";
const HTTP_OK: u16 = 200;

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    message: Option<Value>,
}

fn parse(body: &str) -> Option<ResponseBody> {
    serde_json::from_str(body).ok()
}

/// JSON-style truthiness: `false`, `null`, `0`, `""`, `[]` and `{}` are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn rejection(body: Option<&ResponseBody>) -> UploadError {
    let message = match body.and_then(|b| b.message.as_ref()) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN_ERROR.to_string(),
        Some(other) => other.to_string(),
    };
    UploadError::ServerRejection(message)
}

/// Accept only HTTP 200 with a truthy `success` and a `username`.
pub fn interpret_login(status: u16, body: &str) -> Result<ServerAck, UploadError> {
    let parsed = parse(body);
    match &parsed {
        Some(ResponseBody {
            success,
            username: Some(username),
            ..
        }) if status == HTTP_OK && is_truthy(success) => Ok(ServerAck::Identity(username.clone())),
        _ => Err(rejection(parsed.as_ref())),
    }
}

/// Accept any HTTP 200, whatever the body says.
pub fn interpret_enrollment(status: u16, body: &str) -> Result<ServerAck, UploadError> {
    if status == HTTP_OK {
        return Ok(ServerAck::Enrolled(ENROLLMENT_CONFIRMATION.to_string()));
    }
    Err(rejection(parse(body).as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rejected_with(result: Result<ServerAck, UploadError>) -> String {
        match result {
            Err(UploadError::ServerRejection(message)) => message,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_login_success_yields_username() {
        let ack = interpret_login(200, r#"{"success": true, "username": "alice"}"#).unwrap();
        assert_eq!(ack, ServerAck::Identity("alice".into()));
    }

    #[rstest]
    #[case::no_match(200, r#"{"success": false, "message": "no match"}"#, "no match")]
    #[case::missing_message(200, r#"{"success": false}"#, "Unknown error")]
    #[case::missing_username(200, r#"{"success": true}"#, "Unknown error")]
    #[case::not_json(200, "<html>oops</html>", "Unknown error")]
    #[case::server_error(500, r#"{"success": true, "username": "alice", "message": "boom"}"#, "boom")]
    #[case::null_message(401, r#"{"message": null}"#, "Unknown error")]
    fn test_login_rejections(#[case] status: u16, #[case] body: &str, #[case] expected: &str) {
        assert_eq!(rejected_with(interpret_login(status, body)), expected);
    }

    #[rstest]
    #[case::one(r#"{"success": 1, "username": "bob"}"#)]
    #[case::text(r#"{"success": "yes", "username": "bob"}"#)]
    fn test_login_success_is_truthy(#[case] body: &str) {
        assert_eq!(
            interpret_login(200, body).unwrap(),
            ServerAck::Identity("bob".into())
        );
    }

    #[test]
    fn test_enrollment_accepts_any_200() {
        for body in ["", "not json", r#"{"success": false}"#] {
            assert_eq!(
                interpret_enrollment(200, body).unwrap(),
                ServerAck::Enrolled(ENROLLMENT_CONFIRMATION.into())
            );
        }
    }

    #[rstest]
    #[case::with_message(400, r#"{"message": "username taken"}"#, "username taken")]
    #[case::without_message(503, "", "Unknown error")]
    fn test_enrollment_rejections(#[case] status: u16, #[case] body: &str, #[case] expected: &str) {
        assert_eq!(rejected_with(interpret_enrollment(status, body)), expected);
    }
}
