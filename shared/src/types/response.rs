//! Backend response bodies

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of a non-2xx response
///
/// The backend is not consistent about `message` vs `error`, and only the
/// OTP verify endpoints report `attemptsLeft`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionBody {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(
        default,
        alias = "remainingAttempts",
        deserialize_with = "lenient_attempts"
    )]
    pub attempts_left: Option<u8>,
}

impl RejectionBody {
    /// Best human-readable text the body carries
    pub fn text(&self) -> Option<&str> {
        fn non_blank(field: &Option<String>) -> Option<&str> {
            field.as_deref().filter(|m| !m.trim().is_empty())
        }
        non_blank(&self.message).or_else(|| non_blank(&self.error))
    }
}

/// Attempts count as a number or numeric string, clamped to `0..=255`
fn lenient_attempts<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let count = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(count.map(|n| n.clamp(0, i64::from(u8::MAX)) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> RejectionBody {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_rejection_with_attempts() {
        let body = parse(r#"{"message":"Invalid OTP","attemptsLeft":2}"#);
        assert_eq!(body.text(), Some("Invalid OTP"));
        assert_eq!(body.attempts_left, Some(2));
    }

    #[test]
    fn test_rejection_alias_and_error_field() {
        let body = parse(r#"{"error":"Locked","remainingAttempts":0}"#);
        assert_eq!(body.text(), Some("Locked"));
        assert_eq!(body.attempts_left, Some(0));
    }

    #[test]
    fn test_blank_message_is_ignored() {
        let body = parse(r#"{"message":"  "}"#);
        assert_eq!(body.text(), None);
    }

    #[test]
    fn test_blank_message_falls_back_to_error() {
        let body = parse(r#"{"message":"","error":"Account locked"}"#);
        assert_eq!(body.text(), Some("Account locked"));
    }

    #[test]
    fn test_attempts_out_of_range_are_clamped() {
        let body = parse(r#"{"message":"Invalid OTP","attemptsLeft":-1}"#);
        assert_eq!(body.text(), Some("Invalid OTP"));
        assert_eq!(body.attempts_left, Some(0));

        assert_eq!(parse(r#"{"attemptsLeft":300}"#).attempts_left, Some(255));
        assert_eq!(parse(r#"{"attemptsLeft":1.0}"#).attempts_left, Some(1));
    }

    #[test]
    fn test_attempts_as_string_or_garbage() {
        assert_eq!(parse(r#"{"attemptsLeft":"2"}"#).attempts_left, Some(2));
        assert_eq!(parse(r#"{"attemptsLeft":" 3 "}"#).attempts_left, Some(3));
        assert_eq!(parse(r#"{"attemptsLeft":"many"}"#).attempts_left, None);
        assert_eq!(parse(r#"{"attemptsLeft":null}"#).attempts_left, None);
        assert_eq!(parse(r#"{"attemptsLeft":[1]}"#).attempts_left, None);
    }
}
