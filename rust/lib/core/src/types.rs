use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Uniform result of a CRUD action.
///
/// Serialized as `{success, data?, error?, statusCode?}` with absent
/// fields omitted. Authentication absence is never expressed as an
/// `ActionResult`; it travels as `Err(ServiceError::Unauthorized)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl<T: Serialize> ActionResult<T> {
    /// Success carrying data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status_code: None,
        }
    }

    /// Success with nothing to return (e.g. delete).
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            status_code: None,
        }
    }

    /// Validation failure (status 400).
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::fail(message, 400)
    }

    /// Not found, or not owned by the caller (status 404).
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::fail(message, 404)
    }

    pub fn fail(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            status_code: Some(status_code),
        }
    }
}

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Current time, truncated to the millisecond precision we persist.
pub fn now_utc() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Format a timestamp for storage: RFC 3339, UTC, milliseconds.
///
/// Fixed width, so stored values sort lexicographically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }

    #[test]
    fn test_format_timestamp() {
        let ts = DateTime::parse_from_rfc3339("2025-12-31T08:05:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(&ts), "2025-12-31T08:05:00.000Z");
    }

    #[test]
    fn failure_shape_omits_data() {
        let result: ActionResult<String> = ActionResult::not_found("Todo not found");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "Todo not found", "statusCode": 404})
        );
    }

    #[test]
    fn success_shape_omits_error() {
        let json = serde_json::to_value(ActionResult::ok(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2]}));

        let json = serde_json::to_value(ActionResult::<()>::done()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }
}
