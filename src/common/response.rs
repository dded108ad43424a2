use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Reason phrase used when a status has no canonical one
pub const UNKNOWN_REASON: &str = "Unknown Status";

/// JSON body returned for every failed request
///
/// The serialized keys (`timestamp`, `status`, `error`, `message`, `path`)
/// are a wire contract with existing clients.
///
/// # Example
/// ```
/// use axum::http::StatusCode;
/// use error_advice::common::ErrorResponse;
///
/// let body = ErrorResponse::new(
///     "Mar 7, 2015 2:5:9 PM",
///     StatusCode::CONFLICT,
///     "The saved value already exists.",
///     "http://localhost/users",
/// );
/// assert_eq!(body.status_code(), "409");
/// assert_eq!(body.status_reason(), "Conflict");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    timestamp: String,

    #[serde(rename = "status")]
    status_code: String,

    #[serde(rename = "error")]
    status_reason: String,

    message: String,

    path: String,
}

impl ErrorResponse {
    pub fn new(
        timestamp: impl Into<String>,
        status: StatusCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            status_code: status.as_u16().to_string(),
            status_reason: reason_phrase(status).to_string(),
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn status_code(&self) -> &str {
        &self.status_code
    }

    pub fn status_reason(&self) -> &str {
        &self.status_reason
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Standard reason phrase of a status, e.g. `Bad Request` for 400
pub fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or(UNKNOWN_REASON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_keys() {
        let body = ErrorResponse::new(
            "Mar 7, 2015 2:5:9 PM",
            StatusCode::BAD_REQUEST,
            "An invalid value was sent or requested.",
            "http://localhost:8080/users/7",
        );

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "timestamp": "Mar 7, 2015 2:5:9 PM",
                "status": "400",
                "error": "Bad Request",
                "message": "An invalid value was sent or requested.",
                "path": "http://localhost:8080/users/7",
            })
        );
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(reason_phrase(StatusCode::CONFLICT), "Conflict");
        assert_eq!(
            reason_phrase(StatusCode::from_u16(599).unwrap()),
            UNKNOWN_REASON
        );
    }

    #[tokio::test]
    async fn test_into_response_is_json() {
        let body = ErrorResponse::new("now", StatusCode::CONFLICT, "dup", "http://h/p");
        let response = (StatusCode::CONFLICT, body.clone()).into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let decoded: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, body);
    }
}
