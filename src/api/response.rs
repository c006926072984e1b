use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Response timestamp
    pub timestamp: DateTime<Utc>,
    /// Request metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

/// Additional metadata about the response
#[derive(Debug, Default, Serialize)]
pub struct ResponseMetadata {
    /// Processing duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Model size as submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Add processing duration to metadata
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        let metadata = self.metadata.take().unwrap_or_default();
        self.metadata = Some(ResponseMetadata {
            duration_ms: Some(duration_ms),
            ..metadata
        });
        self
    }

    /// Add model dimensions to metadata
    pub fn with_model_size(mut self, variables: usize, constraints: usize) -> Self {
        let metadata = self.metadata.take().unwrap_or_default();
        self.metadata = Some(ResponseMetadata {
            variables: Some(variables),
            constraints: Some(constraints),
            ..metadata
        });
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let response = ApiResponse::success("test data");
        assert!(response.success);
        assert_eq!(response.data, Some("test data"));
        assert!(response.metadata.is_none());
    }

    #[test]
    fn test_response_with_metadata() {
        let response = ApiResponse::success("data")
            .with_model_size(2, 3)
            .with_duration(50);

        let metadata = response.metadata.unwrap();
        assert_eq!(metadata.duration_ms, Some(50));
        assert_eq!(metadata.variables, Some(2));
        assert_eq!(metadata.constraints, Some(3));
    }

    #[test]
    fn test_metadata_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ApiResponse::success(1).with_duration(7)).unwrap();
        assert_eq!(json["metadata"]["duration_ms"], 7);
        assert!(json["metadata"].get("variables").is_none());
    }
}
