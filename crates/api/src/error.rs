//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::ServiceError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The endpoint needs a signed-in user.
    Unauthorized(String),
    /// Cart or checkout service error.
    Service(ServiceError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Service(err) => service_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    match &err {
        ServiceError::InvalidArgument(_) | ServiceError::EmptyCart => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ServiceError::ProductNotFound(_)
        | ServiceError::CartNotFound
        | ServiceError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Conflict => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::Store(store_err) => {
            tracing::error!(error = %store_err, "store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal storage error".to_string(),
            )
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, ProductId};
    use store::StoreError;

    fn status_of(err: ServiceError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_service_error_status_codes() {
        assert_eq!(
            status_of(ServiceError::InvalidArgument("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ServiceError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(ServiceError::ProductNotFound(ProductId::new("x"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(ServiceError::CartNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ServiceError::OrderNotFound(OrderId::generate())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(ServiceError::Conflict), StatusCode::CONFLICT);
        assert_eq!(
            status_of(ServiceError::Store(StoreError::Unavailable("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    async fn body_of(err: ApiError) -> serde_json::Value {
        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_internal_details_stay_in_logs() {
        let store_err = ServiceError::Store(StoreError::Unavailable("db at 10.0.0.5".into()));
        assert_eq!(
            body_of(store_err.into()).await["error"],
            "Internal storage error"
        );
        assert_eq!(
            body_of(ApiError::Internal("rng exhausted".into())).await["error"],
            "Internal server error"
        );
    }

    #[test]
    fn test_unauthorized_status() {
        let response = ApiError::Unauthorized("sign in".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
