use askwhy_retrieval::RetrievalError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("upstream provider failed: {0}")]
    BadGateway(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::MalformedInput(msg) => ApiError::BadRequest(msg),
            RetrievalError::StoreUnavailable => ApiError::ServiceUnavailable(
                "the message store has not been built yet".to_string(),
            ),
            RetrievalError::EmptyBuild { attempted: 0 } => {
                ApiError::BadRequest("the corpus contains no messages".to_string())
            }
            err @ RetrievalError::EmptyBuild { .. } => ApiError::BadGateway(err.to_string()),
            err if err.is_provider_error() => ApiError::BadGateway(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => msg,
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askwhy_embeddings::EmbeddingError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                RetrievalError::MalformedInput("question cannot be empty".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (RetrievalError::StoreUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                RetrievalError::EmbeddingProvider(EmbeddingError::EmptyInput),
                StatusCode::BAD_GATEWAY,
            ),
            (
                RetrievalError::GenerationProvider("model offline".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (RetrievalError::EmptyBuild { attempted: 4 }, StatusCode::BAD_GATEWAY),
            (RetrievalError::EmptyBuild { attempted: 0 }, StatusCode::BAD_REQUEST),
            (
                RetrievalError::DimensionMismatch {
                    expected: 3,
                    actual: 2,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_bad_request_keeps_message() {
        let err = ApiError::from(RetrievalError::MalformedInput(
            "question cannot be empty".to_string(),
        ));
        assert_eq!(err.to_string(), "bad request: question cannot be empty");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
