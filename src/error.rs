use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Terminal request outcomes. Every handler failure is one of these kinds;
/// there are no retries anywhere in the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid payload")]
    Validation(Vec<String>),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid credentials")]
    Authentication,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn from_validation(errs: ValidationErrors) -> Self {
        ApiError::Validation(validation_messages(&errs))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(messages) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": messages })),
            )
                .into_response(),
            ApiError::NotFound(msg) | ApiError::Conflict(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Authentication => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid credentials" })),
            )
                .into_response(),
            ApiError::Internal(source) => {
                // Detail stays server-side; the client gets a generic body.
                tracing::error!(error = %source, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

/// One human-readable message per failing field, first violated constraint
/// wins. Sorted because `ValidationErrors` iterates a HashMap.
pub fn validation_messages(errs: &ValidationErrors) -> Vec<String> {
    let mut messages = Vec::new();
    for (field, kind) in errs.errors() {
        if let ValidationErrorsKind::Field(failures) = kind {
            if let Some(failure) = failures.first() {
                messages.push(match failure.code.as_ref() {
                    "required" => format!("field {field} is a required field"),
                    "email" => format!("field {field} is not a valid email"),
                    _ => format!("field {field} is not valid"),
                });
            }
        }
    }
    messages.sort();
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_422() {
        let resp = ApiError::Validation(vec!["field email is a required field".into()])
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn not_found_and_conflict_map_to_400() {
        let resp = ApiError::NotFound("user not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::Conflict("user already exists".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn authentication_maps_to_400() {
        let resp = ApiError::Authentication.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_maps_to_500() {
        let resp = ApiError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
