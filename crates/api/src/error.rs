use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use zoneops_core::error::CoreError;
use zoneops_pipeline::MacroError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`MacroError`] for macro failures and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A macro aborted before or while resolving its inputs.
    #[error(transparent)]
    Macro(#[from] MacroError),

    /// A request body failed its validation rules.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- MacroError variants ---
            AppError::Macro(err) => classify_macro_error(err),

            // --- HTTP-specific errors ---
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                describe_validation(errors),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a macro error into an HTTP status, error code, and message.
///
/// - Input problems map to 400.
/// - Unknown deletion records map to 404.
/// - Remote canvas failures map to 502 with the remote message.
/// - Ledger failures map to 500 with a sanitized message.
fn classify_macro_error(err: &MacroError) -> (StatusCode, &'static str, String) {
    match err {
        MacroError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        MacroError::RecordNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
        MacroError::Remote(remote) => {
            tracing::warn!(error = %remote, "Remote canvas lookup failed");
            (StatusCode::BAD_GATEWAY, "REMOTE_ERROR", err.to_string())
        }
        MacroError::Core(core) => match core {
            CoreError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            CoreError::UnknownWidgetType(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", core.to_string())
            }
        },
        MacroError::Ledger(ledger) => {
            tracing::error!(error = %ledger, "Deletion ledger error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Flatten validator errors into `field: message` pairs.
fn describe_validation(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
