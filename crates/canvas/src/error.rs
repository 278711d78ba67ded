use zoneops_core::widget::WidgetType;

/// Errors from the remote canvas client layer.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The canvas service returned a non-2xx status code.
    #[error("Canvas API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A response body could not be decoded.
    #[error("Failed to decode canvas response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The widget type has no sub-collection endpoint.
    #[error("Widget type {0} cannot be modified through the canvas API")]
    Unsupported(WidgetType),

    /// A created widget's id could not be determined.
    #[error("Created {widget_type} but could not determine its id")]
    MissingId { widget_type: WidgetType },

    /// The client could not be configured.
    #[error("Invalid canvas client configuration: {0}")]
    Config(String),
}

impl CanvasError {
    /// Whether retrying the same call may succeed: transport failures,
    /// server errors and rate limiting.
    pub fn is_transient(&self) -> bool {
        match self {
            CanvasError::Request(e) => !(e.is_builder() || e.is_decode()),
            CanvasError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CanvasError::Api { status: 404, .. })
    }
}
