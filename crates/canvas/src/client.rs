//! HTTP implementation of [`CanvasApi`].
//!
//! All endpoints live under `{server}/api/v1/canvases/{canvas_id}` and are
//! authenticated with a `Private-Token` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use zoneops_core::types::WidgetId;
use zoneops_core::widget::{Widget, WidgetType, Zone};

use crate::api::CanvasApi;
use crate::error::CanvasError;

/// HTTP timeout for a single canvas request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for one canvas.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Base server URL, e.g. `https://canvas.example.com`.
    pub server_url: String,
    pub canvas_id: String,
    pub api_token: String,
    pub request_timeout: Duration,
}

/// HTTP client bound to a single canvas.
#[derive(Debug)]
pub struct HttpCanvasClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCanvasClient {
    pub fn new(config: &CanvasConfig) -> Result<Self, CanvasError> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&config.api_token)
            .map_err(|_| CanvasError::Config("API token is not a valid header value".into()))?;
        headers.insert(HeaderName::from_static("private-token"), token);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`]. The caller
    /// is responsible for its authentication headers.
    pub fn with_client(client: reqwest::Client, config: &CanvasConfig) -> Self {
        Self {
            client,
            base_url: canvas_base_url(&config.server_url, &config.canvas_id),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, widget_type: WidgetType) -> Result<String, CanvasError> {
        let collection = widget_type
            .collection()
            .ok_or(CanvasError::Unsupported(widget_type))?;
        Ok(format!("{}/{collection}", self.base_url))
    }

    async fn get_widget_list(&self, url: String) -> Result<Vec<Widget>, CanvasError> {
        let response = self.client.get(url).send().await?;
        let values: Vec<Value> = Self::parse_response(response).await?;
        Ok(decode_widgets(values))
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, otherwise turn it
    /// into a [`CanvasError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CanvasError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CanvasError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CanvasError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), CanvasError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CanvasApi for HttpCanvasClient {
    async fn list_widgets(&self) -> Result<Vec<Widget>, CanvasError> {
        self.get_widget_list(format!("{}/widgets", self.base_url))
            .await
    }

    async fn list_collection(&self, widget_type: WidgetType) -> Result<Vec<Widget>, CanvasError> {
        let url = self.collection_url(widget_type)?;
        self.get_widget_list(url).await
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone, CanvasError> {
        let response = self
            .client
            .get(format!("{}/anchors/{zone_id}", self.base_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn list_zones(&self) -> Result<Vec<Zone>, CanvasError> {
        let response = self
            .client
            .get(format!("{}/anchors", self.base_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn create_widget(&self, payload: &Widget) -> Result<Option<WidgetId>, CanvasError> {
        let url = self.collection_url(payload.widget_type)?;
        let response = self.client.post(url).json(payload).send().await?;
        let response = Self::ensure_success(response).await?;

        // Some deployments answer a create with an empty body.
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let body: Value = serde_json::from_str(&text)?;
        Ok(extract_id(&body))
    }

    async fn update_widget(
        &self,
        widget_type: WidgetType,
        widget_id: &str,
        fields: &Value,
    ) -> Result<(), CanvasError> {
        let url = format!("{}/{widget_id}", self.collection_url(widget_type)?);
        let response = self.client.patch(url).json(fields).send().await?;
        Self::check_status(response).await
    }

    async fn delete_widget(&self, widget_type: WidgetType, widget_id: &str) -> Result<(), CanvasError> {
        let url = format!("{}/{widget_id}", self.collection_url(widget_type)?);
        let response = self.client.delete(url).send().await?;
        Self::check_status(response).await
    }
}

/// `{server}/api/v1/canvases/{canvas_id}` without a trailing slash.
fn canvas_base_url(server_url: &str, canvas_id: &str) -> String {
    format!(
        "{}/api/v1/canvases/{canvas_id}",
        server_url.trim_end_matches('/')
    )
}

/// Decode listing records, dropping any whose type is not recognised.
pub(crate) fn decode_widgets(values: Vec<Value>) -> Vec<Widget> {
    values
        .into_iter()
        .filter_map(|value| match Widget::from_value(value) {
            Ok(widget) => Some(widget),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unrecognised widget record");
                None
            }
        })
        .collect()
}

/// Id from a create response; the service may return it as a string or a
/// number.
pub(crate) fn extract_id(body: &Value) -> Option<WidgetId> {
    match body.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn config() -> CanvasConfig {
        CanvasConfig {
            server_url: "https://canvas.example.com/".into(),
            canvas_id: "c-123".into(),
            api_token: "secret".into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[test]
    fn base_url_is_canvas_scoped() {
        let client = HttpCanvasClient::new(&config()).unwrap();
        assert_eq!(
            client.base_url(),
            "https://canvas.example.com/api/v1/canvases/c-123"
        );
    }

    #[test]
    fn collection_urls_follow_widget_type() {
        let client = HttpCanvasClient::new(&config()).unwrap();
        assert_eq!(
            client.collection_url(WidgetType::Pdf).unwrap(),
            "https://canvas.example.com/api/v1/canvases/c-123/pdfs"
        );
        assert_matches!(
            client.collection_url(WidgetType::SharedCanvas),
            Err(CanvasError::Unsupported(WidgetType::SharedCanvas))
        );
    }

    #[test]
    fn invalid_token_is_a_config_error() {
        let mut cfg = config();
        cfg.api_token = "bad\ntoken".into();
        assert_matches!(HttpCanvasClient::new(&cfg), Err(CanvasError::Config(_)));
    }

    #[test]
    fn unknown_types_are_skipped_when_decoding() {
        let widgets = decode_widgets(vec![
            json!({"id": "1", "widget_type": "Note"}),
            json!({"id": "2", "widget_type": "Hologram"}),
            json!({"id": "3"}),
            json!({"id": "4", "widget_type": "Connector", "src": {"id": "1"}, "dst": {"id": "9"}}),
        ]);
        let ids: Vec<&str> = widgets.iter().filter_map(Widget::id).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn id_extraction_accepts_strings_and_numbers() {
        assert_eq!(extract_id(&json!({"id": "abc"})), Some("abc".into()));
        assert_eq!(extract_id(&json!({"id": 42})), Some("42".into()));
        assert_eq!(extract_id(&json!({"id": ""})), None);
        assert_eq!(extract_id(&json!({"title": "x"})), None);
    }
}
