use crate::SkyflowError;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub request_id: Option<String>,
    /// Parsed JSON, or the raw text as a JSON string when the body is not JSON.
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<T, SkyflowError> {
        serde_json::from_value(self.body)
            .map_err(|e| SkyflowError::InvalidResponse(format!("Invalid response: {}", e)))
    }
}

/// HTTP collaborator used for every vault and connection call.
///
/// Implementations own retries, header merging and mapping of non-2xx
/// statuses to [`SkyflowError::Api`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, SkyflowError>;
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn parse_body(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, SkyflowError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SkyflowError::RequestError(e.to_string()))?;

        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let success = response.status().is_success();
        let text = response
            .text()
            .await
            .map_err(|e| SkyflowError::RequestError(e.to_string()))?;

        if !success {
            let (message, details) = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => (envelope.error.message, envelope.error.details),
                Err(_) => (text, None),
            };
            tracing::debug!(status, request_id = ?request_id, "Vault returned error status");
            return Err(SkyflowError::Api {
                status,
                message,
                request_id,
                details,
            });
        }

        Ok(ApiResponse {
            status,
            request_id,
            body: parse_body(&text),
        })
    }
}
