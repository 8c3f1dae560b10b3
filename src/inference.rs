use std::time::Duration;

use axum::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::InferenceConfig;

/// Canonical binary classification. Upstream variants (boolean, 0/1 ints,
/// free-text tags) all collapse into this pair; anything unrecognized is a
/// decode error, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreeningLabel {
    Depressed,
    NotDepressed,
}

impl ScreeningLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreeningLabel::Depressed => "depressed",
            ScreeningLabel::NotDepressed => "not_depressed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub label: ScreeningLabel,
    pub confidence: f64,
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("inference API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unrecognized inference response: {0}")]
    Decode(String),
}

impl InferenceError {
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            InferenceError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn classify(
        &self,
        file_name: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<Prediction, InferenceError>;
}

/// Wire shape of the model service response. Decoded strictly: `result`
/// must be one of the two known tags and `confidence` must be present.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    result: RawLabel,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawLabel {
    Depresi,
    Normal,
}

impl From<RawLabel> for ScreeningLabel {
    fn from(raw: RawLabel) -> Self {
        match raw {
            RawLabel::Depresi => ScreeningLabel::Depressed,
            RawLabel::Normal => ScreeningLabel::NotDepressed,
        }
    }
}

pub struct HttpInference {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpInference {
    pub fn new(cfg: &InferenceConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http_client,
            endpoint: cfg.url.clone(),
        })
    }
}

#[async_trait]
impl InferenceClient for HttpInference {
    async fn classify(
        &self,
        file_name: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<Prediction, InferenceError> {
        let part = reqwest::multipart::Part::stream(body)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| InferenceError::Network(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;
        let decoded: PredictResponse =
            serde_json::from_str(&text).map_err(|e| InferenceError::Decode(e.to_string()))?;

        let prediction = Prediction {
            label: decoded.result.into(),
            confidence: decoded.confidence,
        };
        debug!(label = prediction.label.as_str(), confidence = prediction.confidence, "inference response");
        Ok(prediction)
    }
}
