use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::params::ParameterSet;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Upstream returned status: {0}")]
    StatusError(StatusCode),

    #[error("No image returned")]
    NoImages,

    #[error("Image decode error: {0}")]
    DecodeError(String),
}

#[derive(Debug, Deserialize)]
struct GenerationEnvelope {
    #[serde(default)]
    images: Option<Vec<String>>,
}

/// Client for the txt2img backend.
pub struct UpstreamClient {
    client: Client,
    url: String,
}

impl UpstreamClient {
    /// Image synthesis can take arbitrarily long, so no request timeout is set.
    pub fn new(url: impl Into<String>) -> Result<Self, UpstreamError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Post the parameters and return the first generated image.
    pub async fn generate(&self, params: &ParameterSet) -> Result<Vec<u8>, UpstreamError> {
        log::debug!("Posting generation request to {}", self.url);

        let response = self.client.post(&self.url).json(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<failed to read body>".to_string());
            log::error!("Upstream request failed with status: {}. Body: {}", status, body);
            return Err(UpstreamError::StatusError(status));
        }

        let envelope = response
            .json::<GenerationEnvelope>()
            .await
            .map_err(|e| UpstreamError::DecodeError(format!("Invalid response envelope: {}", e)))?;

        decode_first_image(envelope.images.as_deref().unwrap_or_default())
    }
}

/// Decode the first base64 payload, dropping any `data:...;base64,` header.
pub fn decode_first_image(images: &[String]) -> Result<Vec<u8>, UpstreamError> {
    let first = images.first().ok_or(UpstreamError::NoImages)?;

    let payload = match first.split_once(',') {
        Some((_, data)) => data,
        None => first.as_str(),
    };
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    STANDARD
        .decode(payload)
        .map_err(|e| UpstreamError::DecodeError(format!("Invalid base64 image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_base64() {
        let bytes = decode_first_image(&images(&["aGVsbG8="])).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn data_uri_header_is_stripped() {
        let bytes = decode_first_image(&images(&["data:image/png;base64,aGVsbG8="])).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn only_the_first_image_is_used() {
        let bytes = decode_first_image(&images(&["Zmlyc3Q=", "c2Vjb25k"])).unwrap();
        assert_eq!(bytes, b"first");
    }

    #[test]
    fn line_wrapped_payload_is_accepted() {
        let bytes = decode_first_image(&images(&["aGVs\nbG8="])).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn empty_list_is_no_images() {
        assert!(matches!(decode_first_image(&[]), Err(UpstreamError::NoImages)));
    }

    #[test]
    fn malformed_base64_is_a_decode_error() {
        let result = decode_first_image(&images(&["data:image/png;base64,!!not base64!!"]));
        assert!(matches!(result, Err(UpstreamError::DecodeError(_))));
    }
}
