mod types;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{Client, StatusCode};

pub use types::*;

use crate::config::{ApiConfig, ResponseShape};
use crate::core::{
    GeneratedImage, GenerationFailure, GenerationRequest, GenerationResult, ImageGenerator,
    PixelError,
};
use crate::http_client;

/// Client for a hosted text-to-image inference endpoint
pub struct ImageRequestAdapter {
    client: Client,
    endpoint: String,
    token: String,
    shape: ResponseShape,
}

impl ImageRequestAdapter {
    /// Create a new adapter from the API section of the config
    pub fn new(api: &ApiConfig) -> Result<Self, PixelError> {
        let token = api
            .bearer_token()
            .ok_or(PixelError::MissingApiToken)?
            .to_string();

        Ok(Self {
            client: http_client::build(api.timeout())?,
            endpoint: api.endpoint.clone(),
            token,
            shape: api.response_shape,
        })
    }

    /// Build the request body for the configured shape
    pub fn build_request(&self, request: &GenerationRequest) -> InferenceRequest {
        let inputs = request.combined_prompt();

        match self.shape {
            ResponseShape::RawBytes => InferenceRequest::Raw(RawImageRequest {
                inputs,
                options: InferenceOptions {
                    wait_for_model: true,
                },
            }),
            ResponseShape::Base64Json => InferenceRequest::Parameterized(ParameterizedRequest {
                inputs,
                parameters: InferenceParameters {
                    width: request.width_or_default(),
                    height: request.height_or_default(),
                    num_inference_steps: request.inference_steps,
                },
            }),
        }
    }

    /// Perform one request/response cycle. Never retries.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let body = self.build_request(request);

        tracing::debug!(
            "Sending generation request (style: {}, shape: {}, prompt: {} chars)",
            request.style,
            self.shape.as_str(),
            request.prompt.chars().count()
        );

        let response = match self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return GenerationResult::Failure(transport_failure(e)),
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return GenerationResult::Failure(transport_failure(e)),
        };

        tracing::debug!("Response status: {} ({} bytes)", status, bytes.len());

        if !status.is_success() {
            return GenerationResult::Failure(rejection(status, &bytes));
        }

        match self.interpret(&bytes) {
            Some(image) => GenerationResult::Image(image),
            None => {
                tracing::warn!("Endpoint returned {} but the body is not an image", status);
                GenerationResult::Failure(GenerationFailure::undecodable(
                    status.as_u16(),
                    describe_undecodable(&bytes),
                ))
            }
        }
    }

    /// Decode a success body, configured shape first, the other as a fallback
    pub fn interpret(&self, body: &[u8]) -> Option<GeneratedImage> {
        match self.shape {
            ResponseShape::RawBytes => decode_raw(body).or_else(|| decode_encoded_json(body)),
            ResponseShape::Base64Json => decode_encoded_json(body).or_else(|| decode_raw(body)),
        }
    }
}

#[async_trait]
impl ImageGenerator for ImageRequestAdapter {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        ImageRequestAdapter::generate(self, request).await
    }
}

fn transport_failure(err: reqwest::Error) -> GenerationFailure {
    let timed_out = err.is_timeout();
    // The URL is configuration and stays out of messages
    let err = err.without_url();
    tracing::warn!("No response from inference endpoint: {}", err);
    GenerationFailure::transport(timed_out, err.to_string())
}

fn rejection(status: StatusCode, body: &[u8]) -> GenerationFailure {
    let text = String::from_utf8_lossy(body).into_owned();

    match serde_json::from_slice::<ApiErrorResponse>(body) {
        Ok(ApiErrorResponse {
            error,
            estimated_time: Some(eta),
        }) => tracing::warn!("Endpoint rejected request ({}): {} (ready in ~{:.0}s)", status, error, eta),
        Ok(ApiErrorResponse { error, .. }) => {
            tracing::warn!("Endpoint rejected request ({}): {}", status, error)
        }
        Err(_) => tracing::warn!("Endpoint rejected request ({})", status),
    }

    GenerationFailure::rejected(status.as_u16(), text)
}

fn describe_undecodable(body: &[u8]) -> String {
    if body.is_empty() {
        return "empty response body".to_string();
    }
    match serde_json::from_slice::<EncodedImagesResponse>(body) {
        Ok(response) if response.images.is_empty() => "response contained no images".to_string(),
        Ok(_) => "response image could not be decoded".to_string(),
        Err(_) => "response is neither an image nor a JSON image list".to_string(),
    }
}

/// Decode raw image bytes; `None` unless the whole image decodes
pub fn decode_raw(bytes: &[u8]) -> Option<GeneratedImage> {
    let format = image::guess_format(bytes).ok()?;
    let bitmap = image::load_from_memory_with_format(bytes, format).ok()?;

    Some(GeneratedImage {
        bytes: bytes.to_vec(),
        format,
        bitmap,
    })
}

/// Decode the first entry of `{"images": [...]}`
pub fn decode_encoded_json(body: &[u8]) -> Option<GeneratedImage> {
    let response: EncodedImagesResponse = serde_json::from_slice(body).ok()?;
    let first = response.images.first()?;
    let bytes = BASE64.decode(strip_data_uri(first)).ok()?;
    decode_raw(&bytes)
}

/// Drop a `data:<mime>;base64,` prefix, if present
pub fn strip_data_uri(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, payload)| payload).unwrap_or(rest),
        None => trimmed,
    }
}
