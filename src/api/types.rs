use serde::{Deserialize, Serialize};

/// Request body for endpoints that answer with raw image bytes
#[derive(Debug, Serialize)]
pub struct RawImageRequest {
    pub inputs: String,
    pub options: InferenceOptions,
}

#[derive(Debug, Serialize)]
pub struct InferenceOptions {
    /// Block until a cold model is loaded instead of failing fast
    pub wait_for_model: bool,
}

/// Request body for endpoints that answer with base64 images in JSON
#[derive(Debug, Serialize)]
pub struct ParameterizedRequest {
    pub inputs: String,
    pub parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
pub struct InferenceParameters {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_inference_steps: Option<u32>,
}

/// Either request body, serialized without a wrapper
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InferenceRequest {
    Raw(RawImageRequest),
    Parameterized(ParameterizedRequest),
}

/// JSON success body carrying base64 images, optionally as data URIs
#[derive(Debug, Deserialize)]
pub struct EncodedImagesResponse {
    #[serde(default)]
    pub images: Vec<String>,
}

/// Error body some endpoints send with non-success statuses
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    /// Seconds until a cold model is expected to be ready
    pub estimated_time: Option<f64>,
}
