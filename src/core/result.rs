use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use std::fmt;

/// A fully decoded image returned by the inference endpoint
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Encoded bytes as received (after base64 / data-URI unwrapping)
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`
    pub format: ImageFormat,
    /// Decoded pixels
    pub bitmap: DynamicImage,
}

impl GeneratedImage {
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn format_name(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::WebP => "webp",
            ImageFormat::Gif => "gif",
            _ => "other",
        }
    }
}

/// Why a generation call did not yield an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The endpoint answered with a non-success status
    Rejected { status: u16 },
    /// The endpoint answered with success but the body was not an image
    Undecodable { status: u16 },
    /// No response was received
    Transport { timed_out: bool },
}

/// Failure side of a generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationFailure {
    #[serde(flatten)]
    pub kind: FailureKind,
    pub message: String,
}

impl GenerationFailure {
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Rejected { status },
            message: body.into(),
        }
    }

    pub fn undecodable(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Undecodable { status },
            message: message.into(),
        }
    }

    pub fn transport(timed_out: bool, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport { timed_out },
            message: message.into(),
        }
    }

    /// HTTP status, if a response was received at all
    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            FailureKind::Rejected { status } | FailureKind::Undecodable { status } => Some(status),
            FailureKind::Transport { .. } => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.kind, FailureKind::Transport { .. })
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Rejected { status } => write!(f, "API Error {}: {}", status, self.message),
            FailureKind::Undecodable { status } => {
                write!(f, "Could not interpret response (HTTP {}): {}", status, self.message)
            }
            FailureKind::Transport { timed_out: true } => {
                write!(f, "Inference endpoint timed out: {}", self.message)
            }
            FailureKind::Transport { timed_out: false } => {
                write!(f, "Could not reach inference endpoint: {}", self.message)
            }
        }
    }
}

/// Outcome of exactly one generation call
#[derive(Debug, Clone)]
pub enum GenerationResult {
    Image(GeneratedImage),
    Failure(GenerationFailure),
}

#[cfg(test)]
impl GenerationResult {
    pub fn image(self) -> Option<GeneratedImage> {
        match self {
            GenerationResult::Image(image) => Some(image),
            GenerationResult::Failure(_) => None,
        }
    }

    pub fn failure(self) -> Option<GenerationFailure> {
        match self {
            GenerationResult::Image(_) => None,
            GenerationResult::Failure(failure) => Some(failure),
        }
    }
}
