use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixelError {
    #[error("API token not configured. Set HF_API_TOKEN environment variable or run: pixelgenius config set api.token <your-token>")]
    MissingApiToken,

    #[error("Please enter a prompt")]
    EmptyPrompt,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
