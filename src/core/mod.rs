pub mod archive;
pub mod batch;
pub mod enhance;
pub mod error;
pub mod history;
pub mod params;
pub mod result;

pub use batch::{generate_batch, BatchMode, BatchOutcome, ImageGenerator};
pub use enhance::EnhancementSettings;
pub use error::PixelError;
pub use history::PromptHistory;
pub use params::{GenerationRequest, Style};
pub use result::{GeneratedImage, GenerationFailure, GenerationResult};
