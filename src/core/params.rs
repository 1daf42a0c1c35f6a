use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::PixelError;

/// Default edge length for generated images
pub const DEFAULT_DIMENSION: u32 = 1024;

/// Upper bound on images requested in one batch
pub const MAX_IMAGES: u8 = 4;

/// Artistic style blended into the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    Realistic,
    Anime,
    Sketch,
    Cyberpunk,
    #[serde(rename = "3d_art")]
    ThreeDArt,
    Cartoon,
    DigitalPainting,
}

impl Style {
    pub fn all() -> &'static [Style] {
        &[
            Style::Realistic,
            Style::Anime,
            Style::Sketch,
            Style::Cyberpunk,
            Style::ThreeDArt,
            Style::Cartoon,
            Style::DigitalPainting,
        ]
    }

    /// Human-readable label, as embedded in the prompt
    pub fn label(&self) -> &'static str {
        match self {
            Style::Realistic => "Realistic",
            Style::Anime => "Anime",
            Style::Sketch => "Sketch",
            Style::Cyberpunk => "Cyberpunk",
            Style::ThreeDArt => "3D Art",
            Style::Cartoon => "Cartoon",
            Style::DigitalPainting => "Digital Painting",
        }
    }

    /// Next style in display order, wrapping around
    pub fn next(&self) -> Style {
        let all = Self::all();
        let idx = all.iter().position(|s| s == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    /// Previous style in display order, wrapping around
    pub fn previous(&self) -> Style {
        let all = Self::all();
        let idx = all.iter().position(|s| s == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Style {
    type Err = PixelError;

    /// Accepts labels case-insensitively, ignoring spaces, dashes and underscores
    /// ("3D Art", "3d-art", "digital_painting")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();

        Style::all()
            .iter()
            .copied()
            .find(|style| {
                style
                    .label()
                    .chars()
                    .filter(|c| *c != ' ')
                    .collect::<String>()
                    .to_lowercase()
                    == normalized
            })
            .ok_or_else(|| {
                let valid: Vec<&str> = Style::all().iter().map(|s| s.label()).collect();
                PixelError::InvalidParameter(format!(
                    "Unknown style '{}'. Valid styles: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Parameters for a single image generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The prompt as typed by the user
    pub prompt: String,

    /// Style blended into the prompt
    #[serde(default)]
    pub style: Style,

    /// Requested width in pixels (1024 when unset)
    pub width: Option<u32>,

    /// Requested height in pixels (1024 when unset)
    pub height: Option<u32>,

    /// Denoising steps, quality vs. cost
    pub inference_steps: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: Style::default(),
            width: None,
            height: None,
            inference_steps: None,
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_inference_steps(mut self, steps: u32) -> Self {
        self.inference_steps = Some(steps);
        self
    }

    /// Prompt text sent to the model: the style is prefixed,
    /// `"<style> style - <prompt>"`.
    pub fn combined_prompt(&self) -> String {
        format!("{} style - {}", self.style.label(), self.prompt)
    }

    pub fn width_or_default(&self) -> u32 {
        self.width.unwrap_or(DEFAULT_DIMENSION)
    }

    pub fn height_or_default(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_DIMENSION)
    }

    /// Reject prompts that are empty or whitespace only
    pub fn validate(&self) -> Result<(), PixelError> {
        if self.prompt.trim().is_empty() {
            return Err(PixelError::EmptyPrompt);
        }
        Ok(())
    }

    /// Prompt truncated for display
    pub fn prompt_preview(&self, max_len: usize) -> String {
        if self.prompt.chars().count() <= max_len {
            self.prompt.clone()
        } else {
            let cut: String = self.prompt.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", cut)
        }
    }
}

/// Clamp a requested image count into 1..=4
pub fn clamp_image_count(count: u8) -> u8 {
    count.clamp(1, MAX_IMAGES)
}
