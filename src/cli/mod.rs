pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pixelgenius",
    version,
    about = "🎨 PixelGenius - AI image generation from the terminal",
    long_about = r#"🎨 PixelGenius - AI image generation from the terminal

Generate images from a text prompt and a style using a hosted text-to-image
model (Stable Diffusion XL by default), adjust brightness, contrast and
sharpness, and download them individually or as a zip archive.
Run without arguments to launch the interactive TUI.

SETUP:
  Set your API token via environment variable or config:
    export HF_API_TOKEN=your-token-here
    pixelgenius config set api.token your-token-here

EXAMPLES:
  Generate an image:
    pixelgenius generate "a lighthouse at dusk"
    pixelgenius g "neon city street" --style cyberpunk --count 4 --zip

  Apply filters:
    pixelgenius generate "mountain lake" --brightness 1.2 --contrast 1.4

  List styles:
    pixelgenius styles

  Manage configuration:
    pixelgenius config show
    pixelgenius config set api.response_shape base64_json

  Launch interactive TUI:
    pixelgenius

OUTPUT FORMATS:
  --format text   Human-readable output (default)
  --format json   Machine-readable JSON
  --format quiet  Minimal output, just file paths"#,
    after_help = r#"CONFIGURATION:
  Config file: ~/.config/pixelgenius/config.toml (Linux)

  Response shapes:
    - raw_bytes    {"inputs", "options"} -> image bytes (default)
    - base64_json  {"inputs", "parameters"} -> {"images": [base64]}

  Styles: Realistic, Anime, Sketch, Cyberpunk, 3D Art, Cartoon, Digital Painting
  Filters: brightness, contrast, sharpness in 0.5 - 2.0 (1.0 = unchanged)"#
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate images from a text prompt
    ///
    /// Sends one request per image to the configured inference endpoint,
    /// applies the filters and saves the results to the output directory.
    #[command(
        alias = "g",
        after_help = r#"EXAMPLES:
  Basic generation:
    pixelgenius generate "a red apple on a wooden table"

  Several images in one style, bundled as zip:
    pixelgenius generate "a fox in the snow" --style anime --count 3 --zip

  Custom size and steps (base64_json endpoints):
    pixelgenius generate "portrait of an astronaut" --width 768 --height 1024 --steps 30

  JSON output:
    pixelgenius generate "abstract art" --format json"#
    )]
    Generate(commands::generate::GenerateArgs),

    /// List the available styles
    #[command(alias = "s")]
    Styles,

    /// View or modify configuration
    ///
    /// Manage the API token, endpoint, defaults, filters and output settings.
    /// Changes are saved to the config file immediately.
    #[command(
        alias = "c",
        after_help = r#"EXAMPLES:
  Show all settings:
    pixelgenius config show

  Get a specific value:
    pixelgenius config get defaults.style

  Set values:
    pixelgenius config set api.token YOUR_TOKEN
    pixelgenius config set api.endpoint https://example.com/v1/generate
    pixelgenius config set api.response_shape base64_json
    pixelgenius config set defaults.style "Digital Painting"
    pixelgenius config set filters.contrast 1.3

  Show config file path:
    pixelgenius config path

  Reset to defaults:
    pixelgenius config reset --force

AVAILABLE SETTINGS:
  api.token                - Bearer token for the inference endpoint
  api.endpoint             - Inference endpoint URL
  api.response_shape       - raw_bytes / base64_json
  api.timeout_secs         - Request timeout in seconds
  defaults.style           - Default style
  defaults.width           - Default width (base64_json only)
  defaults.height          - Default height (base64_json only)
  defaults.inference_steps - Default steps or "none" (base64_json only)
  defaults.num_images      - Images per prompt (1-4)
  filters.brightness       - 0.5 - 2.0
  filters.contrast         - 0.5 - 2.0
  filters.sharpness        - 0.5 - 2.0
  output.directory         - Where to save images
  output.auto_save         - Save images automatically (true/false)
  output.display           - Preview mode (terminal/none)"#
    )]
    Config(commands::config::ConfigArgs),
}
