use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};

use crate::api::ImageRequestAdapter;
use crate::config::Config;
use crate::core::batch::BatchFailure;
use crate::core::enhance::{clamp_factor, MAX_FACTOR, MIN_FACTOR};
use crate::core::params::{clamp_image_count, MAX_IMAGES};
use crate::core::{
    generate_batch, BatchMode, BatchOutcome, EnhancementSettings, GenerationRequest,
    PromptHistory, Style,
};
use crate::output;

/// Step used when nudging a filter factor
const FACTOR_STEP: f32 = 0.1;

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Main view with results and history
    Main,
    /// Text input mode
    Input,
    /// Generator settings screen
    Settings,
}

/// Settings field being edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Style,
    Images,
    Brightness,
    Contrast,
    Sharpness,
}

impl SettingsField {
    pub fn all() -> &'static [SettingsField] {
        &[
            SettingsField::Style,
            SettingsField::Images,
            SettingsField::Brightness,
            SettingsField::Contrast,
            SettingsField::Sharpness,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::Style => "Style",
            SettingsField::Images => "Number of images",
            SettingsField::Brightness => "Brightness",
            SettingsField::Contrast => "Contrast",
            SettingsField::Sharpness => "Sharpness",
        }
    }
}

/// An image produced during this session
#[derive(Debug, Clone)]
pub struct SessionImage {
    /// 1-based position within its batch
    pub index: usize,
    pub bitmap: DynamicImage,
    pub path: Option<PathBuf>,
}

/// Message from a background generation task
#[derive(Debug)]
pub enum GenerationEvent {
    Finished {
        prompt: String,
        outcome: BatchOutcome,
        paths: Vec<PathBuf>,
        save_error: Option<String>,
    },
    /// The background task died before producing a result
    Aborted { prompt: String, reason: String },
}

/// Generate, enhance and optionally save one batch
async fn run_batch(
    adapter: Arc<ImageRequestAdapter>,
    request: GenerationRequest,
    count: u8,
    filters: EnhancementSettings,
    save_dir: Option<PathBuf>,
) -> Result<GenerationEvent, JoinError> {
    let outcome = generate_batch(adapter.as_ref(), &request, count, BatchMode::Sequential).await;
    let encode = save_dir.is_some();

    // Filters and PNG encoding are CPU bound
    let (outcome, pngs) = tokio::task::spawn_blocking(move || {
        let mut outcome = outcome;
        outcome.enhance(&filters);
        let pngs = (encode && !outcome.is_empty())
            .then(|| output::encode_all(outcome.images.iter().map(|i| &i.image.bitmap)));
        (outcome, pngs)
    })
    .await?;

    let (paths, save_error) = match (save_dir, pngs) {
        (Some(dir), Some(Ok(pngs))) => {
            match output::save_images(&pngs, &dir, &output::run_prefix()).await {
                Ok(paths) => (paths, None),
                Err(e) => (Vec::new(), Some(format!("{:#}", e))),
            }
        }
        (_, Some(Err(e))) => (Vec::new(), Some(format!("{:#}", e))),
        _ => (Vec::new(), None),
    };

    Ok(GenerationEvent::Finished {
        prompt: request.prompt,
        outcome,
        paths,
        save_error,
    })
}

/// Forward the task's result to the session, turning a crash into `Aborted`
fn spawn_reporter(
    tx: async_channel::Sender<GenerationEvent>,
    prompt: String,
    task: JoinHandle<Result<GenerationEvent, JoinError>>,
) {
    tokio::spawn(async move {
        let event = match task.await {
            Ok(Ok(event)) => event,
            Ok(Err(e)) | Err(e) => {
                tracing::error!("Generation task failed: {}", e);
                GenerationEvent::Aborted {
                    prompt,
                    reason: e.to_string(),
                }
            }
        };
        if tx.send(event).await.is_err() {
            tracing::debug!("Session closed before generation finished");
        }
    });
}

/// TUI application state, one per interactive session
pub struct App {
    /// Current mode
    pub mode: AppMode,

    /// Configuration
    pub config: Config,

    /// Adapter, or the reason it could not be built
    adapter: Result<Arc<ImageRequestAdapter>, String>,

    /// Current prompt input
    pub input: String,

    /// Cursor position in input, in characters
    pub cursor_pos: usize,

    /// Generator settings for this session
    pub style: Style,
    pub num_images: u8,
    pub filters: EnhancementSettings,

    /// Prompts submitted this session
    pub history: PromptHistory,

    /// Prompt of the batch currently shown
    pub last_prompt: Option<String>,

    /// Results of the last batch
    pub images: Vec<SessionImage>,
    pub failures: Vec<BatchFailure>,

    /// Selected image index
    pub selected_image: usize,

    /// Status message
    pub status_message: Option<String>,

    /// Error message
    pub error_message: Option<String>,

    /// Whether to quit
    pub should_quit: bool,

    /// Settings: selected field index
    pub settings_selected: usize,

    /// Generation in progress
    pub generating: bool,

    events_tx: async_channel::Sender<GenerationEvent>,
    events_rx: async_channel::Receiver<GenerationEvent>,
}

impl App {
    pub fn new(config: Config, adapter: Result<ImageRequestAdapter, String>) -> Self {
        let (events_tx, events_rx) = async_channel::unbounded();

        Self {
            mode: AppMode::Main,
            style: config.defaults.style,
            num_images: clamp_image_count(config.defaults.num_images),
            filters: config.filters.clamped(),
            config,
            adapter: adapter.map(Arc::new),
            input: String::new(),
            cursor_pos: 0,
            history: PromptHistory::new(),
            last_prompt: None,
            images: Vec::new(),
            failures: Vec::new(),
            selected_image: 0,
            status_message: None,
            error_message: None,
            should_quit: false,
            settings_selected: 0,
            generating: false,
            events_tx,
            events_rx,
        }
    }

    /// Set status message
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.error_message = None;
    }

    /// Set error message
    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error_message = Some(msg.into());
        self.status_message = None;
    }

    /// Clear messages
    pub fn clear_messages(&mut self) {
        self.status_message = None;
        self.error_message = None;
    }

    /// Move selection up
    pub fn select_previous(&mut self) {
        if self.selected_image > 0 {
            self.selected_image -= 1;
        }
    }

    /// Move selection down
    pub fn select_next(&mut self) {
        if self.selected_image < self.images.len().saturating_sub(1) {
            self.selected_image += 1;
        }
    }

    /// Drop the current results
    pub fn clear_results(&mut self) {
        self.images.clear();
        self.failures.clear();
        self.selected_image = 0;
        self.last_prompt = None;
    }

    /// Byte offset of the cursor within `input`
    pub fn cursor_byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn input_len(&self) -> usize {
        self.input.chars().count()
    }

    /// Current value of a settings field, for display
    pub fn get_settings_value(&self, field: &SettingsField) -> String {
        match field {
            SettingsField::Style => self.style.label().to_string(),
            SettingsField::Images => self.num_images.to_string(),
            SettingsField::Brightness => format!("{:.1}", self.filters.brightness),
            SettingsField::Contrast => format!("{:.1}", self.filters.contrast),
            SettingsField::Sharpness => format!("{:.1}", self.filters.sharpness),
        }
    }

    /// Step a settings field forward or backward
    pub fn adjust_setting(&mut self, field: &SettingsField, forward: bool) {
        let delta = if forward { FACTOR_STEP } else { -FACTOR_STEP };
        let nudge = |value: f32| clamp_factor(((value + delta) * 10.0).round() / 10.0);

        match field {
            SettingsField::Style => {
                self.style = if forward {
                    self.style.next()
                } else {
                    self.style.previous()
                };
            }
            SettingsField::Images => {
                self.num_images = match (forward, self.num_images) {
                    (true, n) if n >= MAX_IMAGES => 1,
                    (true, n) => n + 1,
                    (false, n) if n <= 1 => MAX_IMAGES,
                    (false, n) => n - 1,
                };
            }
            SettingsField::Brightness => self.filters.brightness = nudge(self.filters.brightness),
            SettingsField::Contrast => self.filters.contrast = nudge(self.filters.contrast),
            SettingsField::Sharpness => self.filters.sharpness = nudge(self.filters.sharpness),
        }
    }

    /// Range hint for a settings field
    pub fn settings_hint(&self, field: &SettingsField) -> String {
        match field {
            SettingsField::Style => format!("{} styles", Style::all().len()),
            SettingsField::Images => format!("1 - {}", MAX_IMAGES),
            _ => format!("{:.1} - {:.1}", MIN_FACTOR, MAX_FACTOR),
        }
    }

    /// Validate the prompt and start a background batch.
    ///
    /// Returns `false` if nothing was started.
    pub fn submit_prompt(&mut self, prompt: &str) -> bool {
        if self.generating {
            self.set_error("Generation already in progress");
            return false;
        }

        let request = GenerationRequest::new(prompt)
            .with_style(self.style)
            .with_size(self.config.defaults.width, self.config.defaults.height);
        let request = match self.config.defaults.inference_steps {
            Some(steps) => request.with_inference_steps(steps),
            None => request,
        };

        if let Err(e) = request.validate() {
            self.set_error(format!("❗ {}", e));
            return false;
        }

        let adapter = match &self.adapter {
            Ok(adapter) => Arc::clone(adapter),
            Err(e) => {
                self.set_error(e.clone());
                return false;
            }
        };

        self.history.push(prompt);
        self.generating = true;
        self.set_status(format!(
            "🚀 Generating {} image(s): {}...",
            self.num_images,
            request.prompt_preview(40)
        ));

        let count = self.num_images;
        let filters = self.filters;
        let save_dir = self
            .config
            .output
            .auto_save
            .then(|| PathBuf::from(&self.config.output.directory));

        let prompt = request.prompt.clone();
        let batch = tokio::spawn(run_batch(adapter, request, count, filters, save_dir));
        spawn_reporter(self.events_tx.clone(), prompt, batch);

                true
    }

    /// Apply a finished batch to the session
    pub fn handle_event(&mut self, event: GenerationEvent) {
        match event {
            GenerationEvent::Finished {
                prompt,
                outcome,
                paths,
                save_error,
            } => {
                self.generating = false;
                self.last_prompt = Some(prompt);
                self.selected_image = 0;
                self.failures = outcome.failures;
                self.images = outcome
                    .images
                    .into_iter()
                    .enumerate()
                    .map(|(pos, entry)| SessionImage {
                        index: entry.index,
                        bitmap: entry.image.bitmap,
                        path: paths.get(pos).cloned(),
                    })
                    .collect();

                if self.images.is_empty() {
                    let reason = match self.failures.first() {
                        Some(f) if f.failure.is_transport() => {
                            format!(": {} (check your connection)", f.failure)
                        }
                        Some(f) => format!(": {}", f.failure),
                        None => String::new(),
                    };
                    self.set_error(format!("No images generated{}", reason));
                } else if let Some(err) = save_error {
                    self.set_error(format!("Generated {} image(s), saving failed: {}", self.images.len(), err));
                } else if !self.failures.is_empty() {
                    self.set_status(format!(
                        "Generated {} of {} image(s); {} failed",
                        self.images.len(),
                        outcome.requested,
                        self.failures.len()
                    ));
                } else {
                    self.set_status(format!("✓ Generated {} image(s)", self.images.len()));
                }
            }
            GenerationEvent::Aborted { prompt, reason } => {
                self.generating = false;
                self.last_prompt = Some(prompt);
                self.set_error(format!("Generation failed: {}", reason));
            }
        }
    }

    /// Apply every event that has arrived since the last call
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Wait for the next event; used by tests
    #[cfg(test)]
    pub async fn next_event(&self) -> Option<GenerationEvent> {
        self.events_rx.recv().await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponseShape;
    use crate::core::archive::encode_png;
    use crate::core::{GeneratedImage, GenerationFailure};
    use image::{ImageFormat, Rgb, RgbImage};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn offline_app() -> App {
        App::new(Config::default(), Err("API token not configured".to_string()))
    }

    fn image(value: u8) -> GeneratedImage {
        GeneratedImage {
            bytes: Vec::new(),
            format: ImageFormat::Png,
            bitmap: DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([value, 0, 0]))),
        }
    }

    #[test]
    fn test_blank_prompt_is_not_submitted() {
        let mut app = offline_app();

        assert!(!app.submit_prompt("   "));
        assert!(!app.generating);
        assert!(app.history.is_empty());
        assert!(app.error_message.is_some());
    }

    #[test]
    fn test_missing_adapter_reports_error() {
        let mut app = offline_app();

        assert!(!app.submit_prompt("a castle"));
        assert_eq!(app.error_message.as_deref(), Some("API token not configured"));
        assert!(!app.generating);
    }

    #[test]
    fn test_settings_cycle_and_clamp() {
        let mut app = offline_app();

        app.adjust_setting(&SettingsField::Style, true);
        assert_eq!(app.style, Style::Anime);
        app.adjust_setting(&SettingsField::Style, false);
        app.adjust_setting(&SettingsField::Style, false);
        assert_eq!(app.style, Style::DigitalPainting);

        app.num_images = 4;
        app.adjust_setting(&SettingsField::Images, true);
        assert_eq!(app.num_images, 1);
        app.adjust_setting(&SettingsField::Images, false);
        assert_eq!(app.num_images, 4);

        for _ in 0..20 {
            app.adjust_setting(&SettingsField::Brightness, true);
        }
        assert_eq!(app.filters.brightness, 2.0);
        for _ in 0..30 {
            app.adjust_setting(&SettingsField::Contrast, false);
        }
        assert_eq!(app.filters.contrast, 0.5);
        app.adjust_setting(&SettingsField::Sharpness, true);
        assert_eq!(app.get_settings_value(&SettingsField::Sharpness), "1.1");
    }

    #[test]
    fn test_partial_batch_keeps_successes() {
        let mut app = offline_app();
        app.generating = true;

        let outcome = BatchOutcome {
            requested: 3,
            images: vec![
                crate::core::batch::BatchImage { index: 1, image: image(1) },
                crate::core::batch::BatchImage { index: 3, image: image(3) },
            ],
            failures: vec![BatchFailure {
                index: 2,
                failure: GenerationFailure::rejected(503, "loading"),
            }],
        };

        app.handle_event(GenerationEvent::Finished {
            prompt: "a castle".to_string(),
            outcome,
            paths: Vec::new(),
            save_error: None,
        });

        assert!(!app.generating);
        assert_eq!(app.images.iter().map(|i| i.index).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(app.failures.len(), 1);
        assert!(app.status_message.as_deref().unwrap().contains("2 of 3"));
    }

    #[test]
    fn test_empty_batch_shows_notice() {
        let mut app = offline_app();
        app.generating = true;

        app.handle_event(GenerationEvent::Finished {
            prompt: "a castle".to_string(),
            outcome: BatchOutcome {
                requested: 1,
                images: Vec::new(),
                failures: vec![BatchFailure {
                    index: 1,
                    failure: GenerationFailure::transport(false, "connection refused"),
                }],
            },
            paths: Vec::new(),
            save_error: None,
        });

        assert!(!app.generating);
        assert!(app.images.is_empty());
        assert!(app.error_message.as_deref().unwrap().starts_with("No images generated"));
    }

    #[test]
    fn test_cursor_byte_index_handles_multibyte() {
        let mut app = offline_app();
        app.input = "héllo".to_string();
        app.cursor_pos = 2;
        assert_eq!(app.cursor_byte_index(), 3);
        app.cursor_pos = 5;
        assert_eq!(app.cursor_byte_index(), app.input.len());
    }

    #[tokio::test]
    async fn test_background_generation_reports_back() {
        let server = MockServer::start().await;
        let png = encode_png(&image(9).bitmap).unwrap();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.api.token = Some("test-token".to_string());
        config.api.endpoint = server.uri();
        config.api.response_shape = ResponseShape::RawBytes;
        config.output.auto_save = false;
        let adapter = ImageRequestAdapter::new(&config.api).map_err(|e| e.to_string());

        let mut app = App::new(config, adapter);
        app.num_images = 2;

        assert!(app.submit_prompt("a castle"));
        assert!(app.generating);
        assert!(!app.submit_prompt("another castle"));
        assert_eq!(app.history.len(), 1);

        let event = app.next_event().await.expect("event");
        app.handle_event(event);

        assert!(!app.generating);
        assert_eq!(app.images.len(), 2);
        assert_eq!(app.last_prompt.as_deref(), Some("a castle"));
    }

    #[tokio::test]
    async fn test_background_generation_saves_enhanced_images() {
        let server = MockServer::start().await;
        let png = encode_png(&image(100).bitmap).unwrap();
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.api.token = Some("test-token".to_string());
        config.api.endpoint = server.uri();
        config.output.auto_save = true;
        config.output.directory = dir.path().join("out").to_string_lossy().into_owned();
        let adapter = ImageRequestAdapter::new(&config.api).map_err(|e| e.to_string());

        let mut app = App::new(config, adapter);
        app.num_images = 2;
        app.filters = EnhancementSettings::new(2.0, 1.0, 1.0);

        assert!(app.submit_prompt("a castle"));
        let event = app.next_event().await.expect("event");
        app.handle_event(event);

        assert!(app.error_message.is_none(), "{:?}", app.error_message);
        assert_eq!(app.images.len(), 2);
        for session_image in &app.images {
            let path = session_image.path.as_ref().expect("saved path");
            let saved = image::open(path).unwrap().to_rgb8();
            assert_eq!(saved.get_pixel(0, 0), &Rgb([200, 0, 0]));
        }
    }

    #[tokio::test]
    async fn test_crashed_task_releases_the_session() {
        let mut app = offline_app();
        app.generating = true;

        let task = tokio::spawn(async {
            if true {
                panic!("encoder blew up");
            }
            Ok(GenerationEvent::Aborted {
                prompt: String::new(),
                reason: String::new(),
            })
        });
        spawn_reporter(app.events_tx.clone(), "a castle".to_string(), task);

        let event = app.next_event().await.expect("event");
        app.handle_event(event);

        assert!(!app.generating);
        assert_eq!(app.last_prompt.as_deref(), Some("a castle"));
        assert!(app.error_message.as_deref().unwrap().starts_with("Generation failed"));
    }
}
