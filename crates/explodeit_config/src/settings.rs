//! Layered TOML settings.

use config::{Config, File, FileFormat};
use explodeit_core::{ModelPrice, PriceTable};
use explodeit_error::{ConfigError, ExplodeItResult};
use explodeit_retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

const BUNDLED_CONFIG: &str = include_str!("../../../explodeit.toml");

/// Provider endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the generative REST API
    pub base_url: String,
    /// Citation URLs containing any of these markers are dropped
    pub ignored_citation_markers: Vec<String>,
}

/// Model identifier used by each stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Object planning
    pub planning: String,
    /// Component enrichment
    pub authoring: String,
    /// Narration script
    pub script: String,
    /// Infographic and assembled images
    pub image: String,
    /// Video synthesis
    pub video: String,
    /// Speech synthesis
    pub tts: String,
    /// Random topic ideation
    pub surprise: String,
}

/// Retry policy per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Random topic call
    pub surprise: RetryPolicy,
    /// Planning call
    pub plan: RetryPolicy,
    /// Infographic and assembled image calls
    pub image: RetryPolicy,
    /// Each enrichment batch call
    pub enrichment: RetryPolicy,
    /// Video job submission
    pub video: RetryPolicy,
    /// Narration script call
    pub script: RetryPolicy,
    /// Speech synthesis call
    pub speech: RetryPolicy,
}

/// Tuning for the stages and the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Components per enrichment call
    pub enrichment_batch_size: usize,
    /// Milliseconds between video job polls
    pub video_poll_interval_ms: u64,
    /// Polls before a video job is abandoned
    pub video_max_polls: u32,
    /// Longest article prefix quoted in the narration prompt, in characters
    pub narration_source_chars: usize,
    /// Allowed narration voices
    pub voices: Vec<String>,
    /// Voice used when the planned one is not allowed
    pub default_voice: String,
    /// Sample rate of synthesized PCM audio
    pub speech_sample_rate: u32,
    /// Aspect ratio of generated images
    pub image_aspect_ratio: String,
    /// Size class of generated images
    pub image_size: String,
    /// Resolution of generated videos
    pub video_resolution: String,
    /// Aspect ratio of generated videos
    pub video_aspect_ratio: String,
    /// Sampling temperature for random topics
    pub surprise_temperature: f64,
    /// Topic used when the random topic call returns nothing
    pub fallback_topic: String,
}

impl PipelineSettings {
    /// Interval between video job polls.
    pub fn video_poll_interval(&self) -> Duration {
        Duration::from_millis(self.video_poll_interval_ms)
    }

    /// The allowed voice matching `requested`, or the default voice.
    pub fn resolve_voice(&self, requested: &str) -> &str {
        self.voices
            .iter()
            .find(|v| v.as_str() == requested)
            .map(String::as_str)
            .unwrap_or(&self.default_voice)
    }
}

/// Complete ExplodeIt configuration.
///
/// # Examples
///
/// ```
/// use explodeit_config::ExplodeItConfig;
///
/// let config = ExplodeItConfig::default();
/// assert_eq!(config.pipeline.enrichment_batch_size, 3);
/// assert_eq!(config.pipeline.resolve_voice("Robot"), "Kore");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplodeItConfig {
    /// Provider endpoint
    pub api: ApiSettings,
    /// Stage models
    pub models: ModelSettings,
    /// Stage retry policies
    pub retry: RetrySettings,
    /// Stage tuning
    pub pipeline: PipelineSettings,
    /// Cost estimation table keyed by model identifier
    pub pricing: PriceTable,
}

impl ExplodeItConfig {
    /// Only the bundled defaults, ignoring user files.
    pub fn bundled() -> ExplodeItResult<Self> {
        Self::build(Config::builder().add_source(File::from_str(BUNDLED_CONFIG, FileFormat::Toml)))
    }

    /// Bundled defaults overlaid with the given file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ExplodeItResult<Self> {
        debug!("Loading configuration from file");
        Self::build(
            Config::builder()
                .add_source(File::from_str(BUNDLED_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref())),
        )
    }

    /// Bundled defaults, then the home directory file, then the working
    /// directory file. Missing user files are skipped.
    #[instrument]
    pub fn load() -> ExplodeItResult<Self> {
        debug!("Loading configuration: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(BUNDLED_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/explodeit/explodeit.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("explodeit").required(false));
        Self::build(builder)
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> ExplodeItResult<Self> {
        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let retries = [
            ("surprise", self.retry.surprise),
            ("plan", self.retry.plan),
            ("image", self.retry.image),
            ("enrichment", self.retry.enrichment),
            ("video", self.retry.video),
            ("script", self.retry.script),
            ("speech", self.retry.speech),
        ];
        if let Some((stage, _)) = retries.iter().find(|(_, p)| p.attempts == 0) {
            return Err(ConfigError::new(format!(
                "retry.{} needs at least one attempt",
                stage
            )));
        }
        if self.pipeline.enrichment_batch_size == 0 {
            return Err(ConfigError::new("pipeline.enrichment_batch_size must be positive"));
        }
        if self.pipeline.video_poll_interval_ms == 0 || self.pipeline.video_max_polls == 0 {
            return Err(ConfigError::new("video polling needs a positive interval and poll count"));
        }
        if !self.pipeline.voices.contains(&self.pipeline.default_voice) {
            return Err(ConfigError::new(format!(
                "Default voice {} is not in the voice list",
                self.pipeline.default_voice
            )));
        }
        Ok(())
    }
}

impl Default for ExplodeItConfig {
    fn default() -> Self {
        let policy = |attempts, ms| RetryPolicy::new(attempts, Duration::from_millis(ms));
        let tokens = |input, output| ModelPrice::Tokens {
            input_per_1k_tokens: input,
            output_per_1k_tokens: output,
        };

        Self {
            api: ApiSettings {
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                ignored_citation_markers: ["google.com", "vertexaisearch", "googleusercontent"]
                    .map(String::from)
                    .to_vec(),
            },
            models: ModelSettings {
                planning: "gemini-3-pro-preview".to_string(),
                authoring: "gemini-2.5-flash".to_string(),
                script: "gemini-flash-lite-latest".to_string(),
                image: "gemini-3-pro-image-preview".to_string(),
                video: "veo-3.1-generate-preview".to_string(),
                tts: "gemini-2.5-flash-preview-tts".to_string(),
                surprise: "gemini-2.5-flash".to_string(),
            },
            retry: RetrySettings {
                surprise: policy(3, 1000),
                plan: policy(3, 1000),
                image: policy(3, 2000),
                enrichment: policy(3, 2000),
                video: policy(2, 5000),
                script: policy(3, 1000),
                speech: policy(3, 2000),
            },
            pipeline: PipelineSettings {
                enrichment_batch_size: 3,
                video_poll_interval_ms: 5000,
                video_max_polls: 120,
                narration_source_chars: 1500,
                voices: ["Puck", "Charon", "Kore", "Fenrir", "Zephyr"]
                    .map(String::from)
                    .to_vec(),
                default_voice: "Kore".to_string(),
                speech_sample_rate: 24_000,
                image_aspect_ratio: "16:9".to_string(),
                image_size: "2K".to_string(),
                video_resolution: "720p".to_string(),
                video_aspect_ratio: "16:9".to_string(),
                surprise_temperature: 1.3,
                fallback_topic: "Vintage Typewriter".to_string(),
            },
            pricing: PriceTable::from_iter([
                ("gemini-3-pro-preview".to_string(), tokens(0.00125, 0.005)),
                ("gemini-2.5-flash".to_string(), tokens(0.0001, 0.0004)),
                ("gemini-flash-lite-latest".to_string(), tokens(0.000075, 0.0003)),
                (
                    "gemini-3-pro-image-preview".to_string(),
                    ModelPrice::Asset { per_asset: 0.04 },
                ),
                (
                    "veo-3.1-generate-preview".to_string(),
                    ModelPrice::Asset { per_asset: 0.10 },
                ),
                (
                    "gemini-2.5-flash-preview-tts".to_string(),
                    ModelPrice::Characters { per_1k_chars: 0.002 },
                ),
            ]),
        }
    }
}
