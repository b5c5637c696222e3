//! Scripted generation backend for testing.

use async_trait::async_trait;
use explodeit_config::ExplodeItConfig;
use explodeit_core::{InlineData, MIME_PNG};
use explodeit_error::{ExplodeItResult, GeminiError, GeminiErrorKind};
use explodeit_interface::{
    GenerationBackend, GroundedResponse, ImageRequest, ImageResponse, SpeechRequest,
    SpeechResponse, TextRequest, TextResponse, UsageCounts, VideoOperation, VideoRequest,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::time::{Duration, sleep};

/// Components of the default plan; seven names make three batches of 3, 3, 1.
pub const WRISTWATCH_PARTS: [&str; 7] = [
    "Mainspring",
    "Balance Wheel",
    "Escapement",
    "Pallet Fork",
    "Winding Stem",
    "Jewel Bearing",
    "Sapphire Crystal",
];

/// Plan JSON for a mechanical wristwatch.
pub fn wristwatch_plan() -> String {
    serde_json::json!({
        "displayTitle": "Mechanical Wristwatch",
        "category": "Horology",
        "domainType": "PHYSICAL",
        "visualMetaphor": "Exploded View",
        "sectionTitles": {
            "origin": "Origins",
            "anatomy": "Anatomy",
            "article": "How It Works",
            "trivia": "Did You Know?"
        },
        "originStory": "Portable timekeeping shrank from clocks to pockets to wrists.",
        "detailedArticle": "A wound spring releases energy through a gear train.",
        "trivia": ["a", "b", "c", "d", "e"],
        "visualStylePrompt": "Macro photography, brushed steel",
        "componentList": WRISTWATCH_PARTS,
        "audioVibe": { "voiceName": "Fenrir", "toneDescription": "precise" }
    })
    .to_string()
}

/// Default config with short waits so paused-time tests stay quick.
pub fn test_config() -> ExplodeItConfig {
    let mut config = ExplodeItConfig::default();
    config.pipeline.video_poll_interval_ms = 10;
    config.pipeline.video_max_polls = 5;
    config
}

fn usage() -> UsageCounts {
    UsageCounts {
        prompt_tokens: 100,
        candidate_tokens: 50,
    }
}

fn batch_names(prompt: &str) -> Vec<String> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Components: "))
        .map(|names| names.split(", ").map(str::to_string).collect())
        .unwrap_or_default()
}

/// Mock backend whose responses are scripted per operation.
///
/// Every call is counted under its operation name: `plan`, `surprise`,
/// `script`, `grounded`, `image`, `start_video`, `poll_video`,
/// `download_video` and `speech`.
pub struct MockBackend {
    plan: Result<String, GeminiErrorKind>,
    surprise: Result<String, GeminiErrorKind>,
    unparsable: HashSet<String>,
    failing_grounded: Option<(String, GeminiErrorKind)>,
    polls_until_done: u32,
    video_error: Option<GeminiErrorKind>,
    surprise_delay: Duration,
    video_delay: Duration,
    speech_delay: Duration,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            plan: Ok(wristwatch_plan()),
            surprise: Ok("  Cuckoo Clock\n".to_string()),
            unparsable: HashSet::new(),
            failing_grounded: None,
            polls_until_done: 2,
            video_error: None,
            surprise_delay: Duration::from_millis(1),
            video_delay: Duration::ZERO,
            speech_delay: Duration::from_millis(1),
            calls: Mutex::new(HashMap::new()),
        }
    }
}

#[allow(dead_code)]
impl MockBackend {
    /// Backend that succeeds at every stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every planning call with `error`.
    pub fn with_plan_error(mut self, error: GeminiErrorKind) -> Self {
        self.plan = Err(error);
        self
    }

    /// Answer the random topic call with `text`.
    pub fn with_surprise(mut self, text: impl Into<String>) -> Self {
        self.surprise = Ok(text.into());
        self
    }

    /// Fail every random topic call with `error`.
    pub fn with_surprise_error(mut self, error: GeminiErrorKind) -> Self {
        self.surprise = Err(error);
        self
    }

    /// Answer prose instead of JSON for the batch containing `component`.
    pub fn with_unparsable_batch(mut self, component: &str) -> Self {
        self.unparsable.insert(component.to_string());
        self
    }

    /// Fail every call for the batch containing `component` with `error`.
    pub fn with_failing_batch(mut self, component: &str, error: GeminiErrorKind) -> Self {
        self.failing_grounded = Some((component.to_string(), error));
        self
    }

    /// Report the video job done after `polls` status polls.
    pub fn with_video_polls(mut self, polls: u32) -> Self {
        self.polls_until_done = polls;
        self
    }

    /// Fail every video submission with `error`.
    pub fn with_video_error(mut self, error: GeminiErrorKind) -> Self {
        self.video_error = Some(error);
        self
    }

    /// Hold the random topic call for `delay`.
    pub fn with_surprise_delay(mut self, delay: Duration) -> Self {
        self.surprise_delay = delay;
        self
    }

    /// Hold each video submission for `video` and each speech call for
    /// `speech`.
    pub fn with_animation_delays(mut self, video: Duration, speech: Duration) -> Self {
        self.video_delay = video;
        self.speech_delay = speech;
        self
    }

    /// Number of calls made to `operation`.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// Number of calls across every operation.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn count(&self, operation: &'static str) -> usize {
        let mut calls = self.calls.lock().unwrap();
        let entry = calls.entry(operation).or_insert(0);
        *entry += 1;
        *entry
    }

    fn scripted(result: &Result<String, GeminiErrorKind>) -> ExplodeItResult<TextResponse> {
        match result {
            Ok(text) => Ok(TextResponse {
                text: Some(text.clone()),
                usage: usage(),
            }),
            Err(kind) => Err(GeminiError::new(kind.clone()).into()),
        }
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate_text(&self, req: &TextRequest) -> ExplodeItResult<TextResponse> {
        if req.response_schema().is_some() {
            sleep(Duration::from_millis(1)).await;
            self.count("plan");
            Self::scripted(&self.plan)
        } else if req.temperature().is_some() {
            sleep(self.surprise_delay).await;
            self.count("surprise");
            Self::scripted(&self.surprise)
        } else {
            sleep(Duration::from_millis(1)).await;
            self.count("script");
            Ok(TextResponse {
                text: Some("Every tick is a controlled release of stored energy.".to_string()),
                usage: usage(),
            })
        }
    }

    async fn generate_grounded(&self, req: &TextRequest) -> ExplodeItResult<GroundedResponse> {
        sleep(Duration::from_millis(1)).await;
        self.count("grounded");
        let names = batch_names(req.prompt());

        if let Some((component, kind)) = &self.failing_grounded {
            if names.contains(component) {
                return Err(GeminiError::new(kind.clone()).into());
            }
        }
        let text = if names.iter().any(|n| self.unparsable.contains(n)) {
            "I could not find reliable sources for these parts.".to_string()
        } else {
            let components: Vec<_> = names
                .iter()
                .map(|name| {
                    serde_json::json!({
                        "name": name,
                        "composition": "Steel",
                        "shortDescription": format!("The {name}."),
                        "detailedContent": format!("All about the {name}.")
                    })
                })
                .collect();
            format!(
                "```json\n{}\n```",
                serde_json::json!({ "components": components })
            )
        };

        Ok(GroundedResponse {
            text: Some(text),
            citations: vec![
                "https://horology.example/a".to_string(),
                "https://horology.example/a".to_string(),
                "https://watches.example/b".to_string(),
            ],
            usage: usage(),
        })
    }

    async fn generate_image(&self, _req: &ImageRequest) -> ExplodeItResult<ImageResponse> {
        sleep(Duration::from_millis(1)).await;
        self.count("image");
        Ok(ImageResponse {
            image: Some(InlineData::new(MIME_PNG, vec![0x89, b'P', b'N', b'G'])),
        })
    }

    async fn start_video(&self, _req: &VideoRequest) -> ExplodeItResult<VideoOperation> {
        sleep(self.video_delay).await;
        self.count("start_video");
        if let Some(kind) = &self.video_error {
            return Err(GeminiError::new(kind.clone()).into());
        }
        Ok(VideoOperation::pending("operations/mock-video"))
    }

    async fn poll_video(&self, operation: &VideoOperation) -> ExplodeItResult<VideoOperation> {
        let polls = self.count("poll_video") as u32;
        let mut next = operation.clone();
        if polls >= self.polls_until_done {
            next.done = true;
            next.video_uri = Some("https://video.example/clip.mp4".to_string());
        }
        Ok(next)
    }

    async fn download_video(&self, _uri: &str) -> ExplodeItResult<Vec<u8>> {
        self.count("download_video");
        Ok(vec![0, 0, 0, 0x18, b'f', b't', b'y', b'p'])
    }

    async fn synthesize_speech(&self, _req: &SpeechRequest) -> ExplodeItResult<SpeechResponse> {
        sleep(self.speech_delay).await;
        self.count("speech");
        Ok(SpeechResponse {
            pcm: Some(vec![0u8; 480]),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
