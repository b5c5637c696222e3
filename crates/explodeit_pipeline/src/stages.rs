//! One function per pipeline stage.
//!
//! Every stage builds its prompt, runs its provider call inside the stage's
//! retry policy, checks that the expected payload came back and prices the
//! call. Validation happens inside the retried closure, so a response with a
//! missing payload is retried like any other failure.

use crate::prompts;
use explodeit_config::ExplodeItConfig;
use explodeit_core::{InlineData, MIME_MP4, MIME_WAV, ObjectPlan, TokenUsage};
use explodeit_error::{
    ExplodeItError, ExplodeItResult, GeminiError, GeminiErrorKind, PipelineError,
    PipelineErrorKind,
};
use explodeit_interface::{
    GenerationBackend, ImageRequestBuilder, SpeechRequest, TextRequestBuilder, VideoRequestBuilder,
};
use explodeit_models::pcm_to_wav;
use explodeit_retry::call_with_retry;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Result of a stage together with the usage records of its calls.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput<T> {
    /// Stage result
    pub value: T,
    /// One record per successful provider call
    pub usage: Vec<TokenUsage>,
}

impl<T> StageOutput<T> {
    fn single(value: T, usage: TokenUsage) -> Self {
        Self {
            value,
            usage: vec![usage],
        }
    }
}

/// Narration script and the playable audio made from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationOutput {
    /// Spoken script
    pub script: String,
    /// WAV data URL
    pub audio_url: String,
}

#[track_caller]
fn missing(what: &str) -> ExplodeItError {
    GeminiError::new(GeminiErrorKind::MissingPayload(what.to_string())).into()
}

/// Stage functions bound to a backend and configuration.
#[derive(Debug)]
pub struct Stages<B: ?Sized> {
    backend: Arc<B>,
    config: Arc<ExplodeItConfig>,
}

impl<B: ?Sized> Clone for Stages<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: GenerationBackend + ?Sized> Stages<B> {
    /// Bind stages to `backend` and `config`.
    pub fn new(backend: Arc<B>, config: Arc<ExplodeItConfig>) -> Self {
        Self { backend, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ExplodeItConfig {
        &self.config
    }

    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    /// Usage record for one call, priced from the configured table.
    pub(crate) fn record(&self, model: &str, input: u64, output: u64) -> TokenUsage {
        TokenUsage::new(
            model,
            input,
            output,
            self.config.pricing.estimate(model, input, output),
        )
    }

    /// Pick a random topic. An empty answer falls back to the configured topic.
    #[instrument(skip(self))]
    pub async fn surprise(&self) -> ExplodeItResult<StageOutput<String>> {
        let seed: u32 = rand::thread_rng().gen_range(0..1_000_000);
        let model = self.config.models.surprise.as_str();
        let req = TextRequestBuilder::default()
            .model(model)
            .prompt(prompts::surprise(seed))
            .temperature(self.config.pipeline.surprise_temperature)
            .build()?;

        let backend = self.backend();
        let req = &req;
        let response = call_with_retry(&self.config.retry.surprise, "Surprise Me", move || async move {
            backend.generate_text(req).await
        })
        .await?;

        let topic = response
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.config.pipeline.fallback_topic)
            .to_string();
        info!(topic = %topic, "Picked random topic");

        let usage = self.record(model, response.usage.prompt_tokens, response.usage.candidate_tokens);
        Ok(StageOutput::single(topic, usage))
    }

    /// Produce the structured plan for `topic`.
    #[instrument(skip(self))]
    pub async fn plan(&self, topic: &str) -> ExplodeItResult<StageOutput<ObjectPlan>> {
        let model = self.config.models.planning.as_str();
        let req = TextRequestBuilder::default()
            .model(model)
            .prompt(prompts::plan(topic))
            .response_schema(ObjectPlan::response_schema())
            .build()?;

        let backend = self.backend();
        let req = &req;
        let (plan, counts) = call_with_retry(&self.config.retry.plan, "Plan Object", move || async move {
            let response = backend.generate_text(req).await?;
            let text = response.text.ok_or_else(|| missing("plan text"))?;
            let plan: ObjectPlan = serde_json::from_str(&text).map_err(|e| {
                ExplodeItError::from(PipelineError::new(PipelineErrorKind::PlanParse(
                    e.to_string(),
                )))
            })?;
            Ok::<_, ExplodeItError>((plan, response.usage))
        })
        .await?;

        debug!(components = plan.component_list.len(), "Plan ready");
        let usage = self.record(model, counts.prompt_tokens, counts.candidate_tokens);
        Ok(StageOutput::single(plan, usage))
    }

    async fn image(
        &self,
        context: &str,
        prompt: String,
        conditioning: Option<InlineData>,
    ) -> ExplodeItResult<StageOutput<String>> {
        let model = self.config.models.image.as_str();
        let mut builder = ImageRequestBuilder::default();
        builder
            .model(model)
            .prompt(prompt.as_str())
            .aspect_ratio(self.config.pipeline.image_aspect_ratio.as_str())
            .image_size(self.config.pipeline.image_size.as_str());
        if let Some(image) = conditioning {
            builder.conditioning(image);
        }
        let req = builder.build()?;

        let backend = self.backend();
        let req = &req;
        let image = call_with_retry(&self.config.retry.image, context, move || async move {
            let response = backend.generate_image(req).await?;
            response.image.ok_or_else(|| missing("inline image data"))
        })
        .await?;

        let input = (prompt.chars().count() / 4) as u64;
        let usage = self.record(model, input, 0);
        Ok(StageOutput::single(image.to_data_url(), usage))
    }

    /// Render the diagram of the topic's components. Returns a data URL.
    #[instrument(skip(self, plan))]
    pub async fn infographic(
        &self,
        topic: &str,
        plan: &ObjectPlan,
    ) -> ExplodeItResult<StageOutput<String>> {
        self.image("Infographic Generation", prompts::infographic(topic, plan), None)
            .await
    }

    /// Render the assembled object, conditioned on the infographic data URL.
    #[instrument(skip(self, plan, infographic_url))]
    pub async fn assembled(
        &self,
        topic: &str,
        plan: &ObjectPlan,
        infographic_url: &str,
    ) -> ExplodeItResult<StageOutput<String>> {
        let infographic = InlineData::from_data_url(infographic_url)?;
        self.image(
            "Assembled Image Generation",
            prompts::assembled(topic, plan),
            Some(infographic),
        )
        .await
    }

    /// Animate from the assembled image to the infographic. Returns an MP4
    /// data URL.
    ///
    /// Submission, polling and download are retried together.
    #[instrument(skip(self, plan, start_url, end_url))]
    pub async fn video(
        &self,
        topic: &str,
        plan: &ObjectPlan,
        start_url: &str,
        end_url: Option<&str>,
    ) -> ExplodeItResult<StageOutput<String>> {
        let model = self.config.models.video.as_str();
        let pipeline = &self.config.pipeline;
        let mut builder = VideoRequestBuilder::default();
        builder
            .model(model)
            .prompt(prompts::video(topic, plan))
            .start_frame(InlineData::from_data_url(start_url)?)
            .resolution(pipeline.video_resolution.as_str())
            .aspect_ratio(pipeline.video_aspect_ratio.as_str());
        if let Some(end) = end_url {
            builder.end_frame(InlineData::from_data_url(end)?);
        }
        let req = builder.build()?;

        let backend = self.backend();
        let req = &req;
        let interval = pipeline.video_poll_interval();
        let max_polls = pipeline.video_max_polls;
        let video = call_with_retry(&self.config.retry.video, "Video Generation", move || async move {
            let mut operation = backend.start_video(req).await?;
            let mut polls = 0u32;
            while !operation.done {
                if polls >= max_polls {
                    return Err(GeminiError::new(GeminiErrorKind::VideoTimeout { polls }).into());
                }
                tokio::time::sleep(interval).await;
                operation = backend.poll_video(&operation).await?;
                polls += 1;
                debug!(polls, done = operation.done, "Polled video job");
            }
            if let Some(message) = operation.error {
                return Err(GeminiError::new(GeminiErrorKind::VideoJobFailed(message)).into());
            }
            let uri = operation.video_uri.ok_or_else(|| missing("video uri"))?;
            let bytes = backend.download_video(&uri).await?;
            Ok::<_, ExplodeItError>(InlineData::new(MIME_MP4, bytes))
        })
        .await?;

        let usage = self.record(model, 100, 0);
        Ok(StageOutput::single(video.to_data_url(), usage))
    }

    /// Write a narration script, then speak it. Two calls, two usage records.
    #[instrument(skip(self, plan))]
    pub async fn narration(
        &self,
        topic: &str,
        plan: &ObjectPlan,
    ) -> ExplodeItResult<StageOutput<NarrationOutput>> {
        let pipeline = &self.config.pipeline;
        let script_model = self.config.models.script.as_str();
        let req = TextRequestBuilder::default()
            .model(script_model)
            .prompt(prompts::narration(topic, plan, pipeline.narration_source_chars))
            .build()?;

        let backend = self.backend();
        let req = &req;
        let response = call_with_retry(&self.config.retry.script, "Script Gen", move || async move {
            backend.generate_text(req).await
        })
        .await?;
        let mut usage = vec![self.record(
            script_model,
            response.usage.prompt_tokens,
            response.usage.candidate_tokens,
        )];
        let script = response
            .text
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| missing("narration script"))?;

        let tts_model = self.config.models.tts.as_str();
        let voice = pipeline.resolve_voice(&plan.audio_vibe.voice_name);
        let speech = SpeechRequest {
            model: tts_model.to_string(),
            text: script.clone(),
            voice: voice.to_string(),
        };
        debug!(voice, requested = %plan.audio_vibe.voice_name, "Synthesizing narration");

        let speech = &speech;
        let pcm = call_with_retry(&self.config.retry.speech, "TTS Gen", move || async move {
            let response = backend.synthesize_speech(speech).await?;
            response.pcm.ok_or_else(|| missing("audio data"))
        })
        .await?;

        let wav = InlineData::new(MIME_WAV, pcm_to_wav(&pcm, pipeline.speech_sample_rate)?);
        usage.push(self.record(tts_model, script.chars().count() as u64, 0));

        Ok(StageOutput {
            value: NarrationOutput {
                script,
                audio_url: wav.to_data_url(),
            },
            usage,
        })
    }
}
