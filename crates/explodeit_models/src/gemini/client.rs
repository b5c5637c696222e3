//! Gemini REST client implementing the generation backend.

use super::wire::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, GoogleSearch, ImageConfig,
    Operation, Part, PredictLongRunningRequest, SpeechConfig, Tool, VideoFrame, VideoInstance,
    VideoParameters,
};
use crate::{LlmMetrics, classify_error, filter_citations};
use async_trait::async_trait;
use explodeit_config::{ApiKeyHandle, ApiSettings};
use explodeit_error::{ExplodeItResult, GeminiError, GeminiErrorKind};
use explodeit_interface::{
    GenerationBackend, GroundedResponse, ImageRequest, ImageResponse, SpeechRequest,
    SpeechResponse, TextRequest, TextResponse, UsageCounts, VideoOperation, VideoRequest,
};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Instant;
use tracing::{debug, instrument};

const PROVIDER: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini REST API client.
///
/// Reads the API key from a shared [`ApiKeyHandle`] on every call, so a key
/// saved mid-session takes effect immediately.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: ApiKeyHandle,
    ignored_citation_markers: Vec<String>,
    metrics: LlmMetrics,
}

impl GeminiClient {
    /// Client for the endpoint described by `api`.
    pub fn new(api: &ApiSettings, api_key: ApiKeyHandle) -> Self {
        Self {
            http: Client::new(),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            api_key,
            ignored_citation_markers: api.ignored_citation_markers.clone(),
            metrics: LlmMetrics::default(),
        }
    }

    #[track_caller]
    fn key(&self) -> Result<String, GeminiError> {
        self.api_key
            .get()
            .ok_or_else(|| GeminiError::new(GeminiErrorKind::MissingApiKey))
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, GeminiError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::new(GeminiErrorKind::HttpError {
                status_code: status.as_u16(),
                message,
            }));
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| {
                GeminiError::new(GeminiErrorKind::ApiRequest(format!(
                    "Failed to read response body: {}",
                    e
                )))
            })
    }

    fn parse<R: DeserializeOwned>(body: &[u8]) -> Result<R, GeminiError> {
        serde_json::from_slice(body).map_err(|e| {
            GeminiError::new(GeminiErrorKind::InvalidResponse(format!(
                "Failed to parse response: {}",
                e
            )))
        })
    }

    /// Send a request and record the outcome against `model`/`operation`.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        model: &str,
        operation: &'static str,
    ) -> Result<Vec<u8>, GeminiError> {
        let key = self.key()?;
        let started = Instant::now();

        let result = match request.header(API_KEY_HEADER, key).send().await {
            Ok(response) => Self::read_body(response).await,
            Err(e) => Err(GeminiError::new(GeminiErrorKind::ApiRequest(format!(
                "Request failed: {}",
                e
            )))),
        };

        match &result {
            Ok(_) => self.metrics.record_request(
                PROVIDER,
                model,
                operation,
                started.elapsed().as_secs_f64(),
            ),
            Err(e) => {
                self.metrics
                    .record_error(PROVIDER, model, operation, classify_error(&e.kind))
            }
        }
        result
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        model: &str,
        operation: &'static str,
    ) -> Result<R, GeminiError> {
        debug!(url, "POST");
        let body = self
            .send(self.http.post(url).json(body), model, operation)
            .await?;
        Self::parse(&body)
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        operation: &'static str,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = self.model_url(model, "generateContent");
        let response: GenerateContentResponse = self.post(&url, request, model, operation).await?;
        let usage = response.usage();
        self.metrics
            .record_tokens(model, usage.prompt_token_count, usage.candidates_token_count);
        Ok(response)
    }

    fn usage_counts(response: &GenerateContentResponse) -> UsageCounts {
        let usage = response.usage();
        UsageCounts {
            prompt_tokens: usage.prompt_token_count,
            candidate_tokens: usage.candidates_token_count,
        }
    }

    fn operation_state(op: Operation) -> VideoOperation {
        VideoOperation {
            video_uri: op.video_uri(),
            error: op.error.map(|e| e.message),
            name: op.name,
            done: op.done,
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    #[instrument(skip(self, req), fields(provider = PROVIDER, model = %req.model()))]
    async fn generate_text(&self, req: &TextRequest) -> ExplodeItResult<TextResponse> {
        let mut request = GenerateContentRequest::from_parts(vec![Part::text(req.prompt())]);
        if req.temperature().is_some() || req.response_schema().is_some() {
            request.generation_config = Some(GenerationConfig {
                temperature: *req.temperature(),
                response_mime_type: req
                    .response_schema()
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: req.response_schema().clone(),
                ..GenerationConfig::default()
            });
        }

        let response = self.generate_content(req.model(), &request, "text").await?;
        Ok(TextResponse {
            text: response.text(),
            usage: Self::usage_counts(&response),
        })
    }

    #[instrument(skip(self, req), fields(provider = PROVIDER, model = %req.model()))]
    async fn generate_grounded(&self, req: &TextRequest) -> ExplodeItResult<GroundedResponse> {
        let mut request = GenerateContentRequest::from_parts(vec![Part::text(req.prompt())]);
        request.tools = vec![Tool {
            google_search: GoogleSearch::default(),
        }];
        if let Some(temperature) = req.temperature() {
            request.generation_config = Some(GenerationConfig {
                temperature: Some(*temperature),
                ..GenerationConfig::default()
            });
        }

        let response = self
            .generate_content(req.model(), &request, "grounded")
            .await?;
        let citations = filter_citations(response.grounding_uris(), &self.ignored_citation_markers);
        debug!(citations = citations.len(), "Grounded response received");

        Ok(GroundedResponse {
            text: response.text(),
            citations,
            usage: Self::usage_counts(&response),
        })
    }

    #[instrument(skip(self, req), fields(provider = PROVIDER, model = %req.model(), conditioned = req.conditioning().is_some()))]
    async fn generate_image(&self, req: &ImageRequest) -> ExplodeItResult<ImageResponse> {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = req.conditioning() {
            parts.push(Part::inline(image));
        }
        parts.push(Part::text(req.prompt()));

        let mut request = GenerateContentRequest::from_parts(parts);
        request.generation_config = Some(GenerationConfig {
            image_config: Some(ImageConfig {
                aspect_ratio: req.aspect_ratio().clone(),
                image_size: req.image_size().clone(),
            }),
            ..GenerationConfig::default()
        });

        let response = self.generate_content(req.model(), &request, "image").await?;
        Ok(ImageResponse {
            image: response.inline_data()?,
        })
    }

    #[instrument(skip(self, req), fields(provider = PROVIDER, model = %req.model()))]
    async fn start_video(&self, req: &VideoRequest) -> ExplodeItResult<VideoOperation> {
        let request = PredictLongRunningRequest {
            instances: vec![VideoInstance {
                prompt: req.prompt().clone(),
                image: VideoFrame::from(req.start_frame()),
                last_frame: req.end_frame().as_ref().map(VideoFrame::from),
            }],
            parameters: VideoParameters {
                aspect_ratio: req.aspect_ratio().clone(),
                resolution: req.resolution().clone(),
            },
        };

        let url = self.model_url(req.model(), "predictLongRunning");
        let op: Operation = self.post(&url, &request, req.model(), "video").await?;
        if op.name.is_empty() {
            return Err(GeminiError::new(GeminiErrorKind::MissingPayload(
                "video operation name".to_string(),
            ))
            .into());
        }
        debug!(operation = %op.name, "Video job submitted");
        Ok(Self::operation_state(op))
    }

    #[instrument(skip(self, operation), fields(provider = PROVIDER, operation_name = %operation.name))]
    async fn poll_video(&self, operation: &VideoOperation) -> ExplodeItResult<VideoOperation> {
        let url = format!("{}/{}", self.base_url, operation.name);
        let body = self.send(self.http.get(&url), "operations", "video_poll").await?;
        let mut op: Operation = Self::parse(&body)?;
        if op.name.is_empty() {
            op.name = operation.name.clone();
        }
        Ok(Self::operation_state(op))
    }

    #[instrument(skip(self, uri))]
    async fn download_video(&self, uri: &str) -> ExplodeItResult<Vec<u8>> {
        let body = self
            .send(self.http.get(uri), "files", "video_download")
            .await?;
        debug!(bytes = body.len(), "Video downloaded");
        Ok(body)
    }

    #[instrument(skip(self, req), fields(provider = PROVIDER, model = %req.model, voice = %req.voice))]
    async fn synthesize_speech(&self, req: &SpeechRequest) -> ExplodeItResult<SpeechResponse> {
        let mut request = GenerateContentRequest::from_parts(vec![Part::text(req.text.as_str())]);
        request.generation_config = Some(GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(SpeechConfig::voice(req.voice.as_str())),
            ..GenerationConfig::default()
        });

        let response = self.generate_content(&req.model, &request, "speech").await?;
        Ok(SpeechResponse {
            pcm: response.inline_data()?.map(|audio| audio.data),
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
