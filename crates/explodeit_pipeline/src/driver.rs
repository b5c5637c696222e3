//! Pipeline driver.
//!
//! Sequences the stages for one request, patches the session's item after
//! each stage and turns a terminal error into a classified failure.

use crate::{BatchFailure, BatchOutcome, Failure, RunToken, SessionStore, Stages};
use explodeit_config::{ApiKeyHandle, CredentialStore, ExplodeItConfig};
use explodeit_core::{ComponentPart, GenerationStatus, ItemId, ItemPatch, TokenUsage};
use explodeit_error::{ExplodeItError, ExplodeItResult, GeminiError, GeminiErrorKind};
use explodeit_interface::GenerationBackend;
use futures::future::try_join;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every stage finished
    Completed {
        /// The finished item
        item_id: ItemId,
    },
    /// The run stopped on a failure
    Failed {
        /// Item holding whatever stages finished, absent when the run failed
        /// before an item was created
        item_id: Option<ItemId>,
        /// Classified failure
        failure: Failure,
    },
    /// History was cleared while the run was in flight; its remaining
    /// writes were dropped
    Abandoned {
        /// Item the run had created before it was abandoned, now gone
        item_id: Option<ItemId>,
    },
}

/// Whether a run still owns the session after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Running,
    Abandoned,
}

impl RunOutcome {
    /// Item produced by the run, if any.
    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            Self::Completed { item_id } => Some(item_id),
            Self::Failed { item_id, .. } | Self::Abandoned { item_id } => item_id.as_ref(),
        }
    }

    /// Whether the run reached completion.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Drives requests through the stages against one session.
#[derive(Debug)]
pub struct Pipeline<B: ?Sized> {
    stages: Stages<B>,
    session: SessionStore,
    api_key: ApiKeyHandle,
}

impl<B: ?Sized> Clone for Pipeline<B> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
            session: self.session.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

impl<B: GenerationBackend + ?Sized> Pipeline<B> {
    /// Build a pipeline. `api_key` must be the handle the backend reads.
    pub fn new(
        backend: Arc<B>,
        config: Arc<ExplodeItConfig>,
        session: SessionStore,
        api_key: ApiKeyHandle,
    ) -> Self {
        Self {
            stages: Stages::new(backend, config),
            session,
            api_key,
        }
    }

    /// Session this pipeline writes to.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Stage functions.
    pub fn stages(&self) -> &Stages<B> {
        &self.stages
    }

    /// Persist `key`, apply it to the backend and close the credential prompt.
    pub async fn save_api_key(&self, store: &CredentialStore, key: &str) -> ExplodeItResult<()> {
        store.save(key)?;
        self.api_key.set(key);
        self.session.credential_saved().await;
        info!("API key saved");
        Ok(())
    }

    /// Remove the persisted key and require a new one.
    pub async fn clear_api_key(&self, store: &CredentialStore) -> ExplodeItResult<()> {
        store.clear()?;
        self.api_key.clear();
        self.session.credential_cleared().await;
        info!("API key cleared");
        Ok(())
    }

    /// Run the full pipeline for `topic`.
    ///
    /// Fails only when the session is busy or the status machine rejects a
    /// move. Every stage failure comes back as [`RunOutcome::Failed`], and a
    /// run whose history was cleared under it as [`RunOutcome::Abandoned`].
    #[instrument(skip(self))]
    pub async fn generate(&self, topic: &str, with_video: bool) -> ExplodeItResult<RunOutcome> {
        if let Some(outcome) = self.refuse_without_key().await {
            return Ok(outcome);
        }
        let run = self.session.begin_run(GenerationStatus::Planning).await?;
        self.run(run, topic, with_video, Vec::new()).await
    }

    /// Pick a random topic, then run the full pipeline for it.
    ///
    /// When the topic call fails the session returns to idle rather than
    /// failed, and no item is created.
    #[instrument(skip(self))]
    pub async fn surprise(&self, with_video: bool) -> ExplodeItResult<RunOutcome> {
        if let Some(outcome) = self.refuse_without_key().await {
            return Ok(outcome);
        }
        let run = self
            .session
            .begin_run(GenerationStatus::GeneratingRandom)
            .await?;

        match self.stages.surprise().await {
            Ok(topic) => {
                if !self
                    .session
                    .set_status(run, GenerationStatus::Planning)
                    .await?
                {
                    info!(%run, "Run abandoned before planning");
                    return Ok(RunOutcome::Abandoned { item_id: None });
                }
                self.run(run, &topic.value, with_video, topic.usage).await
            }
            Err(e) => {
                error!(error = %e, "Random topic failed");
                let failure = Failure::classify_surprise(&e);
                if !self
                    .session
                    .fail(run, failure.clone(), GenerationStatus::Idle)
                    .await?
                {
                    return Ok(RunOutcome::Abandoned { item_id: None });
                }
                Ok(RunOutcome::Failed {
                    item_id: None,
                    failure,
                })
            }
        }
    }

    async fn refuse_without_key(&self) -> Option<RunOutcome> {
        if self.api_key.is_set() {
            return None;
        }
        let failure = Failure::missing_credential();
        self.session.require_credential(failure.clone()).await;
        Some(RunOutcome::Failed {
            item_id: None,
            failure,
        })
    }

    async fn run(
        &self,
        run: RunToken,
        topic: &str,
        with_video: bool,
        seed_usage: Vec<TokenUsage>,
    ) -> ExplodeItResult<RunOutcome> {
        let Some(item_id) = self
            .session
            .add_item(run, topic, with_video, seed_usage)
            .await
        else {
            info!(%run, "Run abandoned before its item was created");
            return Ok(RunOutcome::Abandoned { item_id: None });
        };

        match self.execute(run, &item_id, topic, with_video).await {
            Ok(Progress::Running) => {
                if self
                    .session
                    .set_status(run, GenerationStatus::Completed)
                    .await?
                {
                    info!(id = %item_id, "Generation complete");
                    return Ok(RunOutcome::Completed { item_id });
                }
            }
            Ok(Progress::Abandoned) => {}
            Err(e) => {
                error!(id = %item_id, error = %e, "Generation failed");
                let failure = Failure::classify(&e);
                if self
                    .session
                    .fail(run, failure.clone(), GenerationStatus::Failed)
                    .await?
                {
                    return Ok(RunOutcome::Failed {
                        item_id: Some(item_id),
                        failure,
                    });
                }
            }
        }
        info!(%run, id = %item_id, "Run abandoned");
        Ok(RunOutcome::Abandoned {
            item_id: Some(item_id),
        })
    }

    async fn advance(&self, run: RunToken, status: GenerationStatus) -> ExplodeItResult<Progress> {
        Ok(if self.session.set_status(run, status).await? {
            Progress::Running
        } else {
            Progress::Abandoned
        })
    }

    async fn execute(
        &self,
        run: RunToken,
        id: &ItemId,
        topic: &str,
        with_video: bool,
    ) -> ExplodeItResult<Progress> {
        let plan = self.stages.plan(topic).await?;
        let placeholders: Vec<_> = plan
            .value
            .component_list
            .iter()
            .map(ComponentPart::placeholder)
            .collect();
        self.session
            .patch_item(
                id,
                ItemPatch::new()
                    .plan(plan.value.clone())
                    .components(placeholders)
                    .usages(plan.usage),
            )
            .await;
        let plan = plan.value;

        if self.advance(run, GenerationStatus::GeneratingInfographic).await? == Progress::Abandoned {
            return Ok(Progress::Abandoned);
        }
        let infographic = self.stages.infographic(topic, &plan).await?;
        self.session
            .patch_item(
                id,
                ItemPatch::new()
                    .infographic_url(infographic.value.as_str())
                    .usages(infographic.usage),
            )
            .await;
        let infographic_url = infographic.value;

        if self.advance(run, GenerationStatus::GeneratingAssembly).await? == Progress::Abandoned {
            return Ok(Progress::Abandoned);
        }
        let assembled = self
            .stages
            .assembled(topic, &plan, &infographic_url)
            .await?;
        self.session
            .patch_item(
                id,
                ItemPatch::new()
                    .assembled_url(assembled.value.as_str())
                    .usages(assembled.usage),
            )
            .await;
        let assembled_url = assembled.value;

        if self.advance(run, GenerationStatus::Enriching).await? == Progress::Abandoned {
            return Ok(Progress::Abandoned);
        }
        let report = self.stages.enrich(topic, &plan.component_list).await;
        if let Some(BatchOutcome {
            result: Err(BatchFailure::Request(message)),
            ..
        }) = report.request_failure()
        {
            return Err(GeminiError::new(GeminiErrorKind::ApiRequest(message.clone())).into());
        }
        self.session
            .patch_item(
                id,
                ItemPatch::new()
                    .components(report.components())
                    .usages(report.usage),
            )
            .await;

        if self.advance(run, GenerationStatus::Animating).await? == Progress::Abandoned {
            return Ok(Progress::Abandoned);
        }
        let video = async {
            if !with_video {
                return Ok(());
            }
            let output = self
                .stages
                .video(topic, &plan, &assembled_url, Some(&infographic_url))
                .await?;
            self.session
                .patch_item(
                    id,
                    ItemPatch::new()
                        .video_url(output.value)
                        .usages(output.usage),
                )
                .await;
            Ok::<_, ExplodeItError>(())
        };
        let narration = async {
            let output = self.stages.narration(topic, &plan).await?;
            self.session
                .patch_item(
                    id,
                    ItemPatch::new()
                        .narration_script(output.value.script)
                        .audio_url(output.value.audio_url)
                        .usages(output.usage),
                )
                .await;
            Ok::<_, ExplodeItError>(())
        };
        try_join(video, narration).await?;
        Ok(Progress::Running)
    }
}
