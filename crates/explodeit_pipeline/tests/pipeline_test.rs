//! End-to-end runs of the pipeline driver against the scripted backend.

mod test_utils;

use explodeit_config::{ApiKeyHandle, ExplodeItConfig};
use explodeit_core::{GenerationStatus, MIME_MP4, MIME_WAV};
use explodeit_error::GeminiErrorKind;
use explodeit_pipeline::{
    AUTH_FAILURE_MESSAGE, Failure, Pipeline, RunOutcome, SURPRISE_FAILURE_MESSAGE, SessionEvent,
    SessionStore,
};
use std::sync::Arc;
use test_utils::{MockBackend, WRISTWATCH_PARTS, test_config};
use tokio::sync::broadcast::Receiver;
use tokio::time::{Duration, Instant, sleep};

fn pipeline(backend: &Arc<MockBackend>) -> Pipeline<MockBackend> {
    Pipeline::new(
        Arc::clone(backend),
        Arc::new(test_config()),
        SessionStore::new(),
        ApiKeyHandle::new(Some("test-key".to_string())),
    )
}

fn statuses(rx: &mut Receiver<SessionEvent>) -> Vec<GenerationStatus> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::Status(status) = event {
            seen.push(status);
        }
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn test_full_run_with_video() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new());
    let pipeline = pipeline(&backend);
    let mut rx = pipeline.session().subscribe();

    let outcome = pipeline.generate("Mechanical Wristwatch", true).await?;
    assert!(outcome.is_completed());

    assert_eq!(
        statuses(&mut rx),
        vec![
            GenerationStatus::Planning,
            GenerationStatus::GeneratingInfographic,
            GenerationStatus::GeneratingAssembly,
            GenerationStatus::Enriching,
            GenerationStatus::Animating,
            GenerationStatus::Completed,
        ]
    );

    let snapshot = pipeline.session().snapshot().await;
    let item = snapshot.selected_item().expect("selected item");
    assert!(item.plan().is_some());
    assert!(item.infographic_url().as_deref().unwrap().starts_with("data:image/png;base64,"));
    assert!(item.assembled_url().is_some());
    assert!(
        item.video_url()
            .as_deref()
            .unwrap()
            .starts_with(&format!("data:{MIME_MP4};base64,"))
    );
    assert!(
        item.audio_url()
            .as_deref()
            .unwrap()
            .starts_with(&format!("data:{MIME_WAV};base64,"))
    );
    assert!(item.narration_script().is_some());

    let components = item.components().as_ref().unwrap();
    assert_eq!(components.len(), WRISTWATCH_PARTS.len());
    for part in components {
        assert!(!part.is_placeholder());
        assert_eq!(
            part.sources.as_deref(),
            Some(
                &[
                    "https://horology.example/a".to_string(),
                    "https://watches.example/b".to_string()
                ][..]
            )
        );
    }

    // plan + two images + three batches + video + script + speech
    assert_eq!(item.usage().len(), 9);
    assert_eq!(backend.calls("grounded"), 3);
    assert_eq!(backend.calls("start_video"), 1);
    assert_eq!(backend.calls("poll_video"), 2);
    assert_eq!(backend.calls("download_video"), 1);
    assert_eq!(snapshot.status, GenerationStatus::Completed);
    assert_eq!(pipeline.session().totals().await.calls, 9);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_run_without_video_skips_video_stage() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new());
    let pipeline = pipeline(&backend);

    let outcome = pipeline.generate("Mechanical Wristwatch", false).await?;
    let id = outcome.item_id().cloned().expect("item id");
    let item = pipeline.session().item(&id).await.expect("item");

    assert!(outcome.is_completed());
    assert_eq!(backend.calls("start_video"), 0);
    assert!(item.video_url().is_none());
    assert!(item.audio_url().is_some());
    assert!(!item.has_video());
    assert_eq!(item.usage().len(), 8);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unparsable_batch_leaves_its_components_out() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new().with_unparsable_batch("Pallet Fork"));
    let pipeline = pipeline(&backend);

    let outcome = pipeline.generate("Mechanical Wristwatch", false).await?;
    assert!(outcome.is_completed());

    let item = pipeline
        .session()
        .item(outcome.item_id().unwrap())
        .await
        .unwrap();
    let names: Vec<_> = item
        .components()
        .as_ref()
        .unwrap()
        .iter()
        .map(|part| part.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Mainspring", "Balance Wheel", "Escapement", "Sapphire Crystal"]
    );
    // Parse failures are not retried.
    assert_eq!(backend.calls("grounded"), 3);
    // The unparsable batch still cost a call.
    assert_eq!(item.usage().len(), 8);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_forbidden_plan_requires_credential() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new().with_plan_error(GeminiErrorKind::HttpError {
        status_code: 403,
        message: "PERMISSION_DENIED".to_string(),
    }));
    let pipeline = pipeline(&backend);

    let outcome = pipeline.generate("Mechanical Wristwatch", true).await?;
    match &outcome {
        RunOutcome::Failed { failure, item_id } => {
            assert!(failure.is_credential_required());
            assert_eq!(failure.to_string(), AUTH_FAILURE_MESSAGE);
            assert!(item_id.is_some());
        }
        other => panic!("Expected failure, got {:?}", other),
    }

    let attempts = ExplodeItConfig::default().retry.plan.attempts;
    assert_eq!(backend.calls("plan"), attempts as usize);
    assert_eq!(backend.calls("image"), 0);
    assert_eq!(backend.calls("grounded"), 0);
    assert_eq!(backend.calls("speech"), 0);

    let snapshot = pipeline.session().snapshot().await;
    assert_eq!(snapshot.status, GenerationStatus::Failed);
    assert!(snapshot.credential_required);
    assert!(snapshot.selected_item().unwrap().plan().is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_batch_request_fails_the_run() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new().with_failing_batch(
        "Sapphire Crystal",
        GeminiErrorKind::HttpError {
            status_code: 500,
            message: "internal".to_string(),
        },
    ));
    let pipeline = pipeline(&backend);

    let outcome = pipeline.generate("Mechanical Wristwatch", false).await?;
    let RunOutcome::Failed { failure, item_id } = outcome else {
        panic!("Expected failure");
    };
    assert!(matches!(failure, Failure::Generic { .. }));
    assert_eq!(backend.calls("speech"), 0);

    let item = pipeline.session().item(&item_id.unwrap()).await.unwrap();
    assert!(item.components().as_ref().unwrap().iter().all(|p| p.is_placeholder()));
    assert!(item.assembled_url().is_some());
    Ok(())
}

#[tokio::test]
async fn test_missing_key_creates_no_item() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new());
    let pipeline = Pipeline::new(
        Arc::clone(&backend),
        Arc::new(test_config()),
        SessionStore::new(),
        ApiKeyHandle::new(None),
    );

    let outcome = pipeline.generate("Mechanical Wristwatch", true).await?;
    assert!(matches!(
        outcome,
        RunOutcome::Failed { item_id: None, ref failure } if failure.is_credential_required()
    ));
    assert_eq!(backend.total_calls(), 0);

    let snapshot = pipeline.session().snapshot().await;
    assert!(snapshot.history.is_empty());
    assert!(snapshot.credential_required);
    assert_eq!(snapshot.status, GenerationStatus::Idle);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_surprise_runs_the_picked_topic() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new());
    let pipeline = pipeline(&backend);
    let mut rx = pipeline.session().subscribe();

    let outcome = pipeline.surprise(false).await?;
    assert!(outcome.is_completed());

    let seen = statuses(&mut rx);
    assert_eq!(
        &seen[..2],
        &[GenerationStatus::GeneratingRandom, GenerationStatus::Planning]
    );

    let snapshot = pipeline.session().snapshot().await;
    let item = snapshot.selected_item().unwrap();
    assert_eq!(item.prompt(), "Cuckoo Clock");
    assert_eq!(
        item.usage()[0].model(),
        &ExplodeItConfig::default().models.surprise
    );
    assert_eq!(item.usage().len(), 9);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_blank_surprise_uses_fallback_topic() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new().with_surprise("   "));
    let pipeline = pipeline(&backend);

    pipeline.surprise(false).await?;
    let snapshot = pipeline.session().snapshot().await;
    assert_eq!(snapshot.history[0].prompt(), "Vintage Typewriter");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_surprise_failure_returns_to_idle() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new().with_surprise_error(GeminiErrorKind::HttpError {
        status_code: 503,
        message: "overloaded".to_string(),
    }));
    let pipeline = pipeline(&backend);

    let outcome = pipeline.surprise(true).await?;
    let RunOutcome::Failed { failure, item_id } = outcome else {
        panic!("Expected failure");
    };
    assert!(item_id.is_none());
    assert_eq!(failure.to_string(), SURPRISE_FAILURE_MESSAGE);
    assert_eq!(backend.calls("plan"), 0);

    let snapshot = pipeline.session().snapshot().await;
    assert_eq!(snapshot.status, GenerationStatus::Idle);
    assert!(snapshot.history.is_empty());
    assert!(!snapshot.credential_required);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_history_accumulates_and_clears() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new());
    let pipeline = pipeline(&backend);

    let first = pipeline.generate("Mechanical Wristwatch", false).await?;
    let second = pipeline.generate("Mechanical Wristwatch", false).await?;
    assert_ne!(first.item_id(), second.item_id());

    let session = pipeline.session();
    assert_eq!(session.snapshot().await.history.len(), 2);
    assert_eq!(session.totals().await.calls, 16);

    session.select(first.item_id().unwrap()).await?;
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, GenerationStatus::Idle);
    assert_eq!(snapshot.selected.as_ref(), first.item_id());

    session.clear_history().await;
    assert!(session.snapshot().await.history.is_empty());
    assert_eq!(session.totals().await.calls, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_video_and_narration_run_concurrently() -> anyhow::Result<()> {
    let backend = Arc::new(
        MockBackend::new()
            .with_animation_delays(Duration::from_secs(30), Duration::from_secs(20)),
    );
    let pipeline = pipeline(&backend);

    let started = Instant::now();
    let outcome = pipeline.generate("Mechanical Wristwatch", true).await?;
    let elapsed = started.elapsed();

    assert!(outcome.is_completed());
    assert!(elapsed >= Duration::from_secs(30), "elapsed {elapsed:?}");
    // Back to back the two would need at least 50s.
    assert!(elapsed < Duration::from_secs(35), "elapsed {elapsed:?}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_video_poll_budget_fails_the_run() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new().with_video_polls(100));
    let pipeline = pipeline(&backend);
    let max_polls = test_config().pipeline.video_max_polls as usize;
    let attempts = test_config().retry.video.attempts as usize;

    let outcome = pipeline.generate("Mechanical Wristwatch", true).await?;
    let RunOutcome::Failed { failure, item_id } = outcome else {
        panic!("Expected failure");
    };
    assert!(matches!(failure, Failure::Generic { ref message } if message.contains("timed out")));
    assert_eq!(backend.calls("start_video"), attempts);
    assert_eq!(backend.calls("poll_video"), attempts * max_polls);
    assert_eq!(backend.calls("download_video"), 0);

    let item = pipeline.session().item(&item_id.unwrap()).await.unwrap();
    assert!(item.video_url().is_none());
    assert_eq!(pipeline.session().status().await, GenerationStatus::Failed);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_video_failure_cancels_pending_narration() -> anyhow::Result<()> {
    let backend = Arc::new(
        MockBackend::new()
            .with_video_error(GeminiErrorKind::HttpError {
                status_code: 500,
                message: "internal".to_string(),
            })
            .with_animation_delays(Duration::ZERO, Duration::from_secs(600)),
    );
    let pipeline = pipeline(&backend);

    let outcome = pipeline.generate("Mechanical Wristwatch", true).await?;
    let RunOutcome::Failed { failure, item_id } = outcome else {
        panic!("Expected failure");
    };
    assert!(matches!(failure, Failure::Generic { .. }));
    assert_eq!(backend.calls("speech"), 0);

    let item = pipeline.session().item(&item_id.unwrap()).await.unwrap();
    assert!(item.audio_url().is_none());
    assert!(item.video_url().is_none());
    assert_eq!(pipeline.session().status().await, GenerationStatus::Failed);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_clearing_history_abandons_pending_surprise() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::new().with_surprise_delay(Duration::from_secs(10)));
    let pipeline = pipeline(&backend);

    let running = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.surprise(false).await }
    });
    sleep(Duration::from_secs(1)).await;
    pipeline.session().clear_history().await;

    let outcome = running.await??;
    assert_eq!(outcome, RunOutcome::Abandoned { item_id: None });
    assert_eq!(backend.calls("plan"), 0);

    let snapshot = pipeline.session().snapshot().await;
    assert!(snapshot.history.is_empty());
    assert_eq!(snapshot.selected, None);
    assert_eq!(snapshot.status, GenerationStatus::Idle);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_clearing_history_mid_run_frees_the_session() -> anyhow::Result<()> {
    let backend = Arc::new(
        MockBackend::new().with_animation_delays(Duration::from_secs(30), Duration::from_millis(1)),
    );
    let pipeline = pipeline(&backend);

    let running = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.generate("Mechanical Wristwatch", true).await }
    });
    sleep(Duration::from_secs(10)).await;
    pipeline.session().clear_history().await;

    // The session accepts a new run while the old one is still animating.
    let next = pipeline.generate("Mechanical Wristwatch", false).await?;
    assert!(next.is_completed());

    let abandoned = running.await??;
    assert!(matches!(abandoned, RunOutcome::Abandoned { item_id: Some(_) }));

    let snapshot = pipeline.session().snapshot().await;
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.selected.as_ref(), next.item_id());
    assert_eq!(snapshot.status, GenerationStatus::Completed);
    Ok(())
}
