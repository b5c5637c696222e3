//! Generate command handler.

use super::AppContext;
use super::progress::{print_summary, watch};
use explodeit::{ArtifactWriter, RunOutcome};
use std::path::Path;
use tracing::info;

/// Run one generation, for `topic` or a random topic when `None`, and write
/// what it produced under `out`.
///
/// A failed run still writes its finished artifacts, then returns an error.
pub async fn run_generation(
    context: &AppContext,
    topic: Option<&str>,
    with_video: bool,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match generate_and_save(context, topic, with_video, out).await? {
        RunOutcome::Completed { .. } => Ok(()),
        RunOutcome::Failed { failure, .. } => Err(failure.to_string().into()),
        RunOutcome::Abandoned { .. } => Err("generation abandoned: history was cleared".into()),
    }
}

/// Run one generation and write its artifacts, returning how it ended.
///
/// The failure of a failed run has already been printed by the progress
/// watcher.
pub async fn generate_and_save(
    context: &AppContext,
    topic: Option<&str>,
    with_video: bool,
    out: &Path,
) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let progress = watch(context.pipeline.session());
    let outcome = match topic {
        Some(topic) => context.pipeline.generate(topic, with_video).await,
        None => context.pipeline.surprise(with_video).await,
    };
    progress.finish().await;

    let outcome = outcome?;
    let writer = ArtifactWriter::new(out);
    if let Some(id) = outcome.item_id() {
        if let Some(item) = context.pipeline.session().item(id).await {
            let written = writer.write(&item)?;
            info!(files = written.len(), dir = %writer.item_dir(&item).display(), "Saved artifacts");
            print_summary(&item);
            println!("Saved to {}", writer.item_dir(&item).display());
        }
    }

    Ok(outcome)
}
