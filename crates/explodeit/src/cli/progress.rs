//! Console progress from session events.

use explodeit::{Failure, GenerationItem, SessionEvent, SessionStore};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Console printer for one run's session events.
pub struct ProgressWatcher {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ProgressWatcher {
    /// Print what is still queued, then stop.
    pub async fn finish(self) {
        // The task may already have exited on a closed channel.
        let _ = self.stop.send(());
        let _ = self.handle.await;
    }
}

/// Print every status change and failure of `session` until
/// [`ProgressWatcher::finish`].
pub fn watch(session: &SessionStore) -> ProgressWatcher {
    spawn_watcher(session, print_event)
}

fn spawn_watcher<F>(session: &SessionStore, mut on_event: F) -> ProgressWatcher
where
    F: FnMut(SessionEvent) + Send + 'static,
{
    let mut events = session.subscribe();
    let (stop, mut stopped) = oneshot::channel();
    let handle = tokio::spawn(async move {
        loop {
            // Queued events win over the stop signal, so nothing sent before
            // `finish` is lost.
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Ok(event) => on_event(event),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = &mut stopped => break,
            }
        }
    });
    ProgressWatcher { stop, handle }
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::Status(status) => match status.step() {
            Some(step) => println!("[{step}/5] {}...", status.label()),
            None => println!("{}", status.label()),
        },
        SessionEvent::Failed(failure) => print_failure(&failure),
        _ => {}
    }
}

fn print_failure(failure: &Failure) {
    eprintln!("Error: {failure}");
    if failure.is_credential_required() {
        eprintln!("Save a key with `explodeit key set <KEY>` or set GEMINI_API_KEY.");
    }
}

pub fn print_summary(item: &GenerationItem) {
    let title = item
        .plan()
        .as_ref()
        .map_or(item.prompt().as_str(), |plan| plan.display_title.as_str());
    let parts = item.components().as_ref().map_or(0, Vec::len);
    println!(
        "{title}: {parts} components, {} calls, ~${:.4}",
        item.usage().len(),
        item.total_cost()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use explodeit::GenerationStatus;
    use std::sync::{Arc, Mutex};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn finish_drains_events_sent_before_it() {
        let session = SessionStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let watcher = spawn_watcher(&session, move |event| sink.lock().unwrap().push(event));

        let run = session.begin_run(GenerationStatus::Planning).await.unwrap();
        let failure = Failure::missing_credential();
        session
            .fail(run, failure.clone(), GenerationStatus::Failed)
            .await
            .unwrap();
        watcher.finish().await;

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                SessionEvent::Status(GenerationStatus::Planning),
                SessionEvent::Failed(failure),
                SessionEvent::Status(GenerationStatus::Failed),
            ]
        );
    }
}
