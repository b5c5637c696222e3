//! In-memory session: history, selection, status and the usage ledger.
//!
//! The store is a cloneable handle. Every change is published on a broadcast
//! channel so observers can render progress as each stage lands.

use crate::Failure;
use explodeit_core::{
    GenerationItem, GenerationStatus, ItemId, ItemPatch, TokenUsage, UsageTotals,
};
use explodeit_error::{PipelineError, PipelineErrorKind};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, instrument, warn};

const EVENT_CAPACITY: usize = 256;

/// Identifies one pipeline run.
///
/// Status, failure and item-creation writes carrying a token that is no
/// longer the active run are dropped, so an abandoned run cannot overwrite
/// the current status or repopulate a cleared history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("run-{}", _0)]
pub struct RunToken(u64);

/// Change notification published by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Session status changed
    Status(GenerationStatus),
    /// A new item was appended to history
    ItemAdded(ItemId),
    /// A stage patched an item
    ItemUpdated(ItemId),
    /// Selection changed
    Selected(Option<ItemId>),
    /// History was emptied
    HistoryCleared,
    /// A run or submission failed
    Failed(Failure),
}

/// Point-in-time copy of the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    /// Every item, oldest first
    pub history: Vec<GenerationItem>,
    /// Currently selected item
    pub selected: Option<ItemId>,
    /// Current status
    pub status: GenerationStatus,
    /// Failure of the last run, until the next run starts
    pub error: Option<Failure>,
    /// Whether the user must enter a credential before the next run
    pub credential_required: bool,
}

impl SessionSnapshot {
    /// The selected item, if it still exists.
    pub fn selected_item(&self) -> Option<&GenerationItem> {
        let id = self.selected.as_ref()?;
        self.history.iter().find(|item| item.id() == id)
    }

    /// Cost and unit totals over the whole history.
    pub fn totals(&self) -> UsageTotals {
        UsageTotals::from_items(&self.history)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    snapshot: SessionSnapshot,
    active_run: Option<RunToken>,
    next_run: u64,
}

impl SessionState {
    fn item_mut(&mut self, id: &ItemId) -> Option<&mut GenerationItem> {
        self.snapshot
            .history
            .iter_mut()
            .find(|item| item.id() == id)
    }

    fn is_active(&self, run: RunToken) -> bool {
        self.active_run == Some(run)
    }
}

/// Shared handle to one session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Empty session in the idle state.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            events,
        }
    }

    /// Receive every change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// Copy of the current session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot.clone()
    }

    /// Current status.
    pub async fn status(&self) -> GenerationStatus {
        self.state.read().await.snapshot.status
    }

    /// Copy of one item.
    pub async fn item(&self, id: &ItemId) -> Option<GenerationItem> {
        self.state
            .read()
            .await
            .snapshot
            .history
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Totals over the whole history.
    pub async fn totals(&self) -> UsageTotals {
        self.state.read().await.snapshot.totals()
    }

    /// Start a run in status `first`.
    ///
    /// Rejected with [`PipelineErrorKind::Busy`] while another run is in
    /// flight. Clears the previous run's failure.
    #[instrument(skip(self))]
    pub async fn begin_run(&self, first: GenerationStatus) -> Result<RunToken, PipelineError> {
        let mut state = self.state.write().await;
        if state.active_run.is_some() || state.snapshot.status.is_processing() {
            warn!(status = %state.snapshot.status, "Rejected submission while busy");
            return Err(PipelineError::new(PipelineErrorKind::Busy));
        }
        let status = state.snapshot.status.transition(first)?;

        state.next_run += 1;
        let run = RunToken(state.next_run);
        state.active_run = Some(run);
        state.snapshot.status = status;
        state.snapshot.error = None;
        info!(%run, status = %status, "Run started");
        self.emit(SessionEvent::Status(status));
        Ok(run)
    }

    /// Move the session to `next` on behalf of `run`.
    ///
    /// Returns `false` when `run` is no longer the active run and the write
    /// was dropped. A status that is not processing ends the run.
    pub async fn set_status(
        &self,
        run: RunToken,
        next: GenerationStatus,
    ) -> Result<bool, PipelineError> {
        let mut state = self.state.write().await;
        if !state.is_active(run) {
            debug!(%run, status = %next, "Dropping status from inactive run");
            return Ok(false);
        }
        let status = state.snapshot.status.transition(next)?;
        state.snapshot.status = status;
        if !status.is_processing() {
            state.active_run = None;
        }
        info!(%run, status = %status, label = status.label(), "Status changed");
        self.emit(SessionEvent::Status(status));
        Ok(true)
    }

    /// End `run` with `failure`, leaving the session in `status`.
    ///
    /// `status` is [`GenerationStatus::Failed`] for pipeline failures and
    /// [`GenerationStatus::Idle`] when the random topic call fails.
    pub async fn fail(
        &self,
        run: RunToken,
        failure: Failure,
        status: GenerationStatus,
    ) -> Result<bool, PipelineError> {
        let mut state = self.state.write().await;
        if !state.is_active(run) {
            debug!(%run, %failure, "Dropping failure from inactive run");
            return Ok(false);
        }
        let status = state.snapshot.status.transition(status)?;
        state.snapshot.status = status;
        state.active_run = None;
        if failure.is_credential_required() {
            state.snapshot.credential_required = true;
        }
        state.snapshot.error = Some(failure.clone());
        info!(%run, status = %status, %failure, "Run failed");
        self.emit(SessionEvent::Failed(failure));
        self.emit(SessionEvent::Status(status));
        Ok(true)
    }

    /// Append a new item for `prompt` on behalf of `run` and select it.
    ///
    /// The id comes from the current time in milliseconds, bumped past any
    /// id already in history. Returns `None` without touching history when
    /// `run` is no longer the active run.
    pub async fn add_item(
        &self,
        run: RunToken,
        prompt: &str,
        has_video: bool,
        initial_usage: Vec<TokenUsage>,
    ) -> Option<ItemId> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let mut state = self.state.write().await;
        if !state.is_active(run) {
            debug!(%run, prompt, "Dropping item from inactive run");
            return None;
        }

        let mut millis = timestamp;
        let mut id = ItemId::from_millis(millis);
        while state.snapshot.history.iter().any(|item| item.id() == &id) {
            millis += 1;
            id = ItemId::from_millis(millis);
        }

        let item = GenerationItem::new(id.clone(), prompt, timestamp, has_video, initial_usage);
        state.snapshot.history.push(item);
        state.snapshot.selected = Some(id.clone());
        debug!(id = %id, prompt, "Item added");
        self.emit(SessionEvent::ItemAdded(id.clone()));
        self.emit(SessionEvent::Selected(Some(id.clone())));
        Some(id)
    }

    /// Merge `patch` into the item `id`.
    ///
    /// Returns `false` when the item no longer exists, for example after
    /// history was cleared mid-run.
    pub async fn patch_item(&self, id: &ItemId, patch: ItemPatch) -> bool {
        let mut state = self.state.write().await;
        match state.item_mut(id) {
            Some(item) => {
                item.apply(patch);
                self.emit(SessionEvent::ItemUpdated(id.clone()));
                true
            }
            None => {
                debug!(id = %id, "Patch for missing item ignored");
                false
            }
        }
    }

    /// Select a history item. While no run is in flight, status returns to
    /// idle.
    pub async fn select(&self, id: &ItemId) -> Result<(), PipelineError> {
        let mut state = self.state.write().await;
        if !state.snapshot.history.iter().any(|item| item.id() == id) {
            return Err(PipelineError::new(PipelineErrorKind::UnknownItem(
                id.to_string(),
            )));
        }
        state.snapshot.selected = Some(id.clone());
        self.emit(SessionEvent::Selected(Some(id.clone())));

        if !state.snapshot.status.is_processing() && state.snapshot.status != GenerationStatus::Idle
        {
            state.snapshot.status = GenerationStatus::Idle;
            self.emit(SessionEvent::Status(GenerationStatus::Idle));
        }
        Ok(())
    }

    /// Empty the history, clear the selection and go idle.
    ///
    /// Any run still in flight loses its status writes; its item patches find
    /// nothing to land on.
    pub async fn clear_history(&self) {
        let mut state = self.state.write().await;
        if let Some(run) = state.active_run.take() {
            info!(%run, "Abandoning active run");
        }
        state.snapshot.history.clear();
        state.snapshot.selected = None;
        state.snapshot.status = GenerationStatus::Idle;
        state.snapshot.error = None;
        self.emit(SessionEvent::HistoryCleared);
        self.emit(SessionEvent::Selected(None));
        self.emit(SessionEvent::Status(GenerationStatus::Idle));
    }

    /// Record a submission refused for lack of a credential.
    pub async fn require_credential(&self, failure: Failure) {
        let mut state = self.state.write().await;
        state.snapshot.credential_required = true;
        state.snapshot.error = Some(failure.clone());
        self.emit(SessionEvent::Failed(failure));
    }

    /// A credential was saved: the prompt closes and the last error clears.
    pub async fn credential_saved(&self) {
        let mut state = self.state.write().await;
        state.snapshot.credential_required = false;
        state.snapshot.error = None;
    }

    /// The credential was removed: the user must enter one again.
    pub async fn credential_cleared(&self) {
        self.state.write().await.snapshot.credential_required = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn busy_while_a_run_is_active() {
        let store = SessionStore::new();
        let run = store.begin_run(GenerationStatus::Planning).await.unwrap();
        let err = store.begin_run(GenerationStatus::Planning).await.unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Busy);

        store
            .fail(run, Failure::Generic { message: "boom".into() }, GenerationStatus::Failed)
            .await
            .unwrap();
        assert!(store.begin_run(GenerationStatus::Planning).await.is_ok());
    }

    #[tokio::test]
    async fn ids_are_unique_within_a_millisecond() {
        let store = SessionStore::new();
        let run = store.begin_run(GenerationStatus::Planning).await.unwrap();
        let a = store.add_item(run, "A", false, vec![]).await.unwrap();
        let b = store.add_item(run, "B", false, vec![]).await.unwrap();
        assert_ne!(a, b);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.history[0].prompt(), "A");
        assert_eq!(snapshot.selected, Some(b));
    }

    #[tokio::test]
    async fn selecting_resets_finished_status() {
        let store = SessionStore::new();
        let run = store.begin_run(GenerationStatus::Planning).await.unwrap();
        let id = store.add_item(run, "Toaster", false, vec![]).await.unwrap();
        store
            .fail(run, Failure::Generic { message: "x".into() }, GenerationStatus::Failed)
            .await
            .unwrap();

        store.select(&id).await.unwrap();
        assert_eq!(store.status().await, GenerationStatus::Idle);
        assert!(store.select(&ItemId::from("missing")).await.is_err());
    }

    #[tokio::test]
    async fn clear_history_drops_later_writes_from_the_old_run() {
        let store = SessionStore::new();
        let run = store.begin_run(GenerationStatus::Planning).await.unwrap();
        let id = store.add_item(run, "Kettle", false, vec![]).await.unwrap();

        store.clear_history().await;
        assert_eq!(store.add_item(run, "Kettle", false, vec![]).await, None);
        let applied = store
            .set_status(run, GenerationStatus::GeneratingInfographic)
            .await
            .unwrap();
        assert!(!applied);
        assert!(!store.patch_item(&id, ItemPatch::new().infographic_url("u")).await);

        let snapshot = store.snapshot().await;
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.selected, None);
        assert_eq!(snapshot.status, GenerationStatus::Idle);
    }
}
