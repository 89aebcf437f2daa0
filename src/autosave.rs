use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::{ApplicationDraft, SavedDraft};
use crate::storage::{KeyValueStore, DRAFT_KEY};
use std::sync::Arc;

/// Autosave channel for the wizard's in-progress draft.
///
/// Holds at most one draft, stored with the time it was saved so the
/// applicant can be offered to resume where they left off.
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl DraftStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Replaces the saved draft and returns the stored envelope.
    pub fn save_draft(&self, draft: &ApplicationDraft) -> Result<SavedDraft, AppError> {
        let saved = SavedDraft {
            data: draft.clone(),
            timestamp: self.clock.now(),
        };
        self.store.set(DRAFT_KEY, &serde_json::to_string(&saved)?)?;
        tracing::debug!("Draft autosaved at {}", saved.timestamp);
        Ok(saved)
    }

    /// The saved draft with its timestamp, if one exists and is readable.
    pub fn load_saved(&self) -> Option<SavedDraft> {
        let raw = self.store.get(DRAFT_KEY)?;
        match serde_json::from_str::<SavedDraft>(&raw) {
            Ok(saved) => Some(saved),
            Err(e) => {
                tracing::warn!("Failed to load saved application: {}", e);
                None
            }
        }
    }

    pub fn load_draft(&self) -> Option<ApplicationDraft> {
        self.load_saved().map(|saved| saved.data)
    }

    /// Whether a resumable draft with at least one entered field exists.
    pub fn has_saved_draft(&self) -> bool {
        self.load_draft().is_some_and(|draft| !draft.is_empty())
    }

    pub fn clear_draft(&self) -> Result<(), AppError> {
        self.store.remove(DRAFT_KEY)
    }
}
