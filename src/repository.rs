use crate::clock::Clock;
use crate::config::DEFAULT_INTEREST_RATE;
use crate::derivation::{calculate_dti, estimate_credit_score};
use crate::errors::{AppError, ResultExt};
use crate::models::{
    ApplicationDraft, ApplicationFilter, ApplicationRecord, ApplicationStats, ApplicationStatus,
    StatusUpdate,
};
use crate::storage::{KeyValueStore, APPLICATIONS_KEY};
use crate::workflow::{apply_decision, Decision};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Persistence service for submitted applications.
///
/// All applications live as one JSON array under [`APPLICATIONS_KEY`], in
/// submission order. Every mutation is a whole-list read-modify-write, held
/// under `write_lock` so concurrent callers in one process cannot interleave.
pub struct ApplicationRepository {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    default_interest_rate: String,
    write_lock: Mutex<()>,
}

impl ApplicationRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            default_interest_rate: DEFAULT_INTEREST_RATE.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// Rate stamped on approvals that do not name one.
    pub fn with_default_interest_rate(mut self, rate: impl Into<String>) -> Self {
        self.default_interest_rate = rate.into();
        self
    }

    /// Stores `draft` as a new pending application and returns its id.
    ///
    /// Credit score and DTI are derived here, once, and kept on the record.
    /// Refuses to write when the stored list cannot be read, so existing
    /// applications are never replaced by a list holding only the new one.
    pub fn save(&self, mut draft: ApplicationDraft) -> Result<String, AppError> {
        let _guard = self.lock()?;
        let mut applications = self.load_for_update()?;

        draft.extra.retain(|key, _| {
            let reserved = ApplicationRecord::RECORD_FIELDS.contains(&key.as_str());
            if reserved {
                tracing::debug!("Dropping draft field '{}' that names a record field", key);
            }
            !reserved
        });

        let id = next_id(&applications);
        let credit_score = estimate_credit_score(&draft);
        let dti = calculate_dti(&draft);
        tracing::info!(
            "Saving application {} (credit score {}, DTI {})",
            id,
            credit_score,
            dti
        );

        let record = ApplicationRecord {
            id: id.clone(),
            credit_score: Some(credit_score),
            dti: Some(dti),
            applicant: draft,
            status: ApplicationStatus::Pending,
            submitted_date: self.clock.today(),
            approved_date: None,
            approved_amount: None,
            interest_rate: None,
            rejected_date: None,
            rejection_reason: None,
        };

        applications.push(record);
        self.persist(&applications)
            .with_context(|| format!("saving application {}", id))?;
        Ok(id)
    }

    /// Every stored application in submission order.
    ///
    /// Missing or unreadable storage yields an empty list.
    pub fn list(&self) -> Vec<ApplicationRecord> {
        self.load()
    }

    pub fn find(&self, id: &str) -> Option<ApplicationRecord> {
        self.load().into_iter().find(|app| app.id == id)
    }

    /// Applications matching the admin dashboard filter, in submission order.
    pub fn search(&self, filter: &ApplicationFilter) -> Vec<ApplicationRecord> {
        self.load()
            .into_iter()
            .filter(|app| filter.matches(app))
            .collect()
    }

    pub fn stats(&self) -> ApplicationStats {
        ApplicationStats::from_records(&self.load())
    }

    /// Records a reviewer decision on the application with `id`.
    ///
    /// An unknown id changes nothing and reports [`StatusUpdate::NotFound`].
    /// Incomplete decisions, already-decided applications and unreadable
    /// storage are errors.
    pub fn update_status(&self, id: &str, decision: Decision) -> Result<StatusUpdate, AppError> {
        let _guard = self.lock()?;
        let mut applications = self.load_for_update()?;

        let Some(record) = applications.iter_mut().find(|app| app.id == id) else {
            tracing::debug!("Status update for unknown application {} ignored", id);
            return Ok(StatusUpdate::NotFound);
        };

        apply_decision(
            record,
            decision,
            self.clock.today(),
            &self.default_interest_rate,
        )?;

        self.persist(&applications)
            .with_context(|| format!("updating application {}", id))?;
        Ok(StatusUpdate::Applied)
    }

    /// Deletes every stored application.
    pub fn clear_all(&self) -> Result<(), AppError> {
        let _guard = self.lock()?;
        self.store.remove(APPLICATIONS_KEY)?;
        tracing::warn!("All stored applications cleared");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, AppError> {
        self.write_lock
            .lock()
            .map_err(|_| AppError::InternalError("application write lock poisoned".to_string()))
    }

    /// Read path: unreadable storage lists as empty.
    fn load(&self) -> Vec<ApplicationRecord> {
        self.load_for_update().unwrap_or_else(|e| {
            tracing::warn!("Stored applications are unreadable, treating as empty: {}", e);
            Vec::new()
        })
    }

    /// Write path: a missing key is an empty list, an unparsable one is an error.
    fn load_for_update(&self) -> Result<Vec<ApplicationRecord>, AppError> {
        let Some(raw) = self.store.get(APPLICATIONS_KEY) else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|e| {
            AppError::StorageError(format!(
                "stored applications under '{}' are unreadable ({}); refusing to overwrite",
                APPLICATIONS_KEY, e
            ))
        })
    }

    fn persist(&self, applications: &[ApplicationRecord]) -> Result<(), AppError> {
        let json = serde_json::to_string(applications)?;
        self.store.set(APPLICATIONS_KEY, &json)
    }
}

/// `APP-<n>` where `n` is one past the current count, advanced past any id
/// already taken.
fn next_id(applications: &[ApplicationRecord]) -> String {
    let taken: HashSet<&str> = applications.iter().map(|app| app.id.as_str()).collect();
    let mut sequence = applications.len() + 1;
    loop {
        let id = format!("APP-{:03}", sequence);
        if !taken.contains(id.as_str()) {
            return id;
        }
        sequence += 1;
    }
}
