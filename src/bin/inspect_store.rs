//! Utility to inspect the application store and print what it holds.
//!
//! Usage: `inspect_store [status] [search]` where `status` is `all`,
//! `pending`, `approved` or `rejected`.

use dotenvy::dotenv;
use mortgage_intake::autosave::DraftStore;
use mortgage_intake::clock::SystemClock;
use mortgage_intake::models::{ApplicationFilter, ApplicationStatus};
use mortgage_intake::repository::ApplicationRepository;
use mortgage_intake::storage::FileStore;
use std::env;
use std::sync::Arc;

/// Main entry point for the store inspection utility.
///
/// Opens the storage directory named by `STORAGE_DIR` and lists applications
/// matching the optional filter.
fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let storage_dir = env::var("STORAGE_DIR").unwrap_or_else(|_| "./data".to_string());
    let store = Arc::new(FileStore::open(&storage_dir)?);
    let clock = Arc::new(SystemClock);

    let mut args = env::args().skip(1);
    let status = match args.next().as_deref() {
        None | Some("all") => None,
        Some(s) => Some(
            s.parse::<ApplicationStatus>()
                .map_err(|e| anyhow::anyhow!(e))?,
        ),
    };
    let filter = ApplicationFilter {
        status,
        query: args.next(),
    };

    let repo = ApplicationRepository::new(store.clone(), clock.clone());
    let stats = repo.stats();
    println!("Store: {}", storage_dir);
    println!(
        "Applications: {} total, {} pending, {} approved, {} rejected",
        stats.total, stats.pending, stats.approved, stats.rejected
    );
    println!();

    for app in repo.search(&filter) {
        println!(
            "{}  {:<8}  {}  {:<24}  score {}  DTI {}",
            app.id,
            app.status,
            app.submitted_date,
            app.full_name(),
            app.credit_score
                .map_or_else(|| "-".to_string(), |score| score.to_string()),
            app.dti.as_deref().unwrap_or("-")
        );
        if let Some(reason) = &app.rejection_reason {
            println!("    reason: {}", reason);
        }
        if let Some(amount) = &app.approved_amount {
            println!(
                "    approved: {} at {}",
                amount,
                app.interest_rate.as_deref().unwrap_or("-")
            );
        }
    }

    let drafts = DraftStore::new(store, clock);
    if let Some(saved) = drafts.load_saved() {
        println!();
        println!("Autosaved draft from {}", saved.timestamp);
    }

    Ok(())
}
