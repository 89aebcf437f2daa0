//! Review state machine for submitted applications.
//!
//! `pending` is the only state that accepts a decision. Approving or
//! rejecting stamps the decision date and its details; both outcomes are
//! terminal.

use crate::errors::AppError;
use crate::models::{ApplicationRecord, ApplicationStatus};
use chrono::NaiveDate;

/// A reviewer's decision on a pending application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approve {
        amount: String,
        /// Falls back to the configured default rate when absent or blank.
        interest_rate: Option<String>,
    },
    Reject {
        reason: String,
    },
}

impl Decision {
    /// Status the application ends up in.
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            Decision::Approve { .. } => ApplicationStatus::Approved,
            Decision::Reject { .. } => ApplicationStatus::Rejected,
        }
    }

    /// Checks the decision carries what its transition requires.
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            Decision::Approve { amount, .. } if amount.trim().is_empty() => Err(
                AppError::BadRequest("Approved amount is required".to_string()),
            ),
            Decision::Reject { reason } if reason.trim().is_empty() => Err(
                AppError::BadRequest("Rejection reason is required".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Applies `decision` to `record` as of `today`.
///
/// The record is left untouched when the decision is incomplete or the
/// record has already been decided.
pub fn apply_decision(
    record: &mut ApplicationRecord,
    decision: Decision,
    today: NaiveDate,
    default_interest_rate: &str,
) -> Result<(), AppError> {
    decision.validate()?;

    if record.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Application {} is already {}",
            record.id, record.status
        )));
    }

    match decision {
        Decision::Approve {
            amount,
            interest_rate,
        } => {
            let rate = interest_rate
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| default_interest_rate.to_string());
            record.status = ApplicationStatus::Approved;
            record.approved_date = Some(today);
            record.approved_amount = Some(amount);
            record.interest_rate = Some(rate);
            record.rejected_date = None;
            record.rejection_reason = None;
        }
        Decision::Reject { reason } => {
            record.status = ApplicationStatus::Rejected;
            record.rejected_date = Some(today);
            record.rejection_reason = Some(reason);
            record.approved_date = None;
            record.approved_amount = None;
            record.interest_rate = None;
        }
    }

    tracing::info!("Application {} marked {}", record.id, record.status);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationDraft;

    fn pending() -> ApplicationRecord {
        ApplicationRecord {
            id: "APP-001".to_string(),
            applicant: ApplicationDraft::default(),
            status: ApplicationStatus::Pending,
            submitted_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            credit_score: Some(700),
            dti: Some("N/A".to_string()),
            approved_date: None,
            approved_amount: None,
            interest_rate: None,
            rejected_date: None,
            rejection_reason: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn approve_sets_decision_fields_and_default_rate() {
        let mut record = pending();
        let decision = Decision::Approve {
            amount: "300000".to_string(),
            interest_rate: None,
        };
        apply_decision(&mut record, decision, today(), "6.5%").unwrap();

        assert_eq!(record.status, ApplicationStatus::Approved);
        assert_eq!(record.approved_date, Some(today()));
        assert_eq!(record.approved_amount.as_deref(), Some("300000"));
        assert_eq!(record.interest_rate.as_deref(), Some("6.5%"));
        assert!(record.is_consistent());
    }

    #[test]
    fn approve_keeps_explicit_rate() {
        let mut record = pending();
        let decision = Decision::Approve {
            amount: "$308,000".to_string(),
            interest_rate: Some("6.375%".to_string()),
        };
        apply_decision(&mut record, decision, today(), "6.5%").unwrap();
        assert_eq!(record.interest_rate.as_deref(), Some("6.375%"));
    }

    #[test]
    fn reject_sets_reason() {
        let mut record = pending();
        let decision = Decision::Reject {
            reason: "Debt-to-income ratio exceeds guidelines".to_string(),
        };
        apply_decision(&mut record, decision, today(), "6.5%").unwrap();

        assert_eq!(record.status, ApplicationStatus::Rejected);
        assert_eq!(record.rejected_date, Some(today()));
        assert!(record.approved_amount.is_none());
        assert!(record.is_consistent());
    }

    #[test]
    fn blank_details_are_refused() {
        let mut record = pending();
        let err = apply_decision(
            &mut record,
            Decision::Approve {
                amount: "  ".to_string(),
                interest_rate: None,
            },
            today(),
            "6.5%",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = apply_decision(
            &mut record,
            Decision::Reject {
                reason: String::new(),
            },
            today(),
            "6.5%",
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(record, pending());
    }

    #[test]
    fn decided_applications_are_terminal() {
        let mut record = pending();
        apply_decision(
            &mut record,
            Decision::Approve {
                amount: "250000".to_string(),
                interest_rate: None,
            },
            today(),
            "6.5%",
        )
        .unwrap();
        let approved = record.clone();

        let err = apply_decision(
            &mut record,
            Decision::Reject {
                reason: "changed my mind".to_string(),
            },
            today(),
            "6.5%",
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(record, approved);
    }
}
