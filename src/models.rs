use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============ Intake Models ============

/// In-progress application fields collected by the intake wizard.
///
/// Every field is optional: the wizard fills them step by step and the
/// autosave channel persists whatever has been typed so far. Monetary
/// values are kept as the currency-formatted strings the applicant sees
/// (e.g. `"350,000"`). Wizard fields not modeled here are carried in
/// `extra` so a resumed draft gets back everything the applicant typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationDraft {
    // Personal info
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,

    // Property & loan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<String>,
    /// Term in years (`"15"`, `"20"`, `"30"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_type: Option<String>,

    // Financial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquid_assets: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retirement_assets: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_income: Option<String>,
    /// Existing monthly debt payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_debt: Option<String>,
    /// Current monthly housing payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub bankruptcy_history: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub foreclosure_history: bool,

    // Employment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_employed: Option<String>,

    /// Any other wizard field, kept verbatim under its JSON name.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ApplicationDraft {
    /// True when nothing at all has been entered.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Autosave envelope stored under the draft key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedDraft {
    pub data: ApplicationDraft,
    pub timestamp: DateTime<Utc>,
}

// ============ Stored Application Models ============

/// Review state of a submitted application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Approved and rejected applications accept no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("Unknown application status: {}", other)),
        }
    }
}

/// A submitted application as persisted under the applications key.
///
/// The applicant's fields are flattened next to the bookkeeping fields so the
/// stored JSON stays a single flat object per application. `credit_score` and
/// `dti` are derived once when the record is created and never recomputed;
/// records written by older clients may lack them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    /// Sequential identifier, `APP-001`, `APP-002`, ...
    pub id: String,
    #[serde(flatten)]
    pub applicant: ApplicationDraft,
    pub status: ApplicationStatus,
    pub submitted_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dti: Option<String>,

    // Decision fields, set by the review workflow only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl ApplicationRecord {
    /// JSON names owned by the record itself. A draft's `extra` fields must
    /// not reuse them or the flattened object would carry duplicate keys.
    pub const RECORD_FIELDS: [&'static str; 10] = [
        "id",
        "status",
        "submittedDate",
        "creditScore",
        "dti",
        "approvedDate",
        "approvedAmount",
        "interestRate",
        "rejectedDate",
        "rejectionReason",
    ];

    /// Applicant's display name, "First Last".
    pub fn full_name(&self) -> String {
        let first = self.applicant.first_name.as_deref().unwrap_or("");
        let last = self.applicant.last_name.as_deref().unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }

    /// Whether the decision fields agree with `status`.
    pub fn is_consistent(&self) -> bool {
        let approved_fields = self.approved_date.is_some()
            || self.approved_amount.is_some()
            || self.interest_rate.is_some();
        let rejected_fields = self.rejected_date.is_some() || self.rejection_reason.is_some();

        match self.status {
            ApplicationStatus::Pending => !approved_fields && !rejected_fields,
            ApplicationStatus::Approved => {
                self.approved_date.is_some() && self.approved_amount.is_some() && !rejected_fields
            }
            ApplicationStatus::Rejected => {
                self.rejected_date.is_some() && self.rejection_reason.is_some() && !approved_fields
            }
        }
    }
}

/// Outcome of a status update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The decision was recorded and persisted.
    Applied,
    /// No application with the given id exists; nothing changed.
    NotFound,
}

// ============ Admin Dashboard Models ============

/// Admin list filter: status (or all) plus a free-text search.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    /// `None` means all statuses.
    pub status: Option<ApplicationStatus>,
    /// Matched case-insensitively against first name, last name, id and email.
    pub query: Option<String>,
}

impl ApplicationFilter {
    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        let status_matches = self.status.map_or(true, |s| record.status == s);
        if !status_matches {
            return false;
        }

        let query = match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => return true,
        };

        [
            record.applicant.first_name.as_deref(),
            record.applicant.last_name.as_deref(),
            Some(record.id.as_str()),
            record.applicant.email.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Per-status counters shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl ApplicationStats {
    pub fn from_records(records: &[ApplicationRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            match record.status {
                ApplicationStatus::Pending => stats.pending += 1,
                ApplicationStatus::Approved => stats.approved += 1,
                ApplicationStatus::Rejected => stats.rejected += 1,
            }
            stats
        })
    }
}

// ============ API Request/Response Models ============

/// Request payload for formatting a single field value.
#[derive(Debug, Deserialize)]
pub struct FormatRequest {
    /// One of `phone`, `ssn`, `currency`.
    pub kind: String,
    pub value: String,
}

/// Request payload for validating a single field value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub kind: String,
    #[serde(default)]
    pub value: String,
    /// Label used in the `required` message.
    pub field_name: Option<String>,
}

/// Result of a single field validation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub error: Option<String>,
}

/// Result of a wizard step validation.
#[derive(Debug, Serialize, Deserialize)]
pub struct StepValidationResponse {
    pub valid: bool,
    pub errors: std::collections::BTreeMap<String, String>,
}

/// Live loan estimate shown on the property & loan step.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanEstimateRequest {
    pub purchase_price: String,
    pub down_payment: String,
    pub loan_term: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanEstimateResponse {
    pub loan_amount: String,
    /// Whole dollars per month at the assumed rate.
    pub monthly_payment: String,
}

/// Response for a newly submitted application.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

/// Admin list response.
#[derive(Debug, Serialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationRecord>,
    /// Counters over all stored applications, not just the filtered ones.
    pub stats: ApplicationStats,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub approved_amount: String,
    pub interest_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub rejection_reason: String,
}
