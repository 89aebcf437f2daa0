use crate::autosave::DraftStore;
use crate::derivation::{calculate_loan_amount, monthly_payment_display};
use crate::errors::AppError;
use crate::models::*;
use crate::repository::ApplicationRepository;
use crate::validation::{
    format_currency, format_phone, format_ssn, required, validate, validate_step,
    validate_submission, FieldKind, WizardStep,
};
use crate::workflow::Decision;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Shared application state injected into handlers.
pub struct AppState {
    /// Submitted applications.
    pub applications: ApplicationRepository,
    /// Autosaved wizard draft.
    pub drafts: DraftStore,
}

/// Builds the full HTTP router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // Field helpers used on every keystroke
        .route("/api/v1/fields/format", post(format_field))
        .route("/api/v1/fields/validate", post(validate_field))
        .route("/api/v1/steps/:step/validate", post(validate_wizard_step))
        .route("/api/v1/loan/estimate", post(estimate_loan))
        // Autosave
        .route(
            "/api/v1/draft",
            get(get_draft).put(save_draft).delete(clear_draft),
        )
        // Intake and admin review
        .route(
            "/api/v1/applications",
            post(submit_application)
                .get(list_applications)
                .delete(clear_applications),
        )
        .route("/api/v1/applications/:id", get(get_application))
        .route(
            "/api/v1/applications/:id/approve",
            post(approve_application),
        )
        .route("/api/v1/applications/:id/reject", post(reject_application))
        // Request size limit: 1MB is far above any application payload
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(1024 * 1024)));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "mortgage-intake",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/fields/format
///
/// Returns the display form of a phone, SSN or currency input.
pub async fn format_field(
    Json(payload): Json<FormatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let value = match payload.kind.as_str() {
        "phone" => format_phone(&payload.value),
        "ssn" => format_ssn(&payload.value),
        "currency" => format_currency(&payload.value),
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown format kind: {} (expected phone, ssn or currency)",
                other
            )))
        }
    };
    Ok(Json(json!({ "value": value })))
}

/// POST /api/v1/fields/validate
///
/// Runs one field rule. A failed rule is still a 200: the verdict is data.
pub async fn validate_field(
    Json(payload): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, AppError> {
    let kind: FieldKind = payload.kind.parse().map_err(AppError::BadRequest)?;

    let error = match (kind, payload.field_name.as_deref()) {
        (FieldKind::Required, Some(name)) => required(&payload.value, name),
        _ => validate(kind, &payload.value),
    };

    Ok(Json(ValidateResponse {
        valid: error.is_none(),
        error,
    }))
}

/// POST /api/v1/steps/:step/validate
///
/// Checks the required fields of wizard step `step` (1-6).
pub async fn validate_wizard_step(
    Path(step): Path<u8>,
    Json(draft): Json<ApplicationDraft>,
) -> Result<Json<StepValidationResponse>, AppError> {
    let step = WizardStep::from_number(step)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown wizard step: {}", step)))?;

    let errors = validate_step(step, &draft);
    tracing::debug!("Step '{}' validated with {} error(s)", step, errors.len());

    Ok(Json(StepValidationResponse {
        valid: errors.is_empty(),
        errors,
    }))
}

/// POST /api/v1/loan/estimate
///
/// Loan amount from price and down payment, and its estimated monthly payment.
pub async fn estimate_loan(
    Json(payload): Json<LoanEstimateRequest>,
) -> Json<LoanEstimateResponse> {
    let loan_amount = calculate_loan_amount(&payload.purchase_price, &payload.down_payment);
    let monthly_payment = monthly_payment_display(&loan_amount, payload.loan_term.as_deref());
    Json(LoanEstimateResponse {
        loan_amount,
        monthly_payment,
    })
}

/// Runs a storage operation on the blocking pool; the stores do file I/O.
async fn blocking<T, F>(state: &Arc<AppState>, op: F) -> Result<T, AppError>
where
    F: FnOnce(&AppState) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || op(state.as_ref()))
        .await
        .map_err(|e| AppError::InternalError(format!("storage task failed: {}", e)))?
}

/// GET /api/v1/draft
pub async fn get_draft(State(state): State<Arc<AppState>>) -> Result<Json<SavedDraft>, AppError> {
    blocking(&state, |state| {
        state
            .drafts
            .load_saved()
            .ok_or_else(|| AppError::NotFound("No saved draft".to_string()))
    })
    .await
    .map(Json)
}

/// PUT /api/v1/draft
pub async fn save_draft(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ApplicationDraft>,
) -> Result<Json<SavedDraft>, AppError> {
    let saved = blocking(&state, move |state| state.drafts.save_draft(&draft)).await?;
    Ok(Json(saved))
}

/// DELETE /api/v1/draft
pub async fn clear_draft(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    blocking(&state, |state| state.drafts.clear_draft()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/applications
///
/// Submits a completed draft. Every wizard step must pass; on success the
/// autosaved draft is discarded.
pub async fn submit_application(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ApplicationDraft>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let errors = validate_submission(&draft);
    if !errors.is_empty() {
        tracing::info!("Submission rejected: {} missing field(s)", errors.len());
        return Err(AppError::ValidationFailed(errors));
    }

    let id = blocking(&state, move |state| {
        let id = state.applications.save(draft)?;
        if let Err(e) = state.drafts.clear_draft() {
            tracing::warn!("Application {} saved but draft not cleared: {}", id, e);
        }
        Ok(id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(SubmitResponse { id })))
}

/// Query parameters for the admin list.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `all` (default), `pending`, `approved` or `rejected`.
    pub status: Option<String>,
    pub q: Option<String>,
}

/// GET /api/v1/applications
///
/// Filtered list plus counters over all applications.
pub async fn list_applications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(s) => Some(s.parse::<ApplicationStatus>().map_err(AppError::BadRequest)?),
    };
    let filter = ApplicationFilter {
        status,
        query: params.q,
    };

    let response = blocking(&state, move |state| {
        Ok(ApplicationListResponse {
            applications: state.applications.search(&filter),
            stats: state.applications.stats(),
        })
    })
    .await?;
    Ok(Json(response))
}

/// GET /api/v1/applications/:id
pub async fn get_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationRecord>, AppError> {
    blocking(&state, move |state| {
        state
            .applications
            .find(&id)
            .ok_or_else(|| AppError::NotFound(format!("Application {} not found", id)))
    })
    .await
    .map(Json)
}

/// POST /api/v1/applications/:id/approve
pub async fn approve_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ApproveRequest>,
) -> Result<Json<ApplicationRecord>, AppError> {
    let decision = Decision::Approve {
        amount: payload.approved_amount,
        interest_rate: payload.interest_rate,
    };
    decide(&state, id, decision).await
}

/// POST /api/v1/applications/:id/reject
pub async fn reject_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<RejectRequest>,
) -> Result<Json<ApplicationRecord>, AppError> {
    let decision = Decision::Reject {
        reason: payload.rejection_reason,
    };
    decide(&state, id, decision).await
}

async fn decide(
    state: &Arc<AppState>,
    id: String,
    decision: Decision,
) -> Result<Json<ApplicationRecord>, AppError> {
    tracing::info!("Review decision for {}: {}", id, decision.target_status());

    blocking(state, move |state| {
        match state.applications.update_status(&id, decision)? {
            StatusUpdate::Applied => state
                .applications
                .find(&id)
                .ok_or_else(|| AppError::InternalError(format!("Application {} vanished", id))),
            StatusUpdate::NotFound => Err(AppError::NotFound(format!(
                "Application {} not found",
                id
            ))),
        }
    })
    .await
    .map(Json)
}

/// DELETE /api/v1/applications
pub async fn clear_applications(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    blocking(&state, |state| state.applications.clear_all()).await?;
    Ok(StatusCode::NO_CONTENT)
}
