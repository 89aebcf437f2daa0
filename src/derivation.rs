/// Derived figures attached to an application.
///
/// Credit score and DTI are computed once when an application is saved and
/// stored on the record; the loan amount and monthly payment feed the live
/// estimate on the property & loan step.
use crate::models::ApplicationDraft;
use crate::validation::{format_currency, parse_amount};

/// Nominal APR assumed for every payment estimate.
pub const ASSUMED_ANNUAL_RATE: f64 = 0.065;
/// Loan term used when the draft has none (or an unreadable one).
pub const DEFAULT_TERM_YEARS: u32 = 30;
/// Longest term an estimate is computed over; longer terms are clamped.
pub const MAX_TERM_YEARS: u32 = 50;

const BASE_CREDIT_SCORE: i32 = 700;
const MIN_CREDIT_SCORE: i32 = 300;
const MAX_CREDIT_SCORE: i32 = 850;

/// Reads an optional money field: absent or empty counts as zero, text with
/// no number in it is `None`.
fn amount_field(value: Option<&str>) -> Option<f64> {
    match value {
        None => Some(0.0),
        Some(v) if v.is_empty() => Some(0.0),
        Some(v) => parse_amount(v),
    }
}

fn parse_term(loan_term: Option<&str>) -> u32 {
    loan_term
        .and_then(|t| t.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_TERM_YEARS)
        .min(MAX_TERM_YEARS)
}

fn term_years(draft: &ApplicationDraft) -> u32 {
    parse_term(draft.loan_term.as_deref())
}

/// Heuristic credit score estimate in `[300, 850]`.
///
/// Income and liquid-asset bands are each mutually exclusive and checked from
/// the highest band down. Unreadable amounts leave the score unadjusted.
pub fn estimate_credit_score(draft: &ApplicationDraft) -> u16 {
    let mut score = BASE_CREDIT_SCORE;

    if let Some(income) = amount_field(draft.annual_income.as_deref()) {
        if income > 100_000.0 {
            score += 50;
        } else if income > 75_000.0 {
            score += 30;
        } else if income < 40_000.0 {
            score -= 50;
        }
    }

    if draft.bankruptcy_history {
        score -= 100;
    }
    if draft.foreclosure_history {
        score -= 80;
    }

    if let Some(assets) = amount_field(draft.liquid_assets.as_deref()) {
        if assets > 100_000.0 {
            score += 30;
        } else if assets > 50_000.0 {
            score += 15;
        }
    }

    score.clamp(MIN_CREDIT_SCORE, MAX_CREDIT_SCORE) as u16
}

/// Debt-to-income ratio as `"<n>%"`, or `"N/A"` without a usable income.
///
/// Monthly debt is the applicant's existing debt payments plus the estimated
/// payment on the requested loan. The current housing payment is not added:
/// the new mortgage replaces it.
pub fn calculate_dti(draft: &ApplicationDraft) -> String {
    let monthly_income = amount_field(draft.annual_income.as_deref()).unwrap_or(0.0) / 12.0;
    if monthly_income <= 0.0 {
        return "N/A".to_string();
    }

    let monthly_debt = amount_field(draft.existing_debt.as_deref()).unwrap_or(0.0);
    let loan_amount = amount_field(draft.loan_amount.as_deref()).unwrap_or(0.0);
    let estimated_mortgage =
        estimate_monthly_payment(loan_amount, term_years(draft), ASSUMED_ANNUAL_RATE);

    let dti = (monthly_debt + estimated_mortgage) / monthly_income * 100.0;
    format!("{}%", dti.round() as i64)
}

/// Loan amount implied by the purchase price and down payment, formatted as
/// currency. Empty until a positive purchase price is entered; a down payment
/// larger than the price yields `"0"`.
pub fn calculate_loan_amount(purchase_price: &str, down_payment: &str) -> String {
    let purchase = amount_field(Some(purchase_price)).unwrap_or(0.0);
    if purchase <= 0.0 {
        return String::new();
    }
    let down = amount_field(Some(down_payment)).unwrap_or(0.0);

    let mut loan = (purchase - down).floor();
    if loan < 0.0 {
        tracing::warn!(
            "Down payment {} exceeds purchase price {}; loan amount clamped to 0",
            down,
            purchase
        );
        loan = 0.0;
    }
    format_currency(&format!("{:.0}", loan))
}

/// Fixed-rate amortized monthly payment: `P·r(1+r)^n / ((1+r)^n − 1)`.
///
/// `annual_rate` is a fraction (`0.065`). Returns 0 for a non-positive
/// principal or a zero term; a zero rate divides the principal evenly.
/// Terms beyond [`MAX_TERM_YEARS`] are clamped.
pub fn estimate_monthly_payment(principal: f64, term_years: u32, annual_rate: f64) -> f64 {
    let payments = f64::from(term_years.min(MAX_TERM_YEARS)) * 12.0;
    if principal <= 0.0 || payments == 0.0 {
        return 0.0;
    }

    let monthly_rate = annual_rate / 12.0;
    if monthly_rate == 0.0 {
        return principal / payments;
    }

    let growth = (1.0 + monthly_rate).powf(payments);
    principal * (monthly_rate * growth) / (growth - 1.0)
}

/// Live estimate for the loan step: the monthly payment on `loan_amount`
/// (currency string) over `loan_term` years, whole dollars, comma-grouped.
pub fn monthly_payment_display(loan_amount: &str, loan_term: Option<&str>) -> String {
    let principal = amount_field(Some(loan_amount)).unwrap_or(0.0);
    let monthly = estimate_monthly_payment(principal, parse_term(loan_term), ASSUMED_ANNUAL_RATE);
    format_currency(&format!("{:.0}", monthly.round()))
}
