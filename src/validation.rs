/// Field formatting and validation for the intake wizard.
///
/// Formatters turn whatever the applicant typed into the display form shown
/// back in the input (`(555) 123-4567`, `123-45-6789`, `350,000`). Validators
/// return `None` for an acceptable value or `Some(message)` with the text to
/// show under the field. Empty input is always acceptable except for the
/// `Required` rule: required-ness is checked separately, per wizard step.
use crate::models::ApplicationDraft;
use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?([0-9]{3})\)?[-. ]?([0-9]{3})[-. ]?([0-9]{4})$").expect("phone pattern")
});
static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-?\d{2}-?\d{4}$").expect("ssn pattern"));
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("zip pattern"));
static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d*|\.\d+)").expect("number pattern"));

const MIN_ANNUAL_INCOME: f64 = 1_000.0;
const MAX_ANNUAL_INCOME: f64 = 10_000_000.0;
const MAX_MONTHLY_AMOUNT: f64 = 50_000.0;
const MIN_APPLICANT_AGE: i32 = 18;
const MAX_APPLICANT_AGE: i32 = 120;

// ============ Formatters ============

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Formats a US phone number progressively as digits are typed.
///
/// `555` → `(555) `, `555123` → `(555) 123-`, `5551234567` → `(555) 123-4567`.
/// Digits past the tenth are dropped.
pub fn format_phone(raw: &str) -> String {
    let digits = digits_only(raw);
    let len = digits.len();
    if len >= 6 {
        format!(
            "({}) {}-{}",
            &digits[..3],
            &digits[3..6],
            &digits[6..len.min(10)]
        )
    } else if len >= 3 {
        format!("({}) {}", &digits[..3], &digits[3..])
    } else {
        digits
    }
}

/// Formats a social security number progressively, `DDD-DD-DDDD`.
pub fn format_ssn(raw: &str) -> String {
    let digits = digits_only(raw);
    let len = digits.len();
    if len >= 5 {
        format!("{}-{}-{}", &digits[..3], &digits[3..5], &digits[5..len.min(9)])
    } else if len >= 3 {
        format!("{}-{}", &digits[..3], &digits[3..])
    } else {
        digits
    }
}

/// Renders the digits of `raw` as a comma-grouped whole number.
///
/// Any non-digit is discarded, including a decimal point, so cents are not
/// representable. Works on arbitrarily long input without overflowing.
pub fn format_currency(raw: &str) -> String {
    let digits = digits_only(raw);
    if digits.is_empty() {
        return String::new();
    }

    let significant = digits.trim_start_matches('0');
    let significant = if significant.is_empty() { "0" } else { significant };

    let mut grouped = String::with_capacity(significant.len() + significant.len() / 3);
    for (i, ch) in significant.chars().enumerate() {
        if i > 0 && (significant.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Parses a money-like string the way the wizard reads its own fields.
///
/// Everything except digits and `.` is stripped, then the leading number is
/// read (`"1.2.3"` reads as `1.2`). Returns `None` when no number is present.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    LEADING_NUMBER_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

// ============ Field Rules ============

/// Validation rule applied to a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Email,
    Phone,
    Ssn,
    ZipCode,
    AnnualIncome,
    /// Any monthly dollar amount (payments, debt, down payment).
    MonthlyPayment,
    Required,
    DateOfBirth,
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(FieldKind::Email),
            "phone" => Ok(FieldKind::Phone),
            "ssn" => Ok(FieldKind::Ssn),
            "zipCode" => Ok(FieldKind::ZipCode),
            "annualIncome" => Ok(FieldKind::AnnualIncome),
            "monthlyPayment" => Ok(FieldKind::MonthlyPayment),
            "required" => Ok(FieldKind::Required),
            "dateOfBirth" => Ok(FieldKind::DateOfBirth),
            other => Err(format!("Unknown field kind: {}", other)),
        }
    }
}

/// Validates `value` against `kind` using today's UTC date for age checks.
pub fn validate(kind: FieldKind, value: &str) -> Option<String> {
    validate_on(kind, value, Utc::now().date_naive())
}

/// Same as [`validate`] with an explicit reference date.
pub fn validate_on(kind: FieldKind, value: &str, today: NaiveDate) -> Option<String> {
    if kind == FieldKind::Required {
        return required(value, "This field");
    }
    if value.is_empty() {
        return None;
    }

    let verdict = match kind {
        FieldKind::Email => (!EMAIL_RE.is_match(value))
            .then(|| "Please enter a valid email address".to_string()),
        FieldKind::Phone => (!PHONE_RE.is_match(&digits_only(value)))
            .then(|| "Please enter a valid phone number".to_string()),
        FieldKind::Ssn => (!SSN_RE.is_match(value))
            .then(|| "Please enter a valid SSN (XXX-XX-XXXX)".to_string()),
        FieldKind::ZipCode => {
            (!ZIP_RE.is_match(value)).then(|| "Please enter a valid ZIP code".to_string())
        }
        FieldKind::AnnualIncome => match parse_amount(value) {
            None => Some("Please enter a valid income amount".to_string()),
            Some(income) if income < MIN_ANNUAL_INCOME => {
                Some("Annual income must be at least $1,000".to_string())
            }
            Some(income) if income > MAX_ANNUAL_INCOME => {
                Some("Please enter a realistic income amount".to_string())
            }
            Some(_) => None,
        },
        FieldKind::MonthlyPayment => match parse_amount(value) {
            None => Some("Please enter a valid amount".to_string()),
            Some(amount) if amount < 0.0 => Some("Amount cannot be negative".to_string()),
            Some(amount) if amount > MAX_MONTHLY_AMOUNT => {
                Some("Please enter a realistic amount".to_string())
            }
            Some(_) => None,
        },
        FieldKind::DateOfBirth => validate_date_of_birth(value, today),
        FieldKind::Required => unreachable!("handled above"),
    };

    if let Some(ref message) = verdict {
        tracing::debug!("Field {:?} rejected: {}", kind, message);
    }
    verdict
}

/// `"<field_name> is required"` when `value` is blank.
pub fn required(value: &str, field_name: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(format!("{} is required", field_name))
    } else {
        None
    }
}

fn validate_date_of_birth(value: &str, today: NaiveDate) -> Option<String> {
    let Ok(birth_date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") else {
        return Some("Please enter a valid date of birth".to_string());
    };

    let age = age_on(birth_date, today);
    if age < MIN_APPLICANT_AGE {
        Some("You must be at least 18 years old".to_string())
    } else if age > MAX_APPLICANT_AGE {
        Some("Please enter a valid date of birth".to_string())
    } else {
        None
    }
}

/// Completed years between `birth_date` and `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

// ============ Wizard Steps ============

/// Steps of the intake wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    PersonalInfo,
    PropertyLoan,
    FinancialInfo,
    Employment,
    Documents,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::PersonalInfo,
        WizardStep::PropertyLoan,
        WizardStep::FinancialInfo,
        WizardStep::Employment,
        WizardStep::Documents,
        WizardStep::Review,
    ];

    /// 1-based step number as shown in the stepper.
    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            WizardStep::PersonalInfo => "Personal Info",
            WizardStep::PropertyLoan => "Property & Loan",
            WizardStep::FinancialInfo => "Financial Info",
            WizardStep::Employment => "Employment",
            WizardStep::Documents => "Documents",
            WizardStep::Review => "Review",
        }
    }

    /// Required fields for the step: JSON field name, display label, value.
    fn required_fields(self, draft: &ApplicationDraft) -> Vec<(&'static str, &'static str, Option<&str>)> {
        match self {
            WizardStep::PersonalInfo => vec![
                ("firstName", "First name", draft.first_name.as_deref()),
                ("lastName", "Last name", draft.last_name.as_deref()),
                ("email", "Email", draft.email.as_deref()),
                ("phone", "Phone number", draft.phone.as_deref()),
                ("address", "Address", draft.address.as_deref()),
                ("city", "City", draft.city.as_deref()),
                ("state", "State", draft.state.as_deref()),
                ("zipCode", "ZIP code", draft.zip_code.as_deref()),
                ("dateOfBirth", "Date of birth", draft.date_of_birth.as_deref()),
                ("ssn", "SSN", draft.ssn.as_deref()),
            ],
            WizardStep::PropertyLoan => vec![
                ("propertyAddress", "Property address", draft.property_address.as_deref()),
                ("propertyCity", "Property city", draft.property_city.as_deref()),
                ("propertyState", "Property state", draft.property_state.as_deref()),
                ("propertyZipCode", "Property ZIP code", draft.property_zip_code.as_deref()),
                ("propertyType", "Property type", draft.property_type.as_deref()),
                ("occupancy", "Occupancy", draft.occupancy.as_deref()),
                ("loanPurpose", "Loan purpose", draft.loan_purpose.as_deref()),
                ("purchasePrice", "Purchase price", draft.purchase_price.as_deref()),
                ("downPayment", "Down payment", draft.down_payment.as_deref()),
            ],
            WizardStep::FinancialInfo => vec![
                ("annualIncome", "Annual income", draft.annual_income.as_deref()),
                ("incomeSource", "Income source", draft.income_source.as_deref()),
            ],
            WizardStep::Employment => vec![(
                "employmentStatus",
                "Employment status",
                draft.employment_status.as_deref(),
            )],
            // Uploads are optional and the review step only confirms.
            WizardStep::Documents | WizardStep::Review => Vec::new(),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Missing required fields of one step, keyed by JSON field name.
pub fn validate_step(step: WizardStep, draft: &ApplicationDraft) -> BTreeMap<String, String> {
    step.required_fields(draft)
        .into_iter()
        .filter_map(|(field, label, value)| {
            required(value.unwrap_or(""), label).map(|message| (field.to_string(), message))
        })
        .collect()
}

/// Missing required fields across every step; empty when the draft may be submitted.
pub fn validate_submission(draft: &ApplicationDraft) -> BTreeMap<String, String> {
    WizardStep::ALL
        .iter()
        .flat_map(|step| validate_step(*step, draft))
        .collect()
}
