/// Unit tests for the wizard's field rules and derived figures
/// Covers the formatter, validator and derivation contracts end to end
use chrono::{Months, NaiveDate};
use mortgage_intake::derivation::{calculate_dti, calculate_loan_amount, estimate_credit_score};
use mortgage_intake::models::ApplicationDraft;
use mortgage_intake::validation::{
    format_currency, format_phone, format_ssn, validate, validate_on, validate_submission,
    FieldKind,
};

#[cfg(test)]
mod formatter_tests {
    use super::*;

    #[test]
    fn test_phone_uses_first_ten_digits() {
        assert_eq!(format_phone("5551234567"), "(555) 123-4567");
        assert_eq!(format_phone("555-123-4567-890"), "(555) 123-4567");
        assert_eq!(format_phone("+1 (555) 123 4567"), "(155) 512-3456");
    }

    #[test]
    fn test_ssn_canonical() {
        assert_eq!(format_ssn("123456789"), "123-45-6789");
        assert_eq!(format_ssn("123 45 6789"), "123-45-6789");
    }

    #[test]
    fn test_currency_grouping() {
        assert_eq!(format_currency("1234567"), "1,234,567");
        assert_eq!(format_currency("$1,234,567"), "1,234,567");
        // Cents are not modeled: the separator is dropped with the other non-digits
        assert_eq!(format_currency("12.50"), "1,250");
        assert_eq!(format_currency(""), "");
    }
}

#[cfg(test)]
mod rule_tests {
    use super::*;

    #[test]
    fn test_email_verdicts() {
        assert!(validate(FieldKind::Email, "bad@").is_some());
        assert!(validate(FieldKind::Email, "a@b.com").is_none());
        assert!(validate(FieldKind::Email, "sarah.johnson@email.com").is_none());
        assert!(validate(FieldKind::Email, "no-at-sign.com").is_some());
    }

    #[test]
    fn test_empty_input_is_never_an_error_except_required() {
        for kind in [
            FieldKind::Email,
            FieldKind::Phone,
            FieldKind::Ssn,
            FieldKind::ZipCode,
            FieldKind::AnnualIncome,
            FieldKind::MonthlyPayment,
            FieldKind::DateOfBirth,
        ] {
            assert_eq!(validate(kind, ""), None, "{:?} flagged empty input", kind);
        }
        assert!(validate(FieldKind::Required, "").is_some());
    }

    #[test]
    fn test_date_of_birth_eighteenth_birthday() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let exactly_18 = today.checked_sub_months(Months::new(18 * 12)).unwrap();
        let almost_18 = today.checked_sub_months(Months::new(18 * 12 - 1)).unwrap();

        assert!(validate_on(
            FieldKind::DateOfBirth,
            &exactly_18.format("%Y-%m-%d").to_string(),
            today
        )
        .is_none());
        assert_eq!(
            validate_on(
                FieldKind::DateOfBirth,
                &almost_18.format("%Y-%m-%d").to_string(),
                today
            ),
            Some("You must be at least 18 years old".to_string())
        );
    }

    #[test]
    fn test_date_of_birth_relative_to_now() {
        let today = chrono::Utc::now().date_naive();
        let seventeen_eleven = today.checked_sub_months(Months::new(17 * 12 + 11)).unwrap();
        let eighteen = today.checked_sub_months(Months::new(18 * 12)).unwrap();

        assert!(validate(
            FieldKind::DateOfBirth,
            &seventeen_eleven.format("%Y-%m-%d").to_string()
        )
        .is_some());
        assert!(validate(FieldKind::DateOfBirth, &eighteen.format("%Y-%m-%d").to_string()).is_none());
    }
}

#[cfg(test)]
mod derivation_tests {
    use super::*;

    #[test]
    fn test_credit_score_examples() {
        let mut draft = ApplicationDraft {
            annual_income: Some("150000".to_string()),
            ..Default::default()
        };
        assert_eq!(estimate_credit_score(&draft), 750);

        draft.bankruptcy_history = true;
        assert_eq!(estimate_credit_score(&draft), 650);
    }

    #[test]
    fn test_dti_zero_income() {
        let draft = ApplicationDraft {
            annual_income: Some("0".to_string()),
            existing_debt: Some("500".to_string()),
            loan_amount: Some("250,000".to_string()),
            ..Default::default()
        };
        assert_eq!(calculate_dti(&draft), "N/A");
    }

    #[test]
    fn test_loan_amount_from_wizard_inputs() {
        assert_eq!(calculate_loan_amount("425,000", "85,000"), "340,000");
    }

    #[test]
    fn test_complete_draft_passes_every_step() {
        let draft = ApplicationDraft {
            first_name: Some("Sarah".to_string()),
            last_name: Some("Johnson".to_string()),
            email: Some("sarah.johnson@email.com".to_string()),
            phone: Some("(555) 123-4567".to_string()),
            date_of_birth: Some("1985-03-15".to_string()),
            ssn: Some("123-45-6789".to_string()),
            address: Some("123 Main St".to_string()),
            city: Some("New York".to_string()),
            state: Some("NY".to_string()),
            zip_code: Some("10001".to_string()),
            property_address: Some("456 Oak Ave".to_string()),
            property_city: Some("Brooklyn".to_string()),
            property_state: Some("NY".to_string()),
            property_zip_code: Some("11201".to_string()),
            property_type: Some("single-family".to_string()),
            occupancy: Some("primary".to_string()),
            loan_purpose: Some("purchase".to_string()),
            purchase_price: Some("450,000".to_string()),
            down_payment: Some("90,000".to_string()),
            annual_income: Some("120,000".to_string()),
            income_source: Some("employment".to_string()),
            employment_status: Some("employed".to_string()),
            ..Default::default()
        };
        assert!(validate_submission(&draft).is_empty());
    }
}
