use serde_json::Value;

use crate::constants::{IC_CENTURY_PIVOT, IC_ERROR, PHONE_COUNTRY_CODE, PHONE_MOBILE_PREFIX};
use crate::domain::schema::{fields_with_rule, FieldRule};
use crate::domain::{field_text, CanonicalField, Record};

const DATE_PREFIX_LEN: usize = 10;
const IC_LEN: usize = 12;

/// Order the formatting rules run in
const RULE_ORDER: [FieldRule; 5] = [
    FieldRule::TruncateDate,
    FieldRule::Uppercase,
    FieldRule::PhonePrefix,
    FieldRule::TwoDecimalSalary,
    FieldRule::AgeFromIc,
];

/// Keep only the `YYYY-MM-DD` prefix of `field`.
pub fn truncate_date(record: &mut Record, field: &str) {
    if let Some(text) = field_text(record, field) {
        let truncated: String = text.chars().take(DATE_PREFIX_LEN).collect();
        record.insert(field.to_string(), Value::String(truncated));
    }
}

/// Uppercase `field` when it holds text
pub fn upper_case(record: &mut Record, field: &str) {
    if let Some(Value::String(text)) = record.get_mut(field) {
        *text = text.to_uppercase();
    }
}

/// Prefix a phone number with the country code.
///
/// Numbers already starting with the mobile digit `1` get `+60`, everything else gets
/// `+601`. The number is not otherwise validated, so an empty value becomes `+601`.
pub fn format_phone(record: &mut Record, field: &str) {
    if let Some(text) = field_text(record, field) {
        let number = text.trim();
        let prefix = if number.starts_with('1') {
            PHONE_COUNTRY_CODE
        } else {
            PHONE_MOBILE_PREFIX
        };
        record.insert(field.to_string(), Value::String(format!("{prefix}{number}")));
    }
}

/// Rewrite a plain decimal amount with exactly two fraction digits.
/// Values with signs, separators or letters are left untouched.
pub fn format_salary(record: &mut Record, field: &str) {
    let Some(text) = field_text(record, field) else {
        return;
    };
    if !is_plain_decimal(&text) {
        return;
    }
    if let Ok(amount) = text.parse::<f64>() {
        record.insert(field.to_string(), Value::String(format!("{amount:.2}")));
    }
}

/// Digits with at most one decimal point
fn is_plain_decimal(text: &str) -> bool {
    let digits = text.replacen('.', "", 1);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Write into `field` the age derived from the birth year encoded in `ic`.
/// `ic` itself is never touched.
pub fn derive_age(record: &mut Record, field: &str, reference_year: i32) {
    let Some(ic) = field_text(record, CanonicalField::Ic.name()) else {
        return;
    };
    let age = match age_from_ic(&ic, reference_year) {
        Some(age) => Value::from(age),
        None => Value::String(IC_ERROR.to_string()),
    };
    record.insert(field.to_string(), age);
}

/// Age in `reference_year`, or `None` when `ic` is not exactly 12 digits or the
/// difference does not fit an `i32`
pub fn age_from_ic(ic: &str, reference_year: i32) -> Option<i32> {
    if ic.chars().count() != IC_LEN || !ic.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let two_digit_year: i32 = ic.get(..2)?.parse().ok()?;
    reference_year.checked_sub(birth_year(two_digit_year))
}

fn birth_year(two_digit_year: i32) -> i32 {
    if two_digit_year <= IC_CENTURY_PIVOT {
        2000 + two_digit_year
    } else {
        1900 + two_digit_year
    }
}

/// Applies the schema's per-field formatting rules in pipeline order
#[derive(Debug, Clone)]
pub struct FieldFormatter {
    pub reference_year: i32,
    /// `(rule, field)` pairs read from the canonical schema, in application order
    pub steps: Vec<(FieldRule, &'static str)>,
}

impl FieldFormatter {
    pub fn new(reference_year: i32) -> Self {
        let steps = RULE_ORDER
            .into_iter()
            .flat_map(|rule| fields_with_rule(rule).into_iter().map(move |field| (rule, field)))
            .collect();
        Self {
            reference_year,
            steps,
        }
    }

    pub fn format_record(&self, record: &mut Record) {
        for &(rule, field) in &self.steps {
            self.apply(rule, field, record);
        }
    }

    pub fn format_batch(&self, records: &mut [Record]) {
        for record in records.iter_mut() {
            self.format_record(record);
        }
    }

    fn apply(&self, rule: FieldRule, field: &str, record: &mut Record) {
        match rule {
            FieldRule::TruncateDate => truncate_date(record, field),
            FieldRule::Uppercase => upper_case(record, field),
            FieldRule::PhonePrefix => format_phone(record, field),
            FieldRule::TwoDecimalSalary => format_salary(record, field),
            FieldRule::AgeFromIc => derive_age(record, field, self.reference_year),
            // Review flags are attached after the join
            FieldRule::DefaultEmpty => {}
        }
    }
}
