//! The canonical output schema as an ordered list of typed field descriptors.
//!
//! Every table the pipeline produces is laid out in [`CANONICAL_SCHEMA`] order. The
//! rename table, the formatter's per-field rules and the default flag columns are all
//! read from the descriptors here, so adding or moving a column is a one-line change.

/// A column of the canonical output table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Program,
    Date,
    Ic,
    Name,
    Age,
    Ethnicity,
    Sex,
    State,
    District,
    Postcode,
    Lat,
    Lon,
    Address,
    Phone,
    Email,
    SalaryMonthly,
    GeocodeStatus,
    Miskin,
    MiskinTegar,
    StrMof,
    BelumDisemak,
}

impl CanonicalField {
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::Program => "program",
            CanonicalField::Date => "date",
            CanonicalField::Ic => "ic",
            CanonicalField::Name => "name",
            CanonicalField::Age => "age",
            CanonicalField::Ethnicity => "ethnicity",
            CanonicalField::Sex => "sex",
            CanonicalField::State => "state",
            CanonicalField::District => "district",
            CanonicalField::Postcode => "postcode",
            CanonicalField::Lat => "lat",
            CanonicalField::Lon => "lon",
            CanonicalField::Address => "address",
            CanonicalField::Phone => "phone",
            CanonicalField::Email => "email",
            CanonicalField::SalaryMonthly => "salary_monthly",
            CanonicalField::GeocodeStatus => "geocode_status",
            CanonicalField::Miskin => "miskin",
            CanonicalField::MiskinTegar => "miskin_tegar",
            CanonicalField::StrMof => "str_mof",
            CanonicalField::BelumDisemak => "belum_disemak",
        }
    }

    pub fn descriptor(self) -> &'static FieldDescriptor {
        // The schema array is declared in enum order.
        &CANONICAL_SCHEMA[self as usize]
    }
}

/// Per-field transformation applied by the formatter stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    TruncateDate,
    Uppercase,
    PhonePrefix,
    TwoDecimalSalary,
    AgeFromIc,
    DefaultEmpty,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub field: CanonicalField,
    /// Field name in the upstream export, when the column is supplied upstream
    pub raw_name: Option<&'static str>,
    pub rule: Option<FieldRule>,
}

const fn descriptor(
    field: CanonicalField,
    raw_name: Option<&'static str>,
    rule: Option<FieldRule>,
) -> FieldDescriptor {
    FieldDescriptor {
        field,
        raw_name,
        rule,
    }
}

pub static CANONICAL_SCHEMA: [FieldDescriptor; 21] = [
    descriptor(CanonicalField::Program, Some("form_category"), None),
    descriptor(CanonicalField::Date, Some("createdAt"), Some(FieldRule::TruncateDate)),
    descriptor(CanonicalField::Ic, Some("ic_number"), None),
    descriptor(CanonicalField::Name, Some("name"), Some(FieldRule::Uppercase)),
    descriptor(CanonicalField::Age, None, Some(FieldRule::AgeFromIc)),
    descriptor(CanonicalField::Ethnicity, Some("race"), None),
    descriptor(CanonicalField::Sex, Some("gender"), None),
    descriptor(CanonicalField::State, Some("state"), None),
    descriptor(CanonicalField::District, None, None),
    descriptor(CanonicalField::Postcode, Some("postcode"), None),
    descriptor(CanonicalField::Lat, None, None),
    descriptor(CanonicalField::Lon, None, None),
    descriptor(CanonicalField::Address, Some("address"), Some(FieldRule::Uppercase)),
    descriptor(CanonicalField::Phone, Some("mobile_number"), Some(FieldRule::PhonePrefix)),
    descriptor(CanonicalField::Email, Some("email"), None),
    descriptor(
        CanonicalField::SalaryMonthly,
        Some("monthly_income"),
        Some(FieldRule::TwoDecimalSalary),
    ),
    descriptor(CanonicalField::GeocodeStatus, None, None),
    descriptor(CanonicalField::Miskin, None, Some(FieldRule::DefaultEmpty)),
    descriptor(CanonicalField::MiskinTegar, None, Some(FieldRule::DefaultEmpty)),
    descriptor(CanonicalField::StrMof, None, Some(FieldRule::DefaultEmpty)),
    descriptor(CanonicalField::BelumDisemak, None, Some(FieldRule::DefaultEmpty)),
];

/// Canonical column names in output order
pub fn canonical_order() -> Vec<&'static str> {
    CANONICAL_SCHEMA.iter().map(|d| d.field.name()).collect()
}

/// `(raw_name, canonical_name)` pairs for every column supplied upstream
pub fn rename_map() -> Vec<(&'static str, &'static str)> {
    CANONICAL_SCHEMA
        .iter()
        .filter_map(|d| d.raw_name.map(|raw| (raw, d.field.name())))
        .collect()
}

/// Names of the columns carrying the given rule, in schema order
pub fn fields_with_rule(rule: FieldRule) -> Vec<&'static str> {
    CANONICAL_SCHEMA
        .iter()
        .filter(|d| d.rule == Some(rule))
        .map(|d| d.field.name())
        .collect()
}
