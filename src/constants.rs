//! Fixed values of the weekly export format

/// Sheet name of the cleaned output table
pub const CLEANED_SHEET_NAME: &str = "CleanedData";

/// Upstream fields that never reach the output
pub const UNWANTED_FIELDS: [&str; 8] = [
    "form_id",
    "user_id",
    "proof_of_income",
    "proof_of_income_type",
    "ic_image",
    "status",
    "is_b40",
    "race_other",
];

/// Upstream form categories and the program each one belongs to
pub const PROGRAM_NAMES: [(&str, &str); 3] = [
    ("food", "INSAN"),
    ("agriculture", "INTAN"),
    ("maintenance", "IKHSAN"),
];

/// Age written when the identity number is malformed
pub const IC_ERROR: &str = "IC ERROR";

/// Suffix every geocoded address ends with
pub const ADDRESS_COUNTRY_SUFFIX: &str = ", MALAYSIA";

/// Two-digit birth years at or below this are read as 20xx
pub const IC_CENTURY_PIVOT: i32 = 20;

/// Country code for numbers already starting with the mobile prefix digit
pub const PHONE_COUNTRY_CODE: &str = "+60";

/// Country code plus mobile prefix digit for numbers missing it
pub const PHONE_MOBILE_PREFIX: &str = "+601";

// Columns of the reference postcode table
pub const REFERENCE_POSTCODE_COLUMN: &str = "postcode";
pub const REFERENCE_CITY_COLUMN: &str = "city";
pub const REFERENCE_STATE_COLUMN: &str = "state";
