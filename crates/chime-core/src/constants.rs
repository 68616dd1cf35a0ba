/// Identifier constants stamped into exported calendar documents
pub const PRODUCT_NAME: &str = "chime";

pub const ICAL_PROD_ID: &str =
    const_str::concat!("-//", PRODUCT_NAME, "//recurrence engine//EN");

/// Suffix appended to a schedule id to form the exported event UID.
pub const ICAL_UID_SUFFIX: &str = const_str::concat!("@", PRODUCT_NAME);
