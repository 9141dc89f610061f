/// API endpoint modules
pub mod health;
pub mod reports;

/// `responseCode` of a processed batch
pub const RESPONSE_CODE_OK: &str = "00";
/// `responseCode` of a rejected request
pub const RESPONSE_CODE_ERROR: &str = "99";
