/// Application constants
///
/// This module contains all hardcoded values used throughout the application.
/// Constants are organized by category for easy maintenance.
// ============================================================================
// Retry Constants
// ============================================================================
/// Attempts made against the short-link service before giving up
pub const SHORT_LINK_MAX_ATTEMPTS: u32 = 3;

/// Base delay between short-link attempts, scaled by attempt number
pub const SHORT_LINK_BASE_DELAY_MS: u64 = 1000;

/// Attempts made per SMTP send, each on a fresh connection
pub const SMTP_MAX_ATTEMPTS: u32 = 3;

/// Base delay between SMTP attempts, scaled by attempt number
pub const SMTP_BASE_DELAY_MS: u64 = 1000;

// ============================================================================
// Timing Constants
// ============================================================================

/// Default timeout for token and short-link HTTP calls
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Default timeout for dialing and for each SMTP command
pub const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Dispatch Constants
// ============================================================================

/// Default number of batch items processed concurrently
pub const DEFAULT_DISPATCH_CONCURRENCY: usize = 4;

/// Default SMTP submission port
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default listen address for the HTTP surface
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8888";

/// Marker replaced by the escaped token inside the long-link base URL
pub const TOKEN_PLACEHOLDER: &str = "{token}";

// ============================================================================
// Report Content
// ============================================================================

/// Shown in place of the download link when shortening failed
pub const LINK_UNAVAILABLE: &str = "not available";

/// Date format used inside report bodies (day/month/year)
pub const REPORT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Subject of the daily transfer report
pub const TRANSFER_REPORT_SUBJECT: &str = "รายงานโอนเงินกลับประจำวัน";

/// Subject of the daily income report
pub const INCOME_REPORT_SUBJECT: &str = "รายงานการรับเงินประจำวัน";

/// Subject of the failure notification sent after a partially failed batch
pub const FAILURE_NOTICE_SUBJECT: &str = "ส่งรายงานการรับเงินประจำวันไม่สำเร็จ";

/// Support address printed in report footers
pub const SUPPORT_EMAIL: &str = "online-support@inet.co.th";

/// Hostname announced in EHLO when none is configured
pub const DEFAULT_EHLO_NAME: &str = "localhost";

// ============================================================================
// Logging
// ============================================================================

/// Default `RUST_LOG` directive
pub const DEFAULT_LOG_FILTER: &str = "info,reportflow=debug";
