/// Test data builders
use chrono::NaiveDate;
use reportflow_core::models::{BatchItem, ReportPayload};

pub fn report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
}

pub fn batch_item(transfer_id: &str, mail_to: &str) -> BatchItem {
    BatchItem::new(
        transfer_id,
        format!("R-{}", transfer_id),
        report_date(),
        report_date(),
    )
    .with_mail_to(mail_to)
    .with_account(format!("Account {}", transfer_id), "12", "3,400.00")
}

pub fn payload(to: &[&str], bcc: &[&str]) -> ReportPayload {
    ReportPayload {
        from_header: "Payments <no-reply@example.com>".to_string(),
        subject: "รายงานโอนเงินกลับประจำวัน".to_string(),
        body_html: "<p>report</p>\n.<p>dot line</p>".to_string(),
        to: to.iter().map(|s| s.to_string()).collect(),
        bcc: bcc.iter().map(|s| s.to_string()).collect(),
        transfer_id: "TR-1".to_string(),
        short_link: "https://s.io/abc".to_string(),
        full_link: "https://files.example.com/pdf/tok".to_string(),
    }
}
