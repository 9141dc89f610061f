/// Fixed HTML templates, one per notification kind
use crate::constants::{REPORT_DATE_FORMAT, SUPPORT_EMAIL};
use crate::error::ReportflowError;
use crate::models::{AccountFields, ReportKind};
use chrono::NaiveDate;
use tera::{Context, Tera};

const REPORT: &str = "report.html";
const FAILURE_NOTICE: &str = "failure_notice.html";

/// Renders the embedded templates. The `.html` names keep tera's
/// autoescaping on for every interpolated field.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, ReportflowError> {
        let mut engine = Tera::default();
        engine.add_raw_templates(vec![
            (REPORT, include_str!("../../templates/report.html")),
            (
                FAILURE_NOTICE,
                include_str!("../../templates/failure_notice.html"),
            ),
        ])?;

        Ok(Self { engine })
    }

    /// Renders the report body for `kind`
    pub fn render_report(
        &self,
        kind: ReportKind,
        account: &AccountFields,
        link: &str,
        report_date: NaiveDate,
    ) -> Result<String, ReportflowError> {
        let title = match kind {
            ReportKind::Transfer => "รายงานการโอนเงิน",
            ReportKind::Income => "รายงานการรับเงิน",
        };
        let period = match (account.period_start, account.period_end) {
            (Some(start), Some(end)) => Some(format!(
                "{} - {}",
                start.format(REPORT_DATE_FORMAT),
                end.format(REPORT_DATE_FORMAT)
            )),
            _ => None,
        };

        let mut context = Context::new();
        context.insert("title", title);
        context.insert("account_name", &account.account_name);
        context.insert("report_date", &report_date.format(REPORT_DATE_FORMAT).to_string());
        context.insert("period", &period);
        context.insert("txn_count", &account.txn_count);
        context.insert("txn_amount", &account.txn_amount);
        context.insert("link", link);
        context.insert("support_email", SUPPORT_EMAIL);

        Ok(self.engine.render(REPORT, &context)?)
    }

    /// Renders the notice listing accounts whose report could not be delivered
    pub fn render_failure_notice(
        &self,
        account_names: &[String],
        report_date: NaiveDate,
    ) -> Result<String, ReportflowError> {
        let mut context = Context::new();
        context.insert("account_names", account_names);
        context.insert("report_date", &report_date.format(REPORT_DATE_FORMAT).to_string());

        Ok(self.engine.render(FAILURE_NOTICE, &context)?)
    }
}
