/// Report composer - renders fixed templates into deliverable payloads
use crate::constants::{
    FAILURE_NOTICE_SUBJECT, INCOME_REPORT_SUBJECT, LINK_UNAVAILABLE, TRANSFER_REPORT_SUBJECT,
};
use crate::email::templates::TemplateRenderer;
use crate::error::ReportflowError;
use crate::models::{AccountFields, MailConfig, ReportKind, ReportPayload, ResolvedLink};
use crate::utils::validation::parse_address_list;
use chrono::NaiveDate;

/// Builds report payloads. Pure: the same inputs always give the same payload.
#[derive(Debug, Clone)]
pub struct ReportComposer {
    from_header: String,
    bcc: Vec<String>,
    templates: TemplateRenderer,
}

impl ReportComposer {
    pub fn new(mail: &MailConfig) -> Result<Self, ReportflowError> {
        Ok(Self {
            from_header: mail.from_header(),
            bcc: mail.bcc.clone(),
            templates: TemplateRenderer::new()?,
        })
    }

    pub fn subject(kind: ReportKind) -> &'static str {
        match kind {
            ReportKind::Transfer => TRANSFER_REPORT_SUBJECT,
            ReportKind::Income => INCOME_REPORT_SUBJECT,
        }
    }

    /// Composes the report for one item
    ///
    /// `recipients` is a comma-separated list; blanks are dropped. An empty
    /// short link is rendered as the "not available" placeholder.
    pub fn compose(
        &self,
        kind: ReportKind,
        account: &AccountFields,
        link: &ResolvedLink,
        recipients: &str,
        report_date: NaiveDate,
    ) -> Result<ReportPayload, ReportflowError> {
        let shown_link = if link.is_shortened() {
            link.short_url.clone()
        } else {
            LINK_UNAVAILABLE.to_string()
        };

        let body_html = self
            .templates
            .render_report(kind, account, &shown_link, report_date)?;

        Ok(ReportPayload {
            from_header: self.from_header.clone(),
            subject: Self::subject(kind).to_string(),
            body_html,
            to: parse_address_list(recipients),
            bcc: self.bcc.clone(),
            transfer_id: link.transfer_id.clone(),
            short_link: shown_link,
            full_link: link.full_url.clone(),
        })
    }

    /// Composes the notice sent after a batch with failed items
    pub fn compose_failure_notice(
        &self,
        account_names: &[String],
        to: &[String],
        report_date: NaiveDate,
    ) -> Result<ReportPayload, ReportflowError> {
        Ok(ReportPayload {
            from_header: self.from_header.clone(),
            subject: format!(
                "[{}] {}",
                report_date.format("%Y%m%d"),
                FAILURE_NOTICE_SUBJECT
            ),
            body_html: self
                .templates
                .render_failure_notice(account_names, report_date)?,
            to: to.to_vec(),
            bcc: Vec::new(),
            transfer_id: String::new(),
            short_link: String::new(),
            full_link: String::new(),
        })
    }
}
