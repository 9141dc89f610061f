/// Composed report ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPayload {
    /// Display form of the sender, e.g. `Payments <no-reply@example.com>`
    pub from_header: String,
    pub subject: String,
    pub body_html: String,
    /// Primary recipients; the only ones shown in the `To:` header
    pub to: Vec<String>,
    /// Blind copies; envelope only
    pub bcc: Vec<String>,
    pub transfer_id: String,
    /// Link as rendered in the body (short link or placeholder)
    pub short_link: String,
    pub full_link: String,
}

impl ReportPayload {
    /// Envelope recipients: To followed by Bcc, duplicates removed
    pub fn envelope_recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = Vec::with_capacity(self.to.len() + self.bcc.len());
        for addr in self.to.iter().chain(self.bcc.iter()) {
            if !recipients
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(addr))
            {
                recipients.push(addr.clone());
            }
        }
        recipients
    }

    /// Value of the `To:` header
    pub fn to_header(&self) -> String {
        self.to.join(",")
    }
}
