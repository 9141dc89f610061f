/// Raw RFC 5322 message assembly for the SMTP data phase
use crate::models::ReportPayload;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset};

// Keeps each encoded-word within the 75 character limit of RFC 2047
const ENCODED_WORD_MAX_BYTES: usize = 45;

/// Assembles the message: headers, blank line, HTML body, CRLF line endings.
///
/// Bcc recipients never appear in the headers.
pub fn build_message(
    payload: &ReportPayload,
    return_path: &str,
    date: DateTime<FixedOffset>,
    message_id: &str,
) -> Vec<u8> {
    let mut msg = String::with_capacity(payload.body_html.len() + 512);

    push_header(&mut msg, "Return-Path", &format!("<{}>", return_path));
    push_header(
        &mut msg,
        "From",
        &encode_mailbox(&strip_line_breaks(&payload.from_header)),
    );
    push_header(&mut msg, "To", &strip_line_breaks(&payload.to_header()));
    push_header(
        &mut msg,
        "Subject",
        &encode_header_value(&strip_line_breaks(&payload.subject)),
    );
    push_header(&mut msg, "Date", &date.to_rfc2822());
    push_header(&mut msg, "Message-ID", message_id);
    push_header(&mut msg, "MIME-Version", "1.0");
    push_header(&mut msg, "Content-Type", "text/html; charset=UTF-8");
    msg.push_str("\r\n");
    msg.push_str(&normalize_line_endings(&payload.body_html));

    msg.into_bytes()
}

/// `<unique@domain>` using the sender's domain
pub fn generate_message_id(from_address: &str) -> String {
    let domain = from_address
        .rsplit_once('@')
        .map(|(_, d)| d)
        .filter(|d| !d.is_empty())
        .unwrap_or("localhost");
    format!("<{}@{}>", uuid::Uuid::new_v4().simple(), domain)
}

fn push_header(msg: &mut String, name: &str, value: &str) {
    msg.push_str(name);
    msg.push_str(": ");
    msg.push_str(value);
    msg.push_str("\r\n");
}

fn strip_line_breaks(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Encodes non-ASCII header text as RFC 2047 base64 encoded-words
pub fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in value.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_MAX_BYTES {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }

    // Folded continuation lines
    words.join("\r\n ")
}

fn encoded_word(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
}

/// Encodes the display name of `Name <addr>` when it is not plain ASCII
fn encode_mailbox(mailbox: &str) -> String {
    match mailbox.rsplit_once('<') {
        Some((name, addr)) if !name.trim().is_empty() && !name.is_ascii() => {
            format!("{} <{}", encode_header_value(name.trim()), addr)
        }
        _ => mailbox.to_string(),
    }
}

/// Converts bare `\n` or `\r` line endings to CRLF
pub fn normalize_line_endings(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\r\n");
            }
            '\n' => out.push_str("\r\n"),
            _ => out.push(c),
        }
    }
    out
}
