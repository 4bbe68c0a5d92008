//! Scrubs credentials and phone numbers before they reach log files.
//!
//! Label text can carry a manufacturer's customer-service number, and
//! provider errors can echo request headers.

use std::sync::LazyLock;

use regex::Regex;

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{2,4}\)?[-.\s]\d{3,4}[-.\s]\d{4}\b").unwrap()
});

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(Bearer\s+[A-Za-z0-9\-._~+/]+=*)|(sk-[A-Za-z0-9]{32,})").unwrap()
});

static API_KEY_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(X-NCP-APIGW-API-KEY(?:-ID)?|client[_-]?(?:id|secret))(["']?\s*[:=]\s*["']?)[^\s"',}]+"#)
        .unwrap()
});

pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_HEADER_RE.replace_all(input, "${1}${2}[REDACTED_KEY]");
    let redacted = TOKEN_RE.replace_all(&redacted, "[REDACTED_TOKEN]");
    PHONE_RE.replace_all(&redacted, "[REDACTED_PHONE]").into_owned()
}
