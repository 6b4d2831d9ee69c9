//! Email address grammars
//!
//! Three mutually exclusive address grammars used by the email rule:
//! SMTP (RFC 5321), message format (RFC 5322, adds quoted local parts) and the
//! WHATWG `input[type=email]` pattern.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a whole address
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum length of the local part
pub const MAX_LOCAL_LENGTH: usize = 64;
/// Maximum length of the domain
pub const MAX_DOMAIN_LENGTH: usize = 255;
/// Maximum length of one domain label
pub const MAX_LABEL_LENGTH: usize = 63;

/// Punctuation allowed in an unquoted local part
const LOCAL_ALLOWED_CHARS: &str = "!#$%&'*+-/=?^_`{|}~.";

// ============================================================================
// Pre-compiled Regex Patterns
// ============================================================================

/// WHATWG `input[type=email]` pattern
static HTML_EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

// ============================================================================
// Format Validators
// ============================================================================

/// Validate an address with the HTML5 form pattern
///
/// # Example
/// ```
/// use sval::formats::validate_email_html;
///
/// assert!(validate_email_html("user@localhost"));
/// assert!(!validate_email_html("user@-bad.com"));
/// ```
pub fn validate_email_html(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && HTML_EMAIL_REGEX.is_match(email)
}

/// Validate an address with the SMTP grammar (RFC 5321)
///
/// # Example
/// ```
/// use sval::formats::validate_email_rfc5321;
///
/// assert!(validate_email_rfc5321("user@example.com"));
/// assert!(!validate_email_rfc5321("user@example.c0m"));
/// assert!(!validate_email_rfc5321("user@localhost"));
/// ```
pub fn validate_email_rfc5321(email: &str) -> bool {
    match split_address(email) {
        Some((local, domain)) => {
            !local.contains('"')
                && validate_unquoted_local(local)
                && validate_domain(domain)
                && domain
                    .rsplit('.')
                    .next()
                    .map_or(false, |tld| tld.chars().all(char::is_alphabetic))
        }
        None => false,
    }
}

/// Validate an address with the message-format grammar (RFC 5322)
///
/// # Example
/// ```
/// use sval::formats::validate_email_rfc5322;
///
/// assert!(validate_email_rfc5322("\"John Doe\"@example.com"));
/// assert!(!validate_email_rfc5322("\"test\"test\"@example.com"));
/// ```
pub fn validate_email_rfc5322(email: &str) -> bool {
    match split_address(email) {
        Some((local, domain)) => validate_local(local) && validate_domain(domain),
        None => false,
    }
}

// ============================================================================
// Grammar pieces
// ============================================================================

/// Split at the last `@`, which must be neither first nor last
fn split_address(email: &str) -> Option<(&str, &str)> {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return None;
    }
    let at = email.rfind('@')?;
    if at == 0 || at == email.len() - 1 {
        return None;
    }
    Some((&email[..at], &email[at + 1..]))
}

fn validate_local(local: &str) -> bool {
    if local.is_empty() || local.len() > MAX_LOCAL_LENGTH {
        return false;
    }

    if local.starts_with('"') {
        if local.len() < 2 || !local.ends_with('"') {
            return false;
        }
        return validate_quoted_local(&local[1..local.len() - 1]);
    }

    !local.contains('"') && validate_unquoted_local(local)
}

fn validate_unquoted_local(local: &str) -> bool {
    if local.is_empty() || local.len() > MAX_LOCAL_LENGTH {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    local
        .chars()
        .all(|c| c.is_alphabetic() || c.is_ascii_digit() || LOCAL_ALLOWED_CHARS.contains(c))
}

/// Interior of a quoted local part: printable ASCII, `\` escapes `"` or `\`
fn validate_quoted_local(content: &str) -> bool {
    let mut bytes = content.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'\\' => match bytes.next() {
                Some(b'"') | Some(b'\\') => {}
                _ => return false,
            },
            b'"' => return false,
            32..=126 => {}
            _ => return false,
        }
    }
    true
}

fn validate_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LENGTH {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| validate_label(label))
}

fn validate_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .chars()
        .all(|c| c.is_alphabetic() || c.is_ascii_digit() || c == '-')
}
