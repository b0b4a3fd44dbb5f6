use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A member of the senior reviewer pool for the current run.
///
/// Reconstructed every run from the roster and the availability map; only
/// the `email` survives across runs, as a position in the rotation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub email: String,
    pub handle: String,
    pub available: bool,
}

impl Reviewer {
    pub fn new(email: impl Into<String>, domain: &str, available: bool) -> Self {
        let email = email.into();
        let handle = handle_from_email(&email, domain);
        Self {
            email,
            handle,
            available,
        }
    }
}

/// Strip `@domain` from an email to get the short handle used on tickets.
/// Addresses outside `domain` are returned unchanged.
pub fn handle_from_email(email: &str, domain: &str) -> String {
    let suffix = format!("@{domain}");
    match email.strip_suffix(&suffix) {
        Some(handle) => handle.to_string(),
        None => email.to_string(),
    }
}

/// Inverse of [`handle_from_email`]. Values that already look like an email
/// pass through.
pub fn email_from_handle(handle: &str, domain: &str) -> String {
    if handle.contains('@') {
        handle.to_string()
    } else {
        format!("{handle}@{domain}")
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

pub fn is_valid_email(s: &str) -> bool {
    email_re().is_match(s)
}
