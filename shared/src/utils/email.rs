//! Email address utilities

use once_cell::sync::Lazy;
use regex::Regex;

// Pragmatic address check; the backend does the authoritative validation
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap()
});

/// Trim and lowercase an address so the same inbox maps to one session key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check if an email address is well formed
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(&normalize_email(email))
}

/// Mask an email address for logs (e.g., j***n@school.edu)
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let chars: Vec<char> = local.chars().collect();
            let masked_local = match chars.len() {
                0 => String::from("***"),
                1 | 2 => format!("{}***", chars[0]),
                n => format!("{}***{}", chars[0], chars[n - 1]),
            };
            format!("{}@{}", masked_local, domain)
        }
        None => String::from("***"),
    }
}
