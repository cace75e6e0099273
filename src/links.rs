//! Link extraction from free-form message text

use once_cell::sync::Lazy;
use regex::Regex;

/// Strict URLs only: a scheme is required, bare domains do not match.
/// Parentheses are kept only as balanced `(...)` groups.
static STRICT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:(?:https?|ftp|file|git|ssh|wss?)://|mailto:|magnet:\?)",
        r#"(?:[^\s<>"'`()]|\([^\s<>"'`()]*\))*"#,
        r#"(?:[^\s<>"'`().,;:!?\]}]|\([^\s<>"'`()]*\))"#,
    ))
    .expect("static URL pattern is valid")
});

/// First link found in `content`, if any
pub fn extract_first_link(content: &str) -> Option<&str> {
    STRICT_URL.find(content).map(|m| m.as_str())
}
