use regex::Regex;
use std::sync::OnceLock;

/// Inline NIP-21 references such as `nostr:npub1...` or `nostr:nevent1...`
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)nostr:[a-z0-9]+").expect("valid reference regex"))
}

/// Strip inline `nostr:` references and surrounding whitespace before parsing.
pub fn normalize(raw: &str) -> String {
    reference_pattern().replace_all(raw, "").trim().to_string()
}
