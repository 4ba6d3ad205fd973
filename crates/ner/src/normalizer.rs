use regex::Regex;
use std::sync::LazyLock;

// Only scheme- or www-prefixed tokens count as URLs. Their markers (`://`, `.`) never
// survive punctuation stripping, so normalized text cannot be re-matched here.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://|www\.)\S*").expect("url pattern should compile")
});

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("mention pattern should compile"));

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("hashtag pattern should compile"));

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("symbol pattern should compile"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern should compile"));

/// Clean free text before it reaches the entity model.
///
/// Removes URLs, `@mentions` and `#hashtags`, strips everything outside
/// `[a-zA-Z0-9\s]`, lowercases and collapses whitespace runs to a single space.
/// Never fails; the output always matches `^[a-z0-9 ]*$` with no leading,
/// trailing or doubled spaces.
pub fn normalize(text: &str) -> String {
    let text = URL.replace_all(text, "");
    let text = MENTION.replace_all(&text, "");
    let text = HASHTAG.replace_all(&text, "");
    let text = NON_ALPHANUMERIC.replace_all(&text, "");
    let text = text.to_ascii_lowercase();
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Normalize an arbitrary JSON value. Anything that is not a string becomes "".
pub fn normalize_value(value: &serde_json::Value) -> String {
    value.as_str().map(normalize).unwrap_or_default()
}
