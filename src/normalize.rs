use once_cell::sync::Lazy;
use regex::Regex;

// Pre-compiled regex for whitespace normalization (compile once, use many times)
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Invalid whitespace regex pattern")
});

/// Collapse runs of whitespace (including newlines and nbsp) into single spaces and trim
pub fn normalize_text(content: &str) -> String {
    WHITESPACE_RE.replace_all(content, " ").trim().to_string()
}

/// Key used to detect near-duplicate fragments: lowercased, whitespace-collapsed,
/// trimmed, first `max_chars` characters
pub fn dedup_key(content: &str, max_chars: usize) -> String {
    normalize_text(&content.to_lowercase())
        .chars()
        .take(max_chars)
        .collect()
}

/// Length in characters (not bytes)
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// First `n` characters of `s`, never splitting a code point
pub fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        let input = "  Hello   World\n\n\tTest  ";
        assert_eq!(normalize_text(input), "Hello World Test");
    }

    #[test]
    fn test_normalize_nbsp() {
        assert_eq!(normalize_text("$19.99\u{a0}\u{a0}USD"), "$19.99 USD");
    }

    #[test]
    fn test_dedup_key() {
        let a = dedup_key("Great   Product\nIndeed", 100);
        let b = dedup_key("great product indeed", 100);
        assert_eq!(a, b);

        let long = "x".repeat(300);
        assert_eq!(dedup_key(&long, 100).len(), 100);
    }

    #[test]
    fn test_take_chars_unicode() {
        assert_eq!(take_chars("€€€€", 2), "€€");
        assert_eq!(take_chars("abc", 10), "abc");
        assert_eq!(char_len("€€€€"), 4);
    }
}
