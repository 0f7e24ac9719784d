//! Display helpers for CLI output

use chrono::{Local, TimeZone};

/// Truncate a string to max_len characters (not bytes), adding "..." if truncated.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        chars[..max_len].iter().collect()
    } else {
        format!("{}...", chars[..max_len - 3].iter().collect::<String>())
    }
}

/// Format epoch milliseconds in local time
pub fn format_timestamp_ms(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Group digits in thousands: 1204 → "1,204"
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// "4.6/5 (1,204 reviews)", or whichever half is known
pub fn format_rating(rating: Option<f64>, reviews: Option<u64>) -> Option<String> {
    match (rating, reviews) {
        (Some(r), Some(n)) => Some(format!("{:.1}/5 ({} reviews)", r, format_count(n))),
        (Some(r), None) => Some(format!("{:.1}/5", r)),
        (None, Some(n)) => Some(format!("{} reviews", format_count(n))),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("€€€€€€", 4), "€...");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1204), "1,204");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(Some(4.56), Some(1204)), Some("4.6/5 (1,204 reviews)".to_string()));
        assert_eq!(format_rating(Some(4.0), None), Some("4.0/5".to_string()));
        assert_eq!(format_rating(None, Some(12)), Some("12 reviews".to_string()));
        assert_eq!(format_rating(None, None), None);
    }
}
