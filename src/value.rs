//! Value score: one 0–10 desirability number from price, rating and review volume

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::product::ProductRecord;

const BASE_SCORE: f64 = 5.0;
const MAX_SCORE: f64 = 10.0;

const PRICE_WEIGHT: f64 = 2.0;
/// Prices at or above this earn nothing
const PRICE_CEILING: f64 = 1000.0;
const PRICE_SPAN: f64 = 990.0;

const RATING_WEIGHT: f64 = 3.0;
const RATING_SCALE: f64 = 5.0;

const REVIEW_WEIGHT: f64 = 1.0;
/// log10 of the review count that earns the full bonus (10,000)
const REVIEW_LOG_SPAN: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueLabel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ValueLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            ValueLabel::Excellent
        } else if score >= 6.0 {
            ValueLabel::Good
        } else if score >= 4.0 {
            ValueLabel::Fair
        } else {
            ValueLabel::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueLabel::Excellent => "excellent",
            ValueLabel::Good => "good",
            ValueLabel::Fair => "fair",
            ValueLabel::Poor => "poor",
        }
    }
}

impl fmt::Display for ValueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Score a record; absent fields simply don't contribute. `None` only when
/// there is no record at all.
pub fn value_score(record: Option<&ProductRecord>) -> Option<f64> {
    let record = record?;
    let mut score = BASE_SCORE;

    if let Some(price) = record.price {
        score += clamp01((PRICE_CEILING - price) / PRICE_SPAN) * PRICE_WEIGHT;
    }
    if let Some(rating) = record.rating {
        score += (rating / RATING_SCALE) * RATING_WEIGHT;
    }
    if let Some(count) = record.review_count {
        score += clamp01((count as f64 + 1.0).log10() / REVIEW_LOG_SPAN) * REVIEW_WEIGHT;
    }

    Some(score.clamp(0.0, MAX_SCORE))
}

/// Score and label together
pub fn value_rating(record: Option<&ProductRecord>) -> Option<(f64, ValueLabel)> {
    value_score(record).map(|score| (score, ValueLabel::from_score(score)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(price: Option<f64>, rating: Option<f64>, reviews: Option<u64>) -> ProductRecord {
        ProductRecord {
            url: "https://shop.example/p".to_string(),
            title: "Thing".to_string(),
            price,
            rating,
            review_count: reviews,
            currency: "USD".to_string(),
            timestamp: 0,
        }
    }

    fn score(price: Option<f64>, rating: Option<f64>, reviews: Option<u64>) -> f64 {
        value_score(Some(&record(price, rating, reviews))).unwrap()
    }

    #[test]
    fn test_absent_record() {
        assert_eq!(value_score(None), None);
        assert_eq!(value_rating(None), None);
    }

    #[test]
    fn test_base_score_without_fields() {
        assert_eq!(score(None, None, None), 5.0);
    }

    #[test]
    fn test_price_component() {
        assert_eq!(score(Some(1000.0), None, None), 5.0);
        assert_eq!(score(Some(5000.0), None, None), 5.0);
        assert_eq!(score(Some(10.0), None, None), 7.0);
        assert_eq!(score(Some(1.0), None, None), 7.0);
        assert!((score(Some(505.0), None, None) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_marks() {
        let s = score(Some(10.0), Some(5.0), Some(9_999));
        assert!((s - 10.0).abs() < 1e-9);
        assert_eq!(ValueLabel::from_score(s), ValueLabel::Excellent);
    }

    #[test]
    fn test_monotonic_in_rating_and_reviews() {
        let mut last = f64::MIN;
        for tenths in 0..=50 {
            let s = score(Some(200.0), Some(tenths as f64 / 10.0), Some(50));
            assert!(s >= last);
            last = s;
        }
        let mut last = f64::MIN;
        for count in [0u64, 1, 9, 99, 1_000, 50_000, 1_000_000] {
            let s = score(Some(200.0), Some(4.0), Some(count));
            assert!(s >= last);
            last = s;
        }
    }

    #[test]
    fn test_non_increasing_in_price() {
        let mut last = f64::MAX;
        for price in [1.0, 10.0, 50.0, 200.0, 999.0, 1000.0, 2500.0] {
            let s = score(Some(price), Some(4.0), Some(100));
            assert!(s <= last);
            assert!((0.0..=10.0).contains(&s));
            last = s;
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(ValueLabel::from_score(8.0), ValueLabel::Excellent);
        assert_eq!(ValueLabel::from_score(7.99), ValueLabel::Good);
        assert_eq!(ValueLabel::from_score(4.0), ValueLabel::Fair);
        assert_eq!(ValueLabel::from_score(3.5), ValueLabel::Poor);
        assert_eq!(ValueLabel::Good.to_string(), "good");
    }
}
