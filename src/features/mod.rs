pub mod layout;

use lazy_static::lazy_static;
use regex::Regex;

pub use layout::{FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};

lazy_static! {
    // Four digit groups joined by dots. Octet ranges are deliberately not checked.
    static ref DOTTED_QUAD: Regex = Regex::new(r"\d+\.\d+\.\d+\.\d+").unwrap();
}

/// Lexical features of a raw URL string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlFeatures {
    pub url_length: usize,
    pub has_at_symbol: bool,
    /// Textual prefix check only, the scheme is not parsed.
    pub is_https: bool,
    pub has_ip_literal: bool,
    pub dot_count: usize,
}

impl UrlFeatures {
    /// Extract features from any string. Never fails, even for empty or malformed input.
    pub fn extract(url: &str) -> Self {
        Self {
            url_length: url.chars().count(),
            has_at_symbol: url.contains('@'),
            is_https: url.starts_with("https"),
            has_ip_literal: DOTTED_QUAD.is_match(url),
            dot_count: url.matches('.').count(),
        }
    }

    /// Convert to the numeric layout defined in [`FEATURE_LAYOUT`].
    pub fn to_vector(&self) -> FeatureVector {
        [
            self.url_length as f64,
            flag(self.has_at_symbol),
            flag(self.is_https),
            flag(self.has_ip_literal),
            self.dot_count as f64,
        ]
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
