//! Feature layout shared with the offline training collaborator.
//!
//! Models are fit against this exact order. Reordering, adding or removing an
//! entry breaks every previously trained artifact.

/// Feature names in the order they appear in a [`FeatureVector`].
pub const FEATURE_LAYOUT: &[&str] = &[
    "url_length",     // 0: character count of the URL
    "has_at_symbol",  // 1: '@' anywhere in the URL
    "is_https",       // 2: URL text starts with "https"
    "has_ip_literal", // 3: dotted-quad digit pattern present
    "dot_count",      // 4: number of '.' characters
];

/// Must match `FEATURE_LAYOUT.len()`.
pub const FEATURE_COUNT: usize = 5;

/// Numeric form handed to a classifier.
pub type FeatureVector = [f64; FEATURE_COUNT];
