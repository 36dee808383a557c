//! Name similarity used for grouping and confidence scoring.

/// Normalizes a tag name for comparison: trimmed and lower-cased.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Sørensen–Dice coefficient over character bigrams of the normalized names.
///
/// Symmetric, within [0, 1], and 1.0 for names that only differ in case.
///
/// # Examples
///
/// ```
/// use tagdedup::dedup::name_similarity;
///
/// assert_eq!(name_similarity("Invoice", "invoice"), 1.0);
/// assert!(name_similarity("Invoice", "Receipt") < 0.5);
/// ```
#[must_use]
pub fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::sorensen_dice(&normalize_name(a), &normalize_name(b))
}
