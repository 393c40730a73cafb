//! Category normalization.
//!
//! Free-text category input is reduced to an uppercase underscore-separated
//! token and matched against the fixed category set. Inputs that match no
//! fixed token are accepted in their derived form for compatibility with
//! historical data; the mismatch is logged as a data-quality warning.

/// The fixed category set blogs are tagged with.
pub const CANONICAL_CATEGORIES: [&str; 4] = [
    "MENTAL_HEALTH",
    "HEART_DISEASE",
    "COVID19",
    "IMMUNIZATION",
];

/// Normalize a raw category string.
///
/// Steps: trim, uppercase, strip everything but `[A-Z0-9 ]`, collapse
/// whitespace runs to single underscores. The result is matched against
/// [`CANONICAL_CATEGORIES`] exactly, then underscore-insensitively; failing
/// both, the derived token itself is returned. `None` means the input
/// reduced to nothing and must fail validation.
pub fn normalize_category(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_uppercase();
    let filtered: String = upper
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == ' ')
        .collect();

    let token = filtered.split_whitespace().collect::<Vec<_>>().join("_");
    if token.is_empty() {
        return None;
    }

    if CANONICAL_CATEGORIES.contains(&token.as_str()) {
        return Some(token);
    }

    // Second chance: match ignoring underscores, so e.g. "mentalhealth"
    // resolves to MENTAL_HEALTH.
    let squashed = token.replace('_', "");
    if let Some(canonical) = CANONICAL_CATEGORIES
        .iter()
        .find(|c| c.replace('_', "") == squashed)
    {
        return Some((*canonical).to_string());
    }

    tracing::warn!(
        input,
        derived = %token,
        "category matches no canonical token, storing derived form"
    );
    Some(token)
}
