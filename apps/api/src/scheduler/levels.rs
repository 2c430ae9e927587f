//! Maps learner-facing level and interest tags onto catalog filter values.

/// Catalog levels a learner level tag covers.
///
/// CEFR tags and the profile's beginner/intermediate/advanced scale map onto
/// the catalog's three tiers. The catalog still carries a Hebrew spelling of
/// "basic" on older rows, so basic tiers match both. Onboarding stores the
/// audience type (kids, students, business) in the same field, so those map
/// to tier ranges too. Unknown non-empty tags match literally; an empty tag
/// means no level filter.
pub fn catalog_levels(level: &str) -> Vec<String> {
    let level = level.trim();
    let mapped: &[&str] = match level {
        "" => &[],
        "Letters" | "A1" | "beginner" | "kids" => &["basic", "בסיסי"],
        "students" => &["basic", "intermediate"],
        "business" => &["intermediate", "advanced"],
        "A2" => &["basic", "intermediate"],
        "B1" | "intermediate" => &["intermediate"],
        "B2" | "C1" | "C2" | "advanced" => &["advanced"],
        other => return vec![other.to_string()],
    };
    mapped.iter().map(|s| s.to_string()).collect()
}

/// Splits a comma-separated interest tag into trimmed, non-empty categories.
pub fn catalog_categories(category: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for piece in category.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !out.iter().any(|c| c == piece) {
            out.push(piece.to_string());
        }
    }
    out
}
