use similar::TextDiff;

/// Unified diff of `old` → `new` with `a/<path>` and `b/<path>` headers
///
/// Identical inputs produce an empty string.
pub fn unified_diff(rel_path: &str, old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    diff.unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", rel_path), &format!("b/{}", rel_path))
        .to_string()
}
