use std::borrow::Cow;

/// Trims and collapses every run of whitespace (including line feeds) into a single space
pub fn make_single_line(s: &str) -> Cow<str> {
    let trimmed = s.trim();
    let needs_collapse =
        trimmed.contains("  ") || trimmed.chars().any(|c| c.is_whitespace() && c != ' ');
    if needs_collapse {
        Cow::Owned(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
    } else {
        Cow::Borrowed(trimmed)
    }
}
