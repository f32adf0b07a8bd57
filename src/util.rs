//! Shared utilities for the docforge codebase

use std::path::Path;

/// Find the largest byte index <= `index` that is a char boundary in `s`.
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Truncate a string to at most `max_chars` bytes on a char boundary,
/// trimming trailing whitespace from the cut.
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    let end = floor_char_boundary(s, max_chars);
    s[..end].trim_end()
}

/// Whether a link target points outside the corpus (external URL, mail
/// address, or in-page anchor). Such targets are never resolved on disk.
pub fn is_external_target(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("mailto:")
        || target.starts_with("ftp://")
        || target.starts_with('#')
}

/// Strip an in-page anchor suffix from a relative link target.
/// `./guide.mdx#setup` resolves against `./guide.mdx`.
pub fn strip_anchor(target: &str) -> &str {
    match target.find('#') {
        Some(pos) => &target[..pos],
        None => target,
    }
}

/// Relative path of `path` under `base`, falling back to the full path when
/// `path` is not inside `base`.
pub fn rel_display(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
