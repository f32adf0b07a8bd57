//! Preamble and doc-comment extraction.
//!
//! Splits a document into a key:value preamble block and body, and pulls
//! free-text fragments out of source-code comment blocks. Extraction never
//! fails: the worst case is an empty preamble, no fragments, and the
//! unmodified body.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Parsed key:value preamble. Unparseable lines are skipped, never fatal.
    pub preamble: HashMap<String, String>,
    /// Free-text fragments pulled from source-code comment blocks.
    pub fragments: Vec<String>,
    /// Everything after the preamble, unmodified.
    pub body: String,
}

/// Extract preamble, body and (for code files) doc-comment fragments.
pub fn extract(content: &str, is_code: bool, min_fragment_len: usize) -> Extraction {
    let (preamble, body) = split_preamble(content);

    let fragments = if is_code {
        let mut fragments = extract_delimited(content, "/*", "*/");
        fragments.extend(extract_delimited(content, "\"\"\"", "\"\"\""));
        fragments
            .into_iter()
            .map(clean_fragment)
            .filter(|f| f.len() >= min_fragment_len)
            .collect()
    } else {
        Vec::new()
    };

    Extraction {
        preamble,
        fragments,
        body,
    }
}

/// Split a `---`-delimited key:value region off the top of a document.
/// Returns an empty preamble and the full content when no well-formed
/// delimited region exists.
fn split_preamble(content: &str) -> (HashMap<String, String>, String) {
    let mut lines = content.lines();
    match lines.next() {
        Some(first) if first.trim() == "---" => {}
        _ => return (HashMap::new(), content.to_string()),
    }

    let mut preamble = HashMap::new();
    let mut consumed = 1usize;
    let mut closed = false;

    for line in lines {
        consumed += 1;
        if line.trim() == "---" {
            closed = true;
            break;
        }
        // Lines that cannot be parsed as key:value are skipped
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() && !key.contains(char::is_whitespace) {
                preamble.insert(key.to_string(), value.trim().to_string());
            }
        }
    }

    if !closed {
        // Unterminated preamble degrades to "no preamble"
        return (HashMap::new(), content.to_string());
    }

    let body: String = content
        .lines()
        .skip(consumed)
        .collect::<Vec<_>>()
        .join("\n");
    (preamble, body)
}

/// Pull every `open ... close` block out of `content`. An unterminated
/// trailing block is dropped rather than reported.
fn extract_delimited(content: &str, open: &str, close: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find(open) {
        let after_open = &rest[start + open.len()..];
        match after_open.find(close) {
            Some(end) => {
                fragments.push(after_open[..end].to_string());
                rest = &after_open[end + close.len()..];
            }
            None => break,
        }
    }

    fragments
}

/// Strip comment decoration: per-line leading `*` gutters and surrounding
/// whitespace.
fn clean_fragment(fragment: String) -> String {
    fragment
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            trimmed.strip_prefix('*').unwrap_or(trimmed).trim()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_preamble_basic() {
        let content = "---\ntitle: Hello\ndescription: World\n---\n# Body\n\nText.";
        let extraction = extract(content, false, 40);
        assert_eq!(extraction.preamble.get("title").unwrap(), "Hello");
        assert_eq!(extraction.preamble.get("description").unwrap(), "World");
        assert!(extraction.body.starts_with("# Body"));
    }

    #[test]
    fn test_no_preamble() {
        let content = "# Just a doc\n\nNothing else.";
        let extraction = extract(content, false, 40);
        assert!(extraction.preamble.is_empty());
        assert_eq!(extraction.body, content);
    }

    #[test]
    fn test_malformed_preamble_lines_skipped() {
        let content = "---\ntitle: Ok\nthis line has no colon\nbad key: v\n---\nbody";
        let extraction = extract(content, false, 40);
        assert_eq!(extraction.preamble.len(), 1);
        assert_eq!(extraction.preamble.get("title").unwrap(), "Ok");
        assert_eq!(extraction.body, "body");
    }

    #[test]
    fn test_unterminated_preamble_degrades() {
        let content = "---\ntitle: Open\nno closing delimiter";
        let extraction = extract(content, false, 40);
        assert!(extraction.preamble.is_empty());
        assert_eq!(extraction.body, content);
    }

    #[test]
    fn test_block_comment_fragments() {
        let content = r#"
/* This module implements the frobnicator, which turns widgets
 * into gadgets through a series of regrettable transformations. */
fn frob() {}
"#;
        let extraction = extract(content, true, 40);
        assert_eq!(extraction.fragments.len(), 1);
        assert!(extraction.fragments[0].contains("frobnicator"));
        // Gutter stars stripped
        assert!(!extraction.fragments[0].contains("* into"));
    }

    #[test]
    fn test_triple_quoted_fragments() {
        let content = r#"
def process(items):
    """Process every item in order, collecting failures separately
    so a bad item never aborts the batch."""
    pass
"#;
        let extraction = extract(content, true, 40);
        assert_eq!(extraction.fragments.len(), 1);
        assert!(extraction.fragments[0].contains("never aborts"));
    }

    #[test]
    fn test_short_fragments_discarded() {
        let content = "/* tiny */\nfn x() {}\n/* this one is long enough to survive the minimum length filter */\n";
        let extraction = extract(content, true, 40);
        assert_eq!(extraction.fragments.len(), 1);
        assert!(extraction.fragments[0].contains("survive"));
    }

    #[test]
    fn test_unterminated_comment_dropped() {
        let content = "/* opened but never closed\nfn x() {}";
        let extraction = extract(content, true, 1);
        assert!(extraction.fragments.is_empty());
    }

    #[test]
    fn test_multiple_fragments() {
        let content = "/* first fragment with plenty of descriptive text inside */ code /* second fragment, also long enough to pass the filter */";
        let extraction = extract(content, true, 20);
        assert_eq!(extraction.fragments.len(), 2);
    }

    #[test]
    fn test_non_code_files_get_no_fragments() {
        let content = "/* looks like a comment but this is a markdown file */";
        let extraction = extract(content, false, 1);
        assert!(extraction.fragments.is_empty());
    }

    #[test]
    fn test_extract_never_fails_on_junk() {
        for junk in ["", "---", "---\n", "\"\"\"", "/*", "*/ */ /*"] {
            let extraction = extract(junk, true, 1);
            // Body is always present, even if empty
            assert!(extraction.body.len() <= junk.len() + 1);
        }
    }
}
