//! Lossy body sanitization for the target markup dialect.
//!
//! The renderer rejects several constructs commonly present in copied
//! documentation: unterminated inline-expression delimiters, raw doctype
//! declarations, unbalanced inline tags, and template placeholders leaking
//! into frontmatter. Render-safety is prioritized over byte-fidelity, so
//! this transform is intentionally lossy. Fenced code blocks pass through
//! untouched.

use once_cell::sync::Lazy;
use regex::Regex;

static DOCTYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<!doctype[^>]*>").unwrap());

static SELF_CLOSING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(br|hr|img)((?:[^>])*?)\s*/?>").unwrap());

/// Inline expressions carrying a digit are neutralized wholesale. A blunt
/// guard against executable-looking embedded expressions; it also destroys
/// legitimate numeric examples outside code fences.
static DIGIT_EXPR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*[0-9][^{}]*\}").unwrap());

/// Template placeholders that must never leak into generated frontmatter.
static TEMPLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{[^}]*\}\}|<%[^%]*%>").unwrap());

/// Sanitize a document body into the constrained dialect. After this pass
/// every inline-expression delimiter outside code fences is balanced.
pub fn sanitize(body: &str) -> String {
    let mut out = Vec::new();
    let mut in_code_block = false;

    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            out.push(line.to_string());
            continue;
        }
        if in_code_block {
            out.push(line.to_string());
            continue;
        }

        let line = DOCTYPE_RE.replace_all(line, "");
        let line = SELF_CLOSING_RE.replace_all(&line, "<$1$2 />");
        let line = DIGIT_EXPR_RE.replace_all(&line, "{/* expr */}");
        out.push(balance_braces(&line));
    }

    let mut result = out.join("\n");
    if body.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Neutralize unmatched `{`/`}` in a single line by rewriting them as HTML
/// entities. Matched pairs are left alone.
fn balance_braces(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut unmatched = vec![false; chars.len()];
    let mut open_stack = Vec::new();

    for (i, ch) in chars.iter().enumerate() {
        match ch {
            '{' => open_stack.push(i),
            '}' => {
                if open_stack.pop().is_none() {
                    unmatched[i] = true;
                }
            }
            _ => {}
        }
    }
    for i in open_stack {
        unmatched[i] = true;
    }

    if !unmatched.iter().any(|&u| u) {
        return line.to_string();
    }

    let mut result = String::with_capacity(line.len() + 8);
    for (i, ch) in chars.iter().enumerate() {
        if unmatched[i] {
            result.push_str(if *ch == '{' { "&#123;" } else { "&#125;" });
        } else {
            result.push(*ch);
        }
    }
    result
}

/// Sanitize a single-line frontmatter value: strip template placeholders,
/// inline-expression delimiters and newlines.
pub fn sanitize_inline(value: &str) -> String {
    let value = TEMPLATE_RE.replace_all(value, "");
    value
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '\n' | '\r'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctype_stripped() {
        let out = sanitize("<!DOCTYPE html>\n# Title\n");
        assert!(!out.to_lowercase().contains("doctype"));
        assert!(out.contains("# Title"));
    }

    #[test]
    fn test_self_closing_normalized() {
        assert_eq!(sanitize("a<br>b"), "a<br />b");
        assert_eq!(sanitize("a<br/>b"), "a<br />b");
        assert_eq!(sanitize("a<br />b"), "a<br />b");
        assert_eq!(
            sanitize("<img src=\"x.png\">"),
            "<img src=\"x.png\" />"
        );
        assert_eq!(sanitize("<hr>"), "<hr />");
    }

    #[test]
    fn test_digit_expression_neutralized() {
        let out = sanitize("retries is {count * 3} here");
        assert_eq!(out, "retries is {/* expr */} here");
    }

    #[test]
    fn test_plain_expression_kept() {
        let out = sanitize("the {name} placeholder");
        assert_eq!(out, "the {name} placeholder");
    }

    #[test]
    fn test_unbalanced_open_neutralized() {
        let out = sanitize("an {open expression");
        assert_eq!(out, "an &#123;open expression");
    }

    #[test]
    fn test_unbalanced_close_neutralized() {
        let out = sanitize("closing} only");
        assert_eq!(out, "closing&#125; only");
    }

    #[test]
    fn test_mixed_balanced_and_unbalanced() {
        let out = sanitize("keep {this} drop {that");
        assert_eq!(out, "keep {this} drop &#123;that");
    }

    #[test]
    fn test_code_fence_untouched() {
        let src = "```rust\nfn main() { let x = 3;\n```\n";
        assert_eq!(sanitize(src), src);
    }

    #[test]
    fn test_sanitized_body_passes_syntax_check() {
        let src = "# Doc\n\nan {open and {n 3} and }\n\n<!DOCTYPE html>\n";
        let out = sanitize(src);
        let issues = crate::validator::check_syntax(&out, "x.mdx");
        assert!(
            issues.is_empty(),
            "sanitized body should be clean, got: {:?}",
            issues
        );
    }

    #[test]
    fn test_sanitize_is_idempotent_for_clean_input() {
        let src = "# Doc\n\nplain prose with {name}.\n";
        assert_eq!(sanitize(src), src);
        assert_eq!(sanitize(&sanitize(src)), sanitize(src));
    }

    #[test]
    fn test_sanitize_inline_strips_templates() {
        assert_eq!(sanitize_inline("My {{ project.name }} docs"), "My docs");
        assert_eq!(sanitize_inline("Title <% id %> here"), "Title here");
        assert_eq!(sanitize_inline("keep {braces} out"), "keep braces out");
        assert_eq!(sanitize_inline("  spaced   words "), "spaced words");
    }

    #[test]
    fn test_trailing_newline_preserved() {
        assert!(sanitize("line\n").ends_with('\n'));
        assert!(!sanitize("line").ends_with('\n'));
    }
}
