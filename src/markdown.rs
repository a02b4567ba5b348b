/// Escape characters that break Markdown link syntax: `[`, `]`, `(`, `)`.
pub(crate) fn escape_md_link(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '[' | ']' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Flattens text onto one line for a Markdown heading.
/// Runs of whitespace, including newlines from multi-line titles, become one space.
pub(crate) fn sanitize_heading(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_special_chars() {
        assert_eq!(escape_md_link("normal text"), "normal text");
        assert_eq!(escape_md_link("a[b]c(d)e"), r"a\[b\]c\(d\)e");
    }

    #[test]
    fn sanitize_heading_flattens_whitespace() {
        assert_eq!(sanitize_heading("line1\nline2\r\nline3"), "line1 line2 line3");
        assert_eq!(sanitize_heading("  padded   title "), "padded title");
    }
}
