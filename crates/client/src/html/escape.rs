//! HTML text escaping.

/// Escape text for use in HTML content or a double-quoted attribute value.
///
/// Replaces `&`, `<`, `>`, `"` and `'` with character references.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_text() {
        assert_eq!(escape_html("NCLEX prep"), "NCLEX prep");
    }

    #[test]
    fn test_escape_all_special_characters() {
        assert_eq!(
            escape_html(r#"Nurse's "Guide" & Tips <2025>"#),
            "Nurse&#039;s &quot;Guide&quot; &amp; Tips &lt;2025&gt;"
        );
    }

    #[test]
    fn test_escape_does_not_double_decode() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_escape_empty() {
        assert_eq!(escape_html(""), "");
    }
}
