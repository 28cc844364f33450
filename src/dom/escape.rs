use std::fmt::Write;

/// Escape a string for use as a CSS identifier (the `CSS.escape()` algorithm)
pub fn css_escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    for (index, &c) in chars.iter().enumerate() {
        let leading_digit = c.is_ascii_digit()
            && (index == 0 || (index == 1 && chars[0] == '-'));

        if c == '\0' {
            out.push('\u{FFFD}');
        } else if ('\u{1}'..='\u{1F}').contains(&c) || c == '\u{7F}' || leading_digit {
            let _ = write!(out, "\\{:x} ", c as u32);
        } else if index == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if !c.is_ascii() || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifiers_unchanged() {
        assert_eq!(css_escape("submit-btn"), "submit-btn");
        assert_eq!(css_escape("_private"), "_private");
        assert_eq!(css_escape("émoji✓"), "émoji✓");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(css_escape("1a"), "\\31 a");
        assert_eq!(css_escape("-1"), "-\\31 ");
        assert_eq!(css_escape("-"), "\\-");
        assert_eq!(css_escape("a:b.c"), "a\\:b\\.c");
        assert_eq!(css_escape("say \"hi\""), "say\\ \\\"hi\\\"");
        assert_eq!(css_escape("tab\there"), "tab\\9 here");
        assert_eq!(css_escape("nul\0"), "nul\u{FFFD}");
    }
}
