use regex::Regex;

/// Expand snippet `contents` into literal text plus the caret landing
/// spot, as a character offset into the expanded text.
///
/// Supports the field syntax the keymaps actually use: `$1`, `${1}`,
/// `${1:placeholder}` and the final `$0` stop. Placeholder text is kept,
/// the caret lands on the lowest-numbered field (then `$0`, then the
/// end).
pub fn expand(contents: &str) -> (String, usize) {
    let mut out = String::new();
    let mut out_chars = 0usize;
    // (field number, char offset in the expanded text)
    let mut fields: Vec<(u32, usize)> = Vec::new();

    let mut chars = contents.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            out_chars += 1;
            continue;
        }
        match chars.peek().copied() {
            Some('{') => {
                chars.next();
                let mut number = String::new();
                while let Some(d) = chars.peek().copied() {
                    if d.is_ascii_digit() {
                        number.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let field = number.parse().unwrap_or(0);
                fields.push((field, out_chars));
                if chars.peek() == Some(&':') {
                    chars.next();
                    while let Some(d) = chars.peek().copied() {
                        if d == '}' {
                            break;
                        }
                        out.push(d);
                        out_chars += 1;
                        chars.next();
                    }
                }
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
            }
            Some(d) if d.is_ascii_digit() => {
                let mut number = String::new();
                while let Some(d) = chars.peek().copied() {
                    if d.is_ascii_digit() {
                        number.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let field = number.parse().unwrap_or(0);
                fields.push((field, out_chars));
            }
            _ => {
                out.push('$');
                out_chars += 1;
            }
        }
    }

    let caret = fields
        .iter()
        .filter(|(n, _)| *n != 0)
        .min_by_key(|(n, _)| *n)
        .map(|&(_, offset)| offset)
        .or_else(|| {
            fields
                .iter()
                .find(|(n, _)| *n == 0)
                .map(|&(_, offset)| offset)
        })
        .unwrap_or(out_chars);

    (out, caret)
}

/// Strip snippet templating down to the characters shown in the help
/// panel: field markers go, then brace groups, then stray braces.
pub fn display_characters(contents: &str) -> String {
    let field = Regex::new(r"\$\{\d+(:[^}]*)?\}").expect("valid regex");
    let bare = Regex::new(r"\$\d+").expect("valid regex");
    let group = Regex::new(r"\{[^{}]*\}").expect("valid regex");

    let mut text = field.replace_all(contents, "").into_owned();
    text = bare.replace_all(&text, "").into_owned();
    // Repeated for nested groups like \sqrt{\frac{}{}}
    loop {
        let stripped = group.replace_all(&text, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }
    text.replace(['{', '}'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_plain_text_passthrough() {
        let (text, caret) = expand("\\alpha");
        assert_eq!(text, "\\alpha");
        assert_eq!(caret, 6);
    }

    #[test]
    fn test_expand_caret_on_first_field() {
        let (text, caret) = expand("\\frac{$1}{$2}$0");
        assert_eq!(text, "\\frac{}{}");
        assert_eq!(caret, 6); // inside the first brace pair
    }

    #[test]
    fn test_expand_keeps_placeholder_text() {
        let (text, caret) = expand("\\sqrt{${1:x}}$0");
        assert_eq!(text, "\\sqrt{x}");
        assert_eq!(caret, 6); // at the start of the placeholder
    }

    #[test]
    fn test_expand_falls_back_to_final_stop() {
        let (text, caret) = expand("\\quad$0");
        assert_eq!(text, "\\quad");
        assert_eq!(caret, 5);
    }

    #[test]
    fn test_expand_literal_dollar() {
        let (text, caret) = expand("cost: $ total");
        assert_eq!(text, "cost: $ total");
        assert_eq!(caret, 13);
    }

    #[test]
    fn test_display_characters_strips_fields_and_braces() {
        assert_eq!(display_characters("\\frac{$1}{$2}$0"), "\\frac");
        assert_eq!(display_characters("\\sqrt{$1}$0"), "\\sqrt");
        assert_eq!(display_characters("\\sum_{$1}^{$2}$0"), "\\sum_^");
        assert_eq!(display_characters("\\alpha"), "\\alpha");
    }

    #[test]
    fn test_display_characters_with_placeholder_defaults() {
        assert_eq!(display_characters("\\sqrt{${1:x}}$0"), "\\sqrt");
    }
}
