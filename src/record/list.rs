//! String-list syntax used by `tags` and list-valued fields.
//!
//! Items are separated by whitespace; items containing whitespace are
//! wrapped in double square brackets: `alpha [[two words]] gamma`.

/// Parse a string list into its items.
///
/// Duplicate items keep their first occurrence.
pub fn parse_string_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut rest = value.trim_start();

    while !rest.is_empty() {
        let (item, tail) = if let Some(body) = rest.strip_prefix("[[") {
            match body.find("]]") {
                Some(end) => (&body[..end], &body[end + 2..]),
                None => (body, ""),
            }
        } else {
            match rest.find(char::is_whitespace) {
                Some(end) => (&rest[..end], &rest[end..]),
                None => (rest, ""),
            }
        };

        if !item.is_empty() && !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
        rest = tail.trim_start();
    }

    items
}

/// Render items back into string-list syntax.
pub fn stringify_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| {
            let item = item.as_ref();
            if item.chars().any(char::is_whitespace) {
                format!("[[{item}]]")
            } else {
                item.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_items() {
        assert_eq!(parse_string_list("a b  c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_bracketed_items() {
        assert_eq!(
            parse_string_list("$:/tags/Stylesheet [[two words]] tail"),
            vec!["$:/tags/Stylesheet", "two words", "tail"]
        );
    }

    #[test]
    fn test_parse_dedups_and_ignores_empty() {
        assert_eq!(parse_string_list("  x [[]] x y "), vec!["x", "y"]);
        assert!(parse_string_list("").is_empty());
    }

    #[test]
    fn test_parse_unterminated_bracket() {
        assert_eq!(parse_string_list("a [[b c"), vec!["a", "b c"]);
    }

    #[test]
    fn test_stringify_wraps_whitespace() {
        assert_eq!(stringify_list(&["a", "b c"]), "a [[b c]]");
        assert_eq!(parse_string_list(&stringify_list(&["one two", "three"])), vec!["one two", "three"]);
    }
}
