//! Extraction of JSON objects from free-form oracle text.
//!
//! Oracle responses often wrap the payload in prose or code fences. These
//! helpers locate the first balanced `{...}` block, skipping braces that
//! appear inside string literals.

/// Return the first balanced JSON object embedded in `text`, if any.
pub fn extract_first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_object_from_prose() {
        let text = "Here is my answer:\n```json\n{\"decision\": \"defer\"}\n```\nThanks";
        assert_eq!(extract_first_object(text), Some("{\"decision\": \"defer\"}"));
    }

    #[test]
    fn test_nested_and_string_braces() {
        let text = r#"x {"a": {"b": "}"}, "c": 1} {"second": true}"#;
        assert_eq!(
            extract_first_object(text),
            Some(r#"{"a": {"b": "}"}, "c": 1}"#)
        );
    }

    #[test]
    fn test_unbalanced_or_missing() {
        assert_eq!(extract_first_object("no json here"), None);
        assert_eq!(extract_first_object("{\"open\": 1"), None);
    }
}
