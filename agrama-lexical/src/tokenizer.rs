//! Identifier-aware tokenizer.
//!
//! 1. Split on whitespace and ASCII punctuation except `_`.
//! 2. Within each raw token, further split on `aB` (camelCase), `_`
//!    (snake_case), and digit/letter boundaries; emit both the component
//!    tokens and the original joined token.
//! 3. Lowercase each emitted token for indexing; original casing is only
//!    preserved by the caller for snippet rendering (this module only
//!    returns the lowercased index tokens).
//! 4. Drop tokens shorter than 2 or longer than 64 characters.
//! 5. Deterministic and side-effect-free.

/// Tokenize `text` into lowercased index tokens, grounded on rules 1–5.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for raw in split_raw(text) {
        let parts = split_identifier(&raw);
        for part in parts {
            push_if_in_range(&mut out, &part);
        }
        // Emit the original joined token too (rule 2), unless it's identical
        // to its only component (avoids pointless duplicates for e.g. "hello").
        if count_identifier_parts(&raw) > 1 {
            push_if_in_range(&mut out, &raw);
        }
    }
    out
}

/// Tokenize and deduplicate, preserving first-seen order. Used for query
/// processing where a term should only contribute once to an OR match.
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn push_if_in_range(out: &mut Vec<String>, token: &str) {
    let lower = token.to_lowercase();
    let len = lower.chars().count();
    if (2..=64).contains(&len) {
        out.push(lower);
    }
}

/// Rule 1: split on whitespace and ASCII punctuation except `_`.
fn split_raw(text: &str) -> Vec<String> {
    text.split(|c: char| {
        c.is_whitespace() || (c.is_ascii_punctuation() && c != '_')
    })
    .filter(|s| !s.is_empty())
    .map(String::from)
    .collect()
}

/// Rule 2: split a raw token into identifier components on camelCase,
/// snake_case, and digit/letter transitions.
fn split_identifier(raw: &str) -> Vec<String> {
    let chars: Vec<char> = raw.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            continue;
        }
        if i > 0 {
            let prev = chars[i - 1];
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_ascii_digit())
                || (prev.is_ascii_digit() && c.is_alphabetic());
            if boundary && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn count_identifier_parts(raw: &str) -> usize {
    split_identifier(raw).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_basic() {
        let tokens = tokenize("Hello, World!");
        assert_eq!(tokens, vec!["hello", "world"]);
    }

    #[test]
    fn tokenize_filters_short() {
        let tokens = tokenize("I am a test");
        assert_eq!(tokens, vec!["am", "test"]);
    }

    #[test]
    fn tokenize_empty() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn tokenize_only_punctuation() {
        assert!(tokenize("...---...").is_empty());
    }

    #[test]
    fn camel_case_emits_parts_and_joined() {
        let tokens = tokenize("calculateDistance");
        assert!(tokens.contains(&"calculate".to_string()));
        assert!(tokens.contains(&"distance".to_string()));
        assert!(tokens.contains(&"calculatedistance".to_string()));
    }

    #[test]
    fn snake_case_emits_parts() {
        let tokens = tokenize("parse_json_response");
        assert!(tokens.contains(&"parse".to_string()));
        assert!(tokens.contains(&"json".to_string()));
        assert!(tokens.contains(&"response".to_string()));
    }

    #[test]
    fn get_user_data_from_api_contains_user() {
        let tokens = tokenize("getUserDataFromAPI");
        assert!(tokens.contains(&"user".to_string()));
    }

    #[test]
    fn digit_letter_boundary_splits() {
        let tokens = tokenize("v2Release");
        assert!(tokens.contains(&"release".to_string()));
    }

    #[test]
    fn underscore_is_not_a_punctuation_split_point() {
        // Rule 1 explicitly excludes `_` from the raw split.
        let tokens = split_raw("foo_bar baz");
        assert_eq!(tokens, vec!["foo_bar", "baz"]);
    }

    #[test]
    fn tokenize_is_deterministic() {
        let a = tokenize("getUserDataFromAPI parse_json_response");
        let b = tokenize("getUserDataFromAPI parse_json_response");
        assert_eq!(a, b);
    }

    #[test]
    fn tokenize_unique_dedups_preserving_order() {
        let tokens = tokenize_unique("apple banana apple cherry");
        assert_eq!(tokens, vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn single_word_does_not_duplicate_itself() {
        let tokens = tokenize("hello");
        assert_eq!(tokens, vec!["hello"]);
    }
}
