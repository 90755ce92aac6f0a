//! The closed `transform` operation set: pure functions over text, no
//! side effects on any store.

use agrama_core::{AgramaError, Result, ValidationRule};
use bumpalo::Bump;
use serde_json::Value;

pub const OPERATIONS: &[&str] = &["generate_summary", "parse_functions", "extract_imports", "compress_text"];

pub fn run(arena: &Bump, operation: &str, data: &str, options: &Value) -> Result<String> {
    match operation {
        "generate_summary" => Ok(generate_summary(arena, data, options)),
        "parse_functions" => Ok(parse_functions(data)),
        "extract_imports" => Ok(extract_imports(data)),
        "compress_text" => Ok(compress_text(arena, data, options)),
        other => Err(AgramaError::validation(
            ValidationRule::UnknownOperation,
            format!("unknown transform operation: {other}"),
        )),
    }
}

fn option_usize(options: &Value, key: &str, default: usize) -> usize {
    options.get(key).and_then(Value::as_u64).map(|v| v as usize).unwrap_or(default)
}

/// Take the first `max_sentences` sentences (default 3), boundary-split on
/// `.`, `!`, `?`.
fn generate_summary(arena: &Bump, data: &str, options: &Value) -> String {
    let max_sentences = option_usize(options, "max_sentences", 3);
    let mut buf = bumpalo::collections::String::new_in(arena);
    let mut count = 0;
    for sentence in data.split_inclusive(['.', '!', '?']) {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            continue;
        }
        if count >= max_sentences {
            break;
        }
        if count > 0 {
            buf.push(' ');
        }
        buf.push_str(trimmed);
        count += 1;
    }
    buf.into_bump_str().to_string()
}

/// Scan for `fn`/`function`/`def` declarations and return a JSON array of
/// the declared names, as a string.
fn parse_functions(data: &str) -> String {
    const KEYWORDS: &[&str] = &["fn ", "function ", "def "];
    let mut names: Vec<String> = Vec::new();
    for line in data.lines() {
        let trimmed = line.trim_start();
        for keyword in KEYWORDS {
            if let Some(rest) = trimmed.strip_prefix(keyword) {
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if !name.is_empty() {
                    names.push(name);
                }
                break;
            }
        }
    }
    serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
}

/// Scan for `import`/`use`/`#include`/`from ... import` lines and return a
/// JSON array of the raw import lines, as a string.
fn extract_imports(data: &str) -> String {
    let imports: Vec<&str> = data
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with("import ")
                || line.starts_with("use ")
                || line.starts_with("#include ")
                || (line.starts_with("from ") && line.contains(" import "))
        })
        .collect();
    serde_json::to_string(&imports).unwrap_or_else(|_| "[]".to_string())
}

/// Collapse runs of whitespace and truncate to `max_len` (default 256)
/// characters, appending an ellipsis marker when truncated.
fn compress_text(arena: &Bump, data: &str, options: &Value) -> String {
    let max_len = option_usize(options, "max_len", 256);
    let mut collapsed = bumpalo::collections::String::new_in(arena);
    let mut last_was_space = false;
    for c in data.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                collapsed.push(' ');
            }
            last_was_space = true;
        } else {
            collapsed.push(c);
            last_was_space = false;
        }
    }
    let trimmed = collapsed.trim();
    if trimmed.chars().count() <= max_len {
        trimmed.to_string()
    } else {
        let truncated: String = trimmed.chars().take(max_len).collect();
        format!("{truncated}...")
    }
}
