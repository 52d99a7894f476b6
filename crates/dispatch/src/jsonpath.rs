//! A deliberately narrow JSONPath subset — `$.a.b[0].c` style dotted
//! paths with optional bracketed array indices. The conditional router
//! (spec §4.3) never needs filters, wildcards, or recursive descent; the
//! rule fixtures this is grounded on (`original_source/
//! test_conditional_router_enhanced.py`) only ever exercise plain field
//! access and single-level array indexing, so a hand-rolled walker here
//! is a better fit than pulling in a general-purpose JSONPath crate this
//! corpus never reaches for.

use serde_json::Value;

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn segments(path: &str) -> Vec<Segment<'_>> {
    let trimmed = path.strip_prefix("$.").or_else(|| path.strip_prefix('$')).unwrap_or(path);
    let mut out = Vec::new();
    for part in trimmed.split('.') {
        if part.is_empty() {
            continue;
        }
        match part.find('[') {
            None => out.push(Segment::Key(part)),
            Some(bracket_pos) => {
                let key = &part[..bracket_pos];
                if !key.is_empty() {
                    out.push(Segment::Key(key));
                }
                let mut rest = &part[bracket_pos..];
                while let Some(close) = rest.find(']') {
                    if let Ok(idx) = rest[1..close].parse::<usize>() {
                        out.push(Segment::Index(idx));
                    }
                    rest = &rest[close + 1..];
                    if !rest.starts_with('[') {
                        break;
                    }
                }
            }
        }
    }
    out
}

/// Walks `value` along `path`, returning `None` if any segment is absent
/// or of the wrong shape (object lookup on a non-object, out-of-range
/// index, and so on) — never panics on a malformed path.
pub fn extract<'a>(path: &str, value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments(path) {
        current = match segment {
            Segment::Key(key) => current.get(key)?,
            Segment::Index(idx) => current.get(idx)?,
        };
    }
    Some(current)
}
