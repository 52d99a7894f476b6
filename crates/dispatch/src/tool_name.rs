//! Tool-name canonicalization (spec §4.3): hyphens become underscores,
//! then a fixed alias table maps a handful of historical spellings onto
//! the two built-in tool names.

/// Canonicalizes a raw `tool_type` before lookup or dispatch.
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    let underscored = raw.replace('-', "_");
    match underscored.as_str() {
        "web_search" | "WebSearch" => "search_web".to_string(),
        "webpage_visit" => "visit_webpage".to_string(),
        _ => underscored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphens_become_underscores() {
        assert_eq!(canonicalize("composio-github"), "composio_github");
    }

    #[test]
    fn known_aliases_map_to_builtins() {
        assert_eq!(canonicalize("web_search"), "search_web");
        assert_eq!(canonicalize("WebSearch"), "search_web");
        assert_eq!(canonicalize("webpage_visit"), "visit_webpage");
    }

    #[test]
    fn unmapped_names_pass_through_underscored() {
        assert_eq!(canonicalize("send-email"), "send_email");
    }
}
