//! Frontmatter parsing
//!
//! Total function: malformed or absent frontmatter yields empty metadata
//! and the input unchanged, never an error.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn frontmatter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Leading `---` block with key: value lines, tolerant of CRLF
        Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---\r?\n?(.*)\z").expect("frontmatter regex")
    })
}

/// Split a document into its frontmatter map and body.
///
/// Values keep only simple `key: value` lines; surrounding single or double
/// quotes are stripped. Anything that doesn't look like frontmatter is
/// returned as-is with an empty map.
pub fn parse_frontmatter(content: &str) -> (BTreeMap<String, String>, String) {
    let Some(caps) = frontmatter_re().captures(content) else {
        return (BTreeMap::new(), content.to_string());
    };

    let mut metadata = BTreeMap::new();
    for line in caps[1].lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        if !key.is_empty() && !value.is_empty() {
            metadata.insert(key.to_string(), value.to_string());
        }
    }

    (metadata, caps[2].to_string())
}
