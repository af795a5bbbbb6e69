//! Topic extraction — keyword-membership scan against a fixed vocabulary.

/// The vocabulary scanned for topic membership.
const VOCABULARY: &[&str] = &[
    "button",
    "form",
    "input",
    "modal",
    "dialog",
    "table",
    "list",
    "card",
    "navigation",
    "menu",
    "dropdown",
    "layout",
    "grid",
    "chart",
    "animation",
    "auth",
    "login",
    "api",
    "state",
    "routing",
    "styling",
    "theme",
    "testing",
    "accessibility",
    "hook",
];

/// Maximum topics retained per session.
pub const MAX_TOPICS: usize = 20;

/// Merge topics found in `content` into `topics`.
///
/// Order-preserving: new topics append at the end, already-known topics
/// keep their position. When the cap is exceeded the oldest entries are
/// evicted first.
pub fn merge_topics(topics: &mut Vec<String>, content: &str) {
    let lower = content.to_lowercase();
    for word in VOCABULARY {
        if lower.contains(word) && !topics.iter().any(|t| t == word) {
            topics.push((*word).to_string());
        }
    }
    while topics.len() > MAX_TOPICS {
        topics.remove(0);
    }
}
