//! Intent inference — substring heuristics over generated text.

use genloom_core::generation::Intent;

/// Infer what the generation actually did from how the response talks
/// about it. Checked in specificity order; `Generate` is the fallback.
pub fn infer_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();

    const REUSE: &[&str] = &["reuse", "re-use", "already exists", "existing component covers"];
    const COMPOSE: &[&str] = &["compose", "composing", "combining existing", "combine the existing"];
    const EXTEND: &[&str] = &["extend", "extending", "builds on the existing", "based on your existing"];

    if REUSE.iter().any(|m| lower.contains(m)) {
        Intent::Reuse
    } else if COMPOSE.iter().any(|m| lower.contains(m)) {
        Intent::Compose
    } else if EXTEND.iter().any(|m| lower.contains(m)) {
        Intent::Extend
    } else {
        Intent::Generate
    }
}
