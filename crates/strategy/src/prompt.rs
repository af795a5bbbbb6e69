//! Prompt assembly — renders budgeted context sections into prompt text.
//!
//! Every section is truncated to its budget ceiling before it reaches the
//! provider. The output-format instructions establish the fenced-block +
//! filename-annotation convention the parser expects on the way back.

use genloom_context::budget::{ContextBudget, DetailMode};
use genloom_context::token::truncate_to_budget;
use genloom_core::analyzer::ProjectContext;
use genloom_core::generation::GenerationRequest;
use genloom_core::message::{HistoryTurn, Role};

/// The output-format contract sent with every request.
const FORMAT_INSTRUCTIONS: &str = "\
You are a code generation assistant.
Return code in fenced blocks with a language tag.
Start each block with a comment naming the file, e.g.:
```tsx
// filename: Button.tsx
```
One file per block. Keep prose outside the fences.";

/// Build the system prompt, truncated to the budget's system ceiling.
pub fn system_prompt(budget: &ContextBudget) -> String {
    truncate_to_budget(FORMAT_INSTRUCTIONS, budget.max_system_prompt_tokens)
}

/// Render the project context section within the budget.
///
/// Detail scales with the budget: `Minimal` lists bare component names,
/// `Essential` adds exports, `Full` adds design tokens and build tool.
pub fn render_context(context: &ProjectContext, budget: &ContextBudget) -> String {
    if context.is_empty() {
        return String::new();
    }

    let mut out = String::from("## Project\n");
    if !context.framework.is_empty() {
        out.push_str(&format!("Framework: {}\n", context.framework));
    }

    if !context.components.is_empty() {
        out.push_str("Components:\n");
        for component in context.components.iter().take(budget.components_limit) {
            match budget.detail_mode {
                DetailMode::Minimal => {
                    out.push_str(&format!("- {}\n", component.name));
                }
                DetailMode::Essential | DetailMode::Full => {
                    if component.exports.is_empty() {
                        out.push_str(&format!("- {}\n", component.name));
                    } else {
                        out.push_str(&format!(
                            "- {} (exports: {})\n",
                            component.name,
                            component.exports.join(", ")
                        ));
                    }
                }
            }
        }
    }

    if budget.detail_mode == DetailMode::Full {
        if !context.design_tokens.is_empty() {
            out.push_str(&format!("Design tokens: {}\n", context.design_tokens.join(", ")));
        }
        if !context.build_tool.is_empty() {
            out.push_str(&format!("Build tool: {}\n", context.build_tool));
        }
    }

    truncate_to_budget(&out, budget.max_project_context_tokens)
}

/// Render recent history as a text section within the budget.
pub fn render_history(history: &[HistoryTurn], budget: &ContextBudget) -> String {
    if history.is_empty() {
        return String::new();
    }

    let mut out = String::from("## Recent conversation\n");
    let skip = history.len().saturating_sub(budget.history_turn_limit);
    for turn in &history[skip..] {
        let label = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        out.push_str(&format!("{label}: {}\n", turn.content));
    }

    truncate_to_budget(&out, budget.max_history_tokens)
}

/// Build the single large prompt used by the core strategy: truncated
/// project context, recent history, then the user message.
pub fn core_prompt(request: &GenerationRequest, budget: &ContextBudget) -> String {
    let mut sections = Vec::new();

    if let Some(context) = &request.context {
        let rendered = render_context(context, budget);
        if !rendered.is_empty() {
            sections.push(rendered);
        }
    }

    let history = render_history(&request.history, budget);
    if !history.is_empty() {
        sections.push(history);
    }

    sections.push(format!("## Request\n{}", request.message));
    sections.join("\n\n")
}
