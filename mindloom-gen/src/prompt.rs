//! Prompt construction for topic and text-selection generation requests.

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an assistant that explains concepts clearly and in detail.";

/// A system/user prompt pair ready to send to the generation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSet {
    pub system: String,
    pub user: String,
}

/// Prompt for a brand-new topic node.
pub fn topic_prompt(topic: &str, system_override: Option<&str>) -> PromptSet {
    PromptSet {
        system: resolve_system(system_override),
        user: format!("Explain: {}", topic),
    }
}

/// Prompt for a child node spawned from selected text inside a parent node.
///
/// `context` is the origin node's content; `custom_prompt` is an optional
/// user question that replaces the plain "explain the selection" intent.
pub fn related_prompt(
    selected_text: &str,
    context: &str,
    custom_prompt: Option<&str>,
    system_override: Option<&str>,
) -> PromptSet {
    let user = match custom_prompt {
        Some(question) => format!(
            "Context: \"{}\"\nSelected: \"{}\"\nQ: \"{}\"\n\nAnswer \"{}\" based on the context.",
            context, selected_text, question, question
        ),
        None => format!(
            "Context: \"{}\"\nSelected: \"{}\"\n\nExplain \"{}\".",
            context, selected_text, selected_text
        ),
    };

    PromptSet {
        system: resolve_system(system_override),
        user,
    }
}

fn resolve_system(system_override: Option<&str>) -> String {
    match system_override {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => DEFAULT_SYSTEM_PROMPT.to_string(),
    }
}
