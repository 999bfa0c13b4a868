//! Input and history sanitization
//!
//! Pure functions. `sanitize_input` defends against control-sequence
//! payloads; `sanitize_history` normalizes a caller-supplied conversation
//! into the strict alternating shape chat APIs require.

use crate::types::{ChatMessage, Role};

/// Strip control characters from raw user input, keeping newlines and tabs
pub fn sanitize_input(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Normalize a conversation history so that the output either is empty or
/// starts with a user turn, ends with an assistant turn, and never has two
/// adjacent turns of the same role.
///
/// Adjacent same-role messages are merged with a blank line, a leading
/// assistant greeting is dropped, and trailing user turns are dropped (the
/// orchestrator appends the fresh user message itself).
pub fn sanitize_history(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut merged: Vec<ChatMessage> = Vec::new();

    for msg in history {
        if msg.content.trim().is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.role == msg.role => {
                last.content.push_str("\n\n");
                last.content.push_str(&msg.content);
            }
            _ => merged.push(msg.clone()),
        }
    }

    // Must open with a user turn
    if merged.first().map(|m| m.role) == Some(Role::Assistant) {
        merged.remove(0);
    }

    // Must close with an assistant turn
    if merged.last().map(|m| m.role) == Some(Role::User) {
        merged.pop();
    }

    merged
}
