//! Prompt assembly for a single agent invocation.

use miniagi_core::message::Message;

const SECTION_SEPARATOR: &str = "\n---\n";

/// Build the two turns sent to the provider: one system turn and one user turn.
///
/// Everything except the query goes into the single system turn since some
/// backends reject more than one system message.
pub fn build_messages(
    preamble: &str,
    custom_instruction: Option<&str>,
    context_log: &[String],
    query: &str,
) -> Vec<Message> {
    let mut sections = Vec::with_capacity(3);

    if let Some(instruction) = custom_instruction.filter(|i| !i.trim().is_empty()) {
        sections.push(format!("CUSTOM USER INSTRUCTIONS:\n{instruction}\n"));
    }
    sections.push(preamble.to_string());
    if !context_log.is_empty() {
        sections.push(format!(
            "\nContext from previous steps:\n{}",
            context_log.join("\n")
        ));
    }

    vec![
        Message::system(sections.join(SECTION_SEPARATOR)),
        Message::user(query),
    ]
}
