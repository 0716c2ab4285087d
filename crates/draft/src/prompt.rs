//! Prompt constants and composition.
//!
//! The model sees a fixed system prompt, one composed user turn, and a
//! prefilled assistant turn holding the greeting. Prefilling forces the
//! continuation into letter form; the same greeting is prepended again when
//! the final email is assembled.
//!
//! Placeholders (`{{CUSTOMER_NAME}}`, `{{CS_REP_NAME}}`) are never
//! substituted here.

use maildraft_core::draft::ConversationTurn;
use maildraft_core::message::Message;
use maildraft_core::retriever::RetrievedPassage;

/// Partial assistant turn the model continues from.
pub const GREETING_PREFILL: &str = "Hi {{CUSTOMER_NAME}},";

/// What the model must say when the knowledge base has nothing relevant.
pub const FALLBACK_SENTENCE: &str = "I don't have specific information about that right now, but I'll check with our team and get back to you as soon as possible.";

/// Fixed system instruction: persona, grounding, tone, and signature.
pub const SYSTEM_PROMPT: &str = r#"You are a customer service representative writing reply emails on behalf of the company. Always speak as the company representative, using "we" and "our" when referring to the company.

Knowledge rules:
- Answer ONLY with information found in the knowledge provided in the user's message. Never use outside knowledge and never invent policies, prices, dates, links, or procedures.
- If no knowledge is provided, or the knowledge does not address the customer's inquiry, reply with exactly this sentence in place of an answer: "I don't have specific information about that right now, but I'll check with our team and get back to you as soon as possible."
- Never mention "sources", "documents", or "the knowledge base" to the customer.

Tone and format:
- Write in a warm, conversational tone.
- Use 2 to 4 short paragraphs.
- Do not use numbered steps, bullet points, or headings; describe any steps in plain sentences.
- Do not repeat the greeting; the email already begins with it.

Always end the email with this signature block, exactly as written:

Best regards,
{{CS_REP_NAME}}
Customer Support Team"#;

/// Everything sent to the model for one draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBundle {
    pub system: &'static str,
    pub user_turn: String,
    pub prefill: &'static str,
}

impl PromptBundle {
    /// The two-turn message list: composed user turn, then the prefill.
    pub fn messages(&self) -> Vec<Message> {
        vec![Message::user(&self.user_turn), Message::assistant(self.prefill)]
    }
}

/// Compose the prompt for one question.
///
/// Sections, in order: prior conversation (only when present), the
/// numbered knowledge block or the no-knowledge instruction, the inquiry
/// itself, and the closing drafting instruction.
pub fn compose_prompt(
    question: &str,
    passages: &[RetrievedPassage],
    history: &[ConversationTurn],
) -> PromptBundle {
    let mut sections: Vec<String> = Vec::with_capacity(4);

    if !history.is_empty() {
        sections.push(format!("Previous conversation:\n{}", render_history(history)));
    }

    if passages.is_empty() {
        sections.push(format!(
            "No relevant knowledge was found for this inquiry. There is no information \
             available to answer it, so do not attempt an answer. Use the fallback sentence: \
             \"{FALLBACK_SENTENCE}\""
        ));
    } else {
        sections.push(format!(
            "Here is the relevant knowledge for this inquiry:\n\n{}\n\n\
             Use only this knowledge. If it does not address the inquiry, use the fallback \
             sentence: \"{FALLBACK_SENTENCE}\"",
            render_context(passages)
        ));
    }

    sections.push(format!("Customer inquiry:\n{question}"));

    let instruction = if history.is_empty() {
        "Draft a reply email to the customer's inquiry."
    } else {
        "Draft a reply email to the customer's latest inquiry, taking the previous conversation into account."
    };
    sections.push(instruction.to_string());

    PromptBundle {
        system: SYSTEM_PROMPT,
        user_turn: sections.join("\n\n"),
        prefill: GREETING_PREFILL,
    }
}

/// `[Source i]: <text>` blocks, 1-based, separated by blank lines.
fn render_context(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("[Source {}]: {}", i + 1, p.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Chronological `[Customer]` / `[CS Rep]` lines.
fn render_history(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("[{}]: {}", turn.role.prompt_label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The final email body: greeting, blank line, model continuation.
///
/// The continuation is appended verbatim.
pub fn assemble_response(continuation: &str) -> String {
    format!("{GREETING_PREFILL}\n\n{continuation}")
}
