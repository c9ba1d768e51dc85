//! Grounded prompt assembly

use vidya_llm::{ContinuationToken, GenerationRequest};
use vidya_store::ScoredUnit;

/// Sentence the model must use when the context cannot answer the question
pub const REFUSAL: &str =
    "I'm sorry, I don't have enough information to answer that based on the provided context.";

/// Fixed behavioural instruction sent with every turn
pub fn system_prompt() -> String {
    format!(
        "You are a helpful assistant that answers questions about the user's documents.\n\
         Answer ONLY from the context provided with each question. Do not use outside knowledge.\n\
         If the context does not contain the answer, reply exactly: \"{}\"\n\
         Keep answers brief and to the point.\n\
         Cite the source file (and sheet, page or section when given) that supports each claim.\n\
         Take earlier turns of this conversation into account when interpreting follow-up questions.",
        REFUSAL
    )
}

/// Render retrieved units as numbered context blocks with their provenance
pub fn render_context(results: &[ScoredUnit]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(idx, scored)| {
            let header = scored
                .unit
                .metadata()
                .properties()
                .into_iter()
                .map(|(key, value)| format!("{}: {}", label(key), value))
                .collect::<Vec<_>>()
                .join(" | ");

            format!("[{}] {}\nContent: {}", idx + 1, header, scored.unit.content().trim())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn label(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// The user message: instruction, context block, then the raw question
pub fn user_message(context: &str, question: &str) -> String {
    format!(
        "Based on the context below, answer my question.\n\n---CONTEXT---\n{}\n\n---QUESTION---\n{}",
        context, question
    )
}

/// Assemble the full generation request for one turn
pub fn grounded_request(
    results: &[ScoredUnit],
    question: &str,
    continuation: Option<ContinuationToken>,
) -> GenerationRequest {
    GenerationRequest {
        system_prompt: system_prompt(),
        user_message: user_message(&render_context(results), question),
        continuation,
    }
}
