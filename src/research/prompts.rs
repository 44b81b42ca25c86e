//! Prompt templates for the three research stages and the final synthesis.

use crate::llm::ChatMessage;
use crate::types::SearchResult;

pub const QUERY_GEN_SYSTEM: &str = "You are a web intelligence search expert. Analyse the user's input and work out the core keywords that need to be searched. \
Output exactly one query that is best suited to a search engine, without any explanation, punctuation, prefix or suffix.";

pub const SUMMARY_SYSTEM: &str = "You are a professional intelligence analyst. Using the provided [Search result context], answer the user's question or summarise the key information. \
Requirements: be objective and concise, rely only on the search results, and never invent facts they do not mention.";

pub const SOLVER_SYSTEM: &str = "You are a lead analyst. You have received independent research reports from several AI experts, each using a different model. \
Combine these reports into one final, rigorously reasoned answer for the user. \
Requirements: 1. Use a clear structure in Markdown. 2. Where the experts' conclusions complement each other, integrate them; where they conflict, point out the differences.";

/// Build the message list for one stage.
///
/// Providers that reject a system role get the instructions folded into a
/// single user turn.
pub fn render(system: &str, user: &str, merge_system_prompt: bool) -> Vec<ChatMessage> {
    if merge_system_prompt {
        vec![ChatMessage::user(format!("{}\n\n{}", system, user))]
    } else {
        vec![ChatMessage::system(system), ChatMessage::user(user)]
    }
}

pub fn query_gen_messages(user_message: &str, merge_system_prompt: bool) -> Vec<ChatMessage> {
    if merge_system_prompt {
        render(
            QUERY_GEN_SYSTEM,
            &format!("User question: {}", user_message),
            true,
        )
    } else {
        render(QUERY_GEN_SYSTEM, user_message, false)
    }
}

pub fn summary_messages(
    user_message: &str,
    context: &str,
    merge_system_prompt: bool,
) -> Vec<ChatMessage> {
    render(
        SUMMARY_SYSTEM,
        &summary_user(user_message, context),
        merge_system_prompt,
    )
}

pub fn solver_messages(
    question: &str,
    reports: &[String],
    merge_system_prompt: bool,
) -> Vec<ChatMessage> {
    render(
        SOLVER_SYSTEM,
        &solver_user(question, reports),
        merge_system_prompt,
    )
}

pub fn summary_user(query: &str, context: &str) -> String {
    format!(
        "My search task is: {}\n\n[Search result context]:\n{}\n\nPlease summarise based on the information above:",
        query, context
    )
}

pub fn solver_user(original_question: &str, reports: &[String]) -> String {
    format!(
        "Original question: {}\n\n--- Independent model reports ---\n{}\n------------------------\nPlease write the final consolidated answer:",
        original_question,
        reports.join("\n\n")
    )
}

/// Title/content block for the first `limit` hits
pub fn context_block(results: &[SearchResult], limit: usize) -> String {
    results
        .iter()
        .take(limit)
        .map(|r| format!("Title: {}\nContent: {}", r.title, r.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn a raw model reply into a search query.
pub fn clean_search_query(raw: &str) -> String {
    raw.trim()
        .replace('"', "")
        .trim()
        .trim_matches(|c| matches!(c, '\'' | '`' | '“' | '”' | '‘' | '’'))
        .trim()
        .to_string()
}
