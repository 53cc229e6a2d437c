//! Prompts and fixed messages for the document chat

use crate::model::ChatTurn;

/// Literal reply the model is told to give when the document has no answer
pub const WEB_SEARCH_SENTINEL: &str = "[PERFORM_WEB_SEARCH]";

/// First model-side message, followed by the document itself
pub const DOCUMENT_SEED_PREFIX: &str = "Analyze and answer questions based only on this document:";

pub const WELCOME_MESSAGE: &str = "Hello! I have read your document. Ask me anything about its content and I will answer using the text of the contract.";

pub const PERMISSION_PROMPT_MESSAGE: &str =
    "I couldn't find an answer in the document. Can I search the web for you?";

pub const DECLINED_MESSAGE: &str = "Understood. I will not perform the search. Is there anything else I can look for in the document for you?";

pub const CHAT_ERROR_MESSAGE: &str = "Sorry, an error occurred. Please try again.";

pub const SEARCH_ERROR_MESSAGE: &str = "Sorry, an error occurred during the web search.";

pub const SEARCH_NO_ANSWER_MESSAGE: &str =
    "I was unable to find an answer through web search. Please try rephrasing the question.";

/// Number of most recent transcript turns replayed into a web search prompt
pub const SEARCH_CONTEXT_TURNS: usize = 4;

/// System instruction restricting answers to the document
pub fn build_chat_instruction(contract_type: &str, language: &str) -> String {
    format!(
        r#"You are a legal assistant specializing in {contract_type}. Your native language is {language}.
Your sole purpose is to answer questions based EXCLUSIVELY on the text of the document you have been provided.
Do not invent information. If the answer is not in the text, respond EXACTLY with the string '{WEB_SEARCH_SENTINEL}' and nothing else.
Be precise and quote parts of the text when relevant. Respond in {language}."#
    )
}

/// Prompt for a web-grounded answer using the tail of the conversation
pub fn build_search_prompt(context: &[ChatTurn], query: &str, language: &str) -> String {
    let start = context.len().saturating_sub(SEARCH_CONTEXT_TURNS);
    let history = context[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.speaker(), turn.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Based on the following conversation, formulate a clear and concise answer to the user's final question using the latest information from the web. The answer must be in {language}.

--- START CONVERSATION CONTEXT ---
{history}
--- END CONVERSATION CONTEXT ---

USER'S FINAL QUESTION: "{query}""#
    )
}

/// Follow-up question about one point of the analysis
pub fn build_point_query(description: &str) -> String {
    format!(
        "Can you give me more details about this point? \"{}\"",
        description
    )
}
