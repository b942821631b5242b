use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};
use common::error::AppError;
use serde_json::Value;

use crate::scoring::RankedItem;

/// Upper bound on ranked items forwarded as answer context.
pub const ANSWER_CONTEXT_ITEMS: usize = 3;

/// Served instead of an answer when retrieval or generation fails.
pub const FALLBACK_ANSWER: &str = "Sorry, I could not look that up right now. \
    Please try again in a little while, or browse the published content directly.";

const ANSWER_SYSTEM_PROMPT: &str = "You answer questions about a content library. \
    Use only the provided context items. Keep answers short and factual. \
    If the context does not cover the question, say so and point the reader \
    at the library instead of guessing.";

/// Convert ranked results to JSON format for LLM context
pub fn items_to_chat_context(items: &[RankedItem]) -> Value {
    fn round_score(value: f32) -> f64 {
        (f64::from(value) * 1000.0).round() / 1000.0
    }

    serde_json::json!(items
        .iter()
        .take(ANSWER_CONTEXT_ITEMS)
        .map(|ranked| {
            serde_json::json!({
                "title": ranked.item.title,
                "slug": ranked.item.slug,
                "category": ranked.item.category,
                "excerpt": ranked.item.excerpt,
                "score": round_score(ranked.score),
            })
        })
        .collect::<Vec<_>>())
}

pub fn create_user_message(context_json: &Value, query: &str) -> String {
    format!(
        r"
        Context Information:
        ==================
        {context_json}

        User Question:
        ==================
        {query}
        "
    )
}

pub fn create_chat_request(
    user_message: String,
    model: &str,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([
            ChatCompletionRequestSystemMessage::from(ANSWER_SYSTEM_PROMPT).into(),
            ChatCompletionRequestUserMessage::from(user_message).into(),
        ])
        .build()
}

pub fn process_llm_response(response: CreateChatCompletionResponse) -> Result<String, AppError> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .ok_or(AppError::Answer(
            "No content found in LLM response".to_string(),
        ))
}

/// Generates an answer to `query` grounded in the top ranked items.
pub async fn generate_answer(
    client: &Client<OpenAIConfig>,
    model: &str,
    query: &str,
    items: &[RankedItem],
) -> Result<String, AppError> {
    let context_json = items_to_chat_context(items);
    let request = create_chat_request(create_user_message(&context_json, query), model)
        .map_err(|err| AppError::Answer(err.to_string()))?;

    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|err| AppError::Answer(err.to_string()))?;

    process_llm_response(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::storage::types::content_item::ContentItem;
    use common::utils::text::sha256_hex;

    fn ranked(id: &str, score: f32) -> RankedItem {
        let now = Utc::now();
        RankedItem {
            score,
            item: ContentItem {
                id: id.to_string(),
                created_at: now,
                updated_at: now,
                external_id: id.to_string(),
                title: format!("Title {id}"),
                slug: format!("slug-{id}"),
                excerpt: "Excerpt.".to_string(),
                body: String::new(),
                category: "news".to_string(),
                tags: vec![],
                priority: 0,
                embedding: None,
                content_hash: sha256_hex(id),
                synced_at: now,
            },
        }
    }

    #[test]
    fn test_context_takes_at_most_three_items() {
        let items = vec![
            ranked("1", 0.9),
            ranked("2", 0.8),
            ranked("3", 0.7),
            ranked("4", 0.6),
        ];

        let context = items_to_chat_context(&items);
        let entries = context.as_array().expect("Context should be an array");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["title"], "Title 1");
        assert_eq!(entries[0]["score"], 0.9);
    }

    #[test]
    fn test_user_message_carries_context_and_query() {
        let context = items_to_chat_context(&[ranked("1", 0.5)]);
        let message = create_user_message(&context, "what changed?");

        assert!(message.contains("what changed?"));
        assert!(message.contains("Title 1"));
    }

    #[test]
    fn test_process_llm_response_extracts_first_choice() {
        let response: CreateChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "created": 0,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "All clear." },
                "finish_reason": "stop"
            }]
        }))
        .expect("Failed to build response fixture");

        let answer = process_llm_response(response).expect("Failed to extract answer");
        assert_eq!(answer, "All clear.");
    }

    #[test]
    fn test_process_llm_response_without_choices_is_an_error() {
        let response: CreateChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "cmpl-2",
            "object": "chat.completion",
            "created": 0,
            "model": "test-model",
            "choices": []
        }))
        .expect("Failed to build response fixture");

        assert!(matches!(
            process_llm_response(response),
            Err(AppError::Answer(_))
        ));
    }
}
