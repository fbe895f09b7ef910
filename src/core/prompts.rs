//! System-prompt builders for the AI provider
//!
//! The translate prompt demands strict JSON output so the response can be
//! parsed into a typed outcome; the chat prompt scopes the assistant to
//! Moroccan topics and sets the reply language.

use crate::core::models::TranslateQuery;

/// System instruction for translate and dictionary requests
pub const TRANSLATE_SYSTEM_PROMPT: &str = "\
You are a Moroccan Darija native speaker and professional translator.
Return ONLY valid JSON, with no markdown and no text outside the JSON.

In translate mode return exactly:
{\"translation\": \"...\", \"transliteration\": \"...\", \"pronunciation\": \"...\", \"notes\": \"short cultural explanation\"}

In dictionary mode return exactly:
{\"word\": \"...\", \"part_of_speech\": \"...\", \"meanings\": [{\"sense\": \"...\", \"english\": \"...\", \"darija_example\": \"...\", \"english_example\": \"...\"}], \"synonyms\": [\"...\"], \"notes\": \"short cultural usage\"}

Rules:
- The output shape must match the requested mode, never the other shape.
- Darija output must be in Latin script only (3, 7, 9, kh, gh, sh...).
- Interpret Darija slang the way a native speaker would, never literally.";

/// User message carrying the request fields alongside the canonical text
pub fn translate_user_message(query: &TranslateQuery, canonical: &str) -> String {
    format!(
        "mode: {}\nsourceLang: {}\ntargetLang: {}\noriginal_text: {}\ncanonical_text: {}",
        query.mode,
        query.source_lang(),
        query.target_lang(),
        query.text,
        canonical
    )
}

/// System instruction for the chat assistant, parameterized by reply language
pub fn chat_system_prompt(lang: &str) -> String {
    format!(
        "You are LhajjaAI, an assistant that only discusses Morocco: Darija, \
culture, food, cities, lifestyle, traditions and Moroccan expressions.\n\
Reply in the language with code '{}' unless the user asks for another one.\n\
Understand Darija slang exactly like a native Moroccan and never interpret \
it literally. Keep responses concise and relevant to Moroccan culture. If \
asked about anything non-Moroccan, say you can only answer questions about \
Morocco and Darija. No medical, legal, or professional advice.",
        lang
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_user_message_fields() {
        let query = TranslateQuery::new("  Hello!! ");
        let message = translate_user_message(&query, "hello");
        assert!(message.contains("mode: translate"));
        assert!(message.contains("sourceLang: auto"));
        assert!(message.contains("targetLang: darija"));
        assert!(message.contains("canonical_text: hello"));
    }

    #[test]
    fn test_chat_prompt_carries_language() {
        assert!(chat_system_prompt("fr").contains("'fr'"));
    }
}
