//! Prompt construction for the classification and generation stages.

/// System prompt shared by both LLM calls.
pub const SYSTEM_PROMPT: &str = "You are a customer service AI for an e-commerce company. \
     Be professional, empathetic, and helpful.";

/// Email bodies are truncated before prompting to keep token usage bounded.
const MAX_EMAIL_CHARS: usize = 2000;

/// Build the user prompt for the classification call.
pub fn build_classification_prompt(email: &str) -> String {
    let email_preview: String = email.chars().take(MAX_EMAIL_CHARS).collect();
    format!(
        "Classify this customer email:\n\n\
         {email_preview}\n\n\
         Categories: product_return, refund_request, product_damage, delivery_issue, \
         product_inquiry, warranty_claim, general, other\n\n\
         Respond with ONLY a JSON object:\n\
         {{\"query_type\": \"...\", \"confidence\": 0.0, \"keywords\": [\"...\"], \
         \"requires_lookup\": false, \"reasoning\": \"...\"}}"
    )
}

/// Build the user prompt for the response-generation call.
pub fn build_generation_prompt(email: &str, policy_info: &str) -> String {
    let email_preview: String = email.chars().take(MAX_EMAIL_CHARS).collect();
    format!(
        "Generate a professional response.\n\n\
         Email: {email_preview}\n\
         Policy Info: {policy_info}\n\n\
         Create a helpful response with greeting, acknowledgment, solution, and action items."
    )
}
