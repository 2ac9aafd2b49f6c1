//! Prompt templates for the Medicare assistant
//!
//! Every template opens with the same assistant persona. The classifier
//! prompt asks for JSON; the others ask for short plain-text replies.

use crate::intent::{prompt_instructions, suggestions, IntentName};
use crate::llm::{LlmMessage, MessageRole};
use crate::session::{ChatMessage, Role, Slots};
use regex::Regex;
use serde_json::Value;
use std::fmt::Write;
use std::sync::OnceLock;

const PERSONA: &str = "You are a helpful and knowledgeable Medicare chatbot.";

const PLAIN_TEXT_RULES: &str = "Remember:
- Respond ONLY with plain text
- Do NOT include JSON, markdown formatting, or structured data
- Do NOT use code blocks, bullet points, or numbered lists
- Write in natural, conversational language";

/// Collapse runs of three or more newlines to a blank line and trim
pub fn format_prompt(prompt: &str) -> String {
    static BLANK_RUNS: OnceLock<Option<Regex>> = OnceLock::new();
    match BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").ok()) {
        Some(re) => re.replace_all(prompt, "\n\n").trim().to_string(),
        None => prompt.trim().to_string(),
    }
}

fn describe_slots(slots: &Slots) -> String {
    slots
        .iter()
        .filter_map(|(name, _)| slots.text(name).map(|value| format!("{name}: {value}")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// System prompt for the classifier.
///
/// The user's message travels as the final chat turn, so only the running
/// context goes here.
pub fn intent_detection(current_intent: Option<IntentName>, collected: &Slots) -> String {
    let intents = prompt_instructions(true).join("\n");

    let mut context = String::new();
    if let Some(intent) = current_intent {
        let _ = writeln!(context, "The conversation so far has been about: {intent}");
    }
    let details = describe_slots(collected);
    if !details.is_empty() {
        let _ = writeln!(context, "Details the user already provided: {details}");
    }
    if !context.is_empty() {
        context.push_str(
            "If the latest message continues that request, keep the same intent and only extract the new details.\n",
        );
    }

    let prompt = format!(
        r#"
{PERSONA} Your task is to analyze the user's latest message
and determine their intent and any relevant details they've provided.

AVAILABLE INTENTS:
{intents}

{context}

RESPONSE REQUIREMENTS:
You MUST respond with a JSON object containing:
{{
  "intent": string,      // The most likely intent from the Available Intents, or "Unknown" if unclear
  "confidence": number,  // Your confidence in this intent (0.0 to 1.0)
  "slots": {{            // Any relevant details extracted from the message
    "key": "value"       // Key-value pairs of extracted information
  }}
}}

EXAMPLES:

Input: "How much will my Lipitor cost?"
Output: {{"intent": "GetSingleDrugPrice", "confidence": 0.95, "slots": {{"drug_name": "Lipitor"}}}}

Input: "I need to find a cardiologist near me"
Output: {{"intent": "FindProvider", "confidence": 0.9, "slots": {{"provider_type": "cardiologist", "location": "near me"}}}}

Input: "Why did the chicken cross the road?"
Output: {{"intent": "Unknown", "confidence": 0.1}}

IMPORTANT:
- You MUST respond with ONLY a valid JSON object
- Do NOT include any explanatory text before or after the JSON
- If you're unsure about the intent, respond with the "Unknown" intent with low confidence
- Only extract slots that are explicitly mentioned in the conversation
"#
    );

    format_prompt(&prompt)
}

/// Ask the user to confirm a low-confidence intent
pub fn clarification(
    suspected_intent: &str,
    confidence: f64,
    extracted: &Slots,
    original_message: &str,
) -> String {
    // Display only; confidence is already clamped to [0, 1]
    #[allow(clippy::cast_possible_truncation)]
    let percentage = (confidence * 100.0).round() as i64;
    let details = describe_slots(extracted);
    let understood = if details.is_empty() {
        String::new()
    } else {
        format!("You understood these details: {details}")
    };

    let prompt = format!(
        r#"
{PERSONA} You think you understand what the user is asking about,
but you want to make sure you get it exactly right.

You think they're asking about: {suspected_intent}
Your confidence level: {percentage}%

User's message: "{original_message}"

{understood}

Please help the user by:
1. Acknowledging their request in a friendly, empathetic way
2. Briefly confirming what you think they're asking about
3. Asking for clarification on any unclear details
4. Offering to help once you have the right information

EXAMPLES:

For drug price query:
"I think you're asking about medication costs. If this is correct, could you please give me the drug name, dosage and how often you'll be taking it?"

For provider search:
"You might be asking about health care providers in your area. Is this correct? If so, could you please give me the type of provider you're looking for and your preferred location?"

{PLAIN_TEXT_RULES}
- Keep your response concise (2-3 sentences)
"#
    );

    format_prompt(&prompt)
}

/// Ask for the required details the user has not given yet
pub fn missing_information(topic: &str, provided: &[String], missing: &[String]) -> String {
    let provided = provided.join(", ");
    let missing = missing.join(", ");

    let prompt = format!(
        r#"
{PERSONA} You understand the user is asking about {topic},
and you want to make sure you have all the information needed to help them accurately.

You already have this information: {provided}
You need a bit more information about: {missing}

RESPONSE GUIDELINES:
1. Acknowledge their request positively
2. Explain why the additional information is important
3. Ask for the missing details in a natural, conversational way
4. Keep the tone friendly and supportive

EXAMPLES:

For drug price with missing dosage and frequency:
"I understand you're interested in the cost of Lipitor. What dosage have you been prescribed and how often will you be taking it?"

For provider search with missing location:
"I can help you find a specialist in your area. What is your preferred location?"

{PLAIN_TEXT_RULES}
- Keep your response focused and concise (2-3 sentences)
"#
    );

    format_prompt(&prompt)
}

/// Steer an unclassifiable message back to what the bot supports
pub fn fallback(user_message: &str, suggested_actions: &[&str]) -> String {
    let defaults;
    let actions = if suggested_actions.is_empty() {
        defaults = suggestions();
        defaults.as_slice()
    } else {
        suggested_actions
    };
    let actions = actions
        .iter()
        .map(|a| format!("- {a}"))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        r#"
{PERSONA} You want to make sure you understand the user's needs correctly.

User's message: "{user_message}"

RESPONSE GUIDELINES:
1. Acknowledge their message empathetically
2. Explain that you want to help but need more clarity
3. Suggest specific ways you can assist them from the list of available intents
4. You may rephrase them, but do not suggest intents that are not listed

AVAILABLE INTENTS:
{actions}

{PLAIN_TEXT_RULES}
- Keep your response focused and concise (3-4 sentences)
"#
    );

    format_prompt(&prompt)
}

/// Present a finished answer conversationally
pub fn answer(topic: &str, answer: &Value, additional: &[&str]) -> String {
    let answer_text = match answer {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    let extra = additional
        .iter()
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        r#"
{PERSONA} You have found the definitive answer to the user's question
about {topic}. Present this information in a clear, conversational way that feels natural
in the context of your conversation.

ANSWER TO REFORMAT:
{answer_text}

RESPONSE GUIDELINES:
- Present the information accurately and concisely
- Do not say things like "I found the information you were looking for"
- Use a friendly tone. You may include paragraphs or bullet points.
- If the answer contains technical terms, explain them in simple language
- Use ONLY the information provided; do NOT add any additional details or assumptions
- Do not repeat the same information
{extra}
"#
    );

    format_prompt(&prompt)
}

fn message_role(role: Role) -> MessageRole {
    match role {
        Role::User => MessageRole::User,
        Role::Assistant => MessageRole::Assistant,
    }
}

/// Turn session history plus the new input into a chat transcript the
/// Messages API accepts.
///
/// The result starts with a user turn and alternates strictly: leading
/// assistant turns are dropped, consecutive turns of one role are joined
/// with a blank line, and `user_input` becomes (or extends) the final user
/// turn.
pub fn build_messages(history: &[ChatMessage], user_input: &str) -> Vec<LlmMessage> {
    let mut messages: Vec<LlmMessage> = Vec::with_capacity(history.len() + 1);

    let turns = history
        .iter()
        .map(|m| (message_role(m.role), m.content.as_str()))
        .chain(std::iter::once((MessageRole::User, user_input.trim())));

    for (role, text) in turns {
        if text.is_empty() {
            continue;
        }
        if messages.is_empty() && role == MessageRole::Assistant {
            continue;
        }
        if let Some(last) = messages.last_mut().filter(|m| m.role == role) {
            last.text.push_str("\n\n");
            last.text.push_str(text);
        } else {
            messages.push(LlmMessage {
                role,
                text: text.to_string(),
            });
        }
    }

    messages
}
