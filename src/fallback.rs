// Rule-based fallback responder used when the Groq API is unavailable

/// A single fallback rule: if any trigger appears in the (lowercased) input,
/// the reply is returned.
struct FallbackRule {
    triggers: &'static [&'static str],
    reply: &'static str,
}

/// Ordered rule table; first match wins, so more specific rules
/// (e.g. "karnataka") must precede generic ones (e.g. "what").
static RULES: &[FallbackRule] = &[
    FallbackRule {
        triggers: &["pm of india", "prime minister of india", "who is pm"],
        reply: "The Prime Minister of India is Narendra Modi. He has been serving as the PM since 2014 and was re-elected in 2019.",
    },
    FallbackRule {
        triggers: &["karnataka", "bangalore", "bengaluru"],
        reply: "Karnataka is a state in southern India. Its capital is Bengaluru (formerly Bangalore). It's known for its IT industry, rich culture, and historical sites like Hampi. The state is famous for its cuisine, classical dance forms, and the Kannada language.",
    },
    FallbackRule {
        triggers: &["hello", "hi", "hey"],
        reply: "Hello! I'm an AI chatbot. How can I help you today?",
    },
    FallbackRule {
        triggers: &["how are you", "how do you do"],
        reply: "I'm doing well, thank you for asking! I'm here to help you with any questions you might have.",
    },
    FallbackRule {
        triggers: &["what are you", "who are you"],
        reply: "I'm an AI chatbot designed to help answer questions and have conversations. I can provide information on various topics!",
    },
    FallbackRule {
        triggers: &["what", "tell me about"],
        reply: "I'd be happy to help you with that question! However, I'm currently using a fallback system. Could you be more specific about what you'd like to know?",
    },
    FallbackRule {
        triggers: &["who"],
        reply: "I can help with information about people! Could you tell me more specifically who you're asking about?",
    },
    FallbackRule {
        triggers: &["when"],
        reply: "I can help with information about dates and times! What specific event or time period are you asking about?",
    },
    FallbackRule {
        triggers: &["where"],
        reply: "I can help with information about places! What location are you asking about?",
    },
];

/// Default reply when no rule matches
const DEFAULT_REPLY: &str =
    "Thanks for your message! I'm here to help. Could you tell me more about what you'd like to know?";

/// Produce a canned reply for the given user message.
///
/// Case-insensitive substring matching against the ordered rule table;
/// total and deterministic, never fails.
pub fn respond(text: &str) -> &'static str {
    let lower = text.to_lowercase();

    RULES
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| lower.contains(t)))
        .map(|rule| rule.reply)
        .unwrap_or(DEFAULT_REPLY)
}
