//! Keyword classifier for the canned support replies.
//!
//! Rules are checked in table order against the lowercased input and the
//! first rule with a matching keyword wins. Matching is plain substring
//! containment, so "hi" also matches inside longer words.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    Greeting,
    EnvironmentalData,
    IssueReporting,
    ContactChannels,
    WhatsAppPrompt,
    Acknowledgement,
    Fallback,
}

impl Reply {
    pub fn text(self) -> &'static str {
        match self {
            Reply::Greeting => "Hello! Welcome to CityGuardian. How can I assist you today?",
            Reply::EnvironmentalData =>
                "You can check real-time environmental data on our /environmental page. Would you like me to help you with anything specific?",
            Reply::IssueReporting =>
                "To report an issue, please visit our citizen dashboard or contact us via WhatsApp for urgent matters.",
            Reply::ContactChannels =>
                "You can reach us via:\n📱 WhatsApp: Click the button below\n📧 Email: support@cityguardian.com\n📞 Phone: Contact via Twilio",
            Reply::WhatsAppPrompt =>
                "Click the 'Contact on WhatsApp' button below to chat with us directly!",
            Reply::Acknowledgement => "You're welcome! Feel free to reach out anytime. 😊",
            Reply::Fallback =>
                "I'm here to help! You can ask me about environmental monitoring, reporting issues, or contact our support team via WhatsApp or phone.",
        }
    }
}

struct Rule {
    keywords: &'static [&'static str],
    reply: Reply,
}

// Order encodes precedence.
const RULES: &[Rule] = &[
    Rule { keywords: &["hello", "hi", "hey"], reply: Reply::Greeting },
    Rule { keywords: &["environmental", "sensor", "air quality"], reply: Reply::EnvironmentalData },
    Rule { keywords: &["report", "issue", "problem"], reply: Reply::IssueReporting },
    Rule { keywords: &["contact", "support", "help"], reply: Reply::ContactChannels },
    Rule { keywords: &["whatsapp"], reply: Reply::WhatsAppPrompt },
    Rule { keywords: &["thank"], reply: Reply::Acknowledgement },
];

pub fn classify(input: &str) -> Reply {
    let normalized = input.to_lowercase();
    RULES.iter()
        .find(|rule| rule.keywords.iter().any(|kw| normalized.contains(kw)))
        .map(|rule| rule.reply)
        .unwrap_or(Reply::Fallback)
}

pub fn reply_for(input: &str) -> &'static str {
    classify(input).text()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_keywords_anywhere_any_case() {
        for input in ["Hello there", "oh HI", "Hey!", "well, hey you", "sHiNy"] {
            assert_eq!(classify(input), Reply::Greeting, "input: {input}");
        }
    }

    #[test]
    fn greeting_beats_later_rules() {
        assert_eq!(classify("hello, I have a problem with a sensor"), Reply::Greeting);
        assert_eq!(classify("Hey, thanks for the support"), Reply::Greeting);
    }

    #[test]
    fn each_rule_is_reachable() {
        assert_eq!(classify("Where is the air quality data?"), Reply::EnvironmentalData);
        assert_eq!(classify("I want to report a problem"), Reply::IssueReporting);
        assert_eq!(classify("Can you help me?"), Reply::ContactChannels);
        assert_eq!(classify("Use WhatsApp"), Reply::WhatsAppPrompt);
        assert_eq!(classify("Thanks!"), Reply::Acknowledgement);
        assert_eq!(classify("random gibberish"), Reply::Fallback);
    }

    #[test]
    fn earlier_rule_wins_between_middle_rules() {
        assert_eq!(classify("sensor issue"), Reply::EnvironmentalData);
        assert_eq!(classify("contact me on whatsapp"), Reply::ContactChannels);
        assert_eq!(classify("Thank you for your help"), Reply::ContactChannels);
    }

    #[test]
    fn reply_for_returns_rule_text() {
        assert_eq!(reply_for("random gibberish"), Reply::Fallback.text());
        assert!(reply_for("report").starts_with("To report an issue"));
    }
}
