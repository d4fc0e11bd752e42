use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Reschedule,
    Delete,
    Availability,
    Book,
    Greeting,
    Help,
    Unknown,
}

struct IntentRule {
    intent: Intent,
    keywords: &'static [&'static str],
}

/// Evaluated top to bottom, first matching rule wins. Reschedule and delete
/// come before booking so "reschedule the meeting" is never routed as a new
/// booking, and availability comes before booking so "can I book ..." style
/// availability questions don't create events.
static INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Reschedule,
        keywords: &[
            "reschedule",
            "resched",
            "postpone",
            "move",
            "shift",
            "delay",
            "push back",
            "bring forward",
            "rearrange",
            "change",
        ],
    },
    IntentRule {
        intent: Intent::Delete,
        keywords: &[
            "delete",
            "remove",
            "cancel",
            "discard",
            "drop",
            "erase",
            "get rid of",
            "trash",
            "unschedule",
        ],
    },
    IntentRule {
        intent: Intent::Availability,
        keywords: &[
            "availability",
            "available",
            "free",
            "slots",
            "slot",
            "openings",
            "open times",
            "what's open",
            "check my calendar",
            "do i have time",
            "am i free",
            "can i book",
        ],
    },
    IntentRule {
        intent: Intent::Book,
        keywords: &[
            "book",
            "schedule",
            "meeting",
            "appointment",
            "set up",
            "event",
            "create",
            "plan",
            "arrange",
            "organize",
            "block time",
            "put on calendar",
            "new meeting",
            "add",
            "invite",
        ],
    },
    IntentRule {
        intent: Intent::Greeting,
        keywords: &["hi", "hello", "hey", "good morning", "good afternoon", "good evening"],
    },
    IntentRule {
        intent: Intent::Help,
        keywords: &["help", "what can you do", "who are you", "abilities", "features"],
    },
];

pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();
    for rule in INTENT_RULES {
        if rule
            .keywords
            .iter()
            .any(|kw| contains_at_word_start(&lower, kw))
        {
            return rule.intent;
        }
    }
    Intent::Unknown
}

/// Substring match anchored to a word start, so "hi" does not fire inside
/// "this" but "resched" still matches "rescheduling".
fn contains_at_word_start(text: &str, keyword: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = text[from..].find(keyword) {
        let idx = from + pos;
        let at_boundary = text[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        if at_boundary {
            return true;
        }
        from = idx + 1;
    }
    false
}
