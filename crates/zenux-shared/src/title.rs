//! Chat title heuristic.
//!
//! Derives a short title from the first few user messages of a new chat.
//! Pure text matching; no model call is ever made for this.

use std::collections::HashSet;

use crate::constants::MAX_TITLE_CHARS;

/// Keyword families mapped to fixed titles, checked in order. Order is the
/// tie-break: the payment family must win over the generic AI family when a
/// message mentions both.
const KEYWORD_TITLES: &[(&[&str], &str)] = &[
    (
        &["payment", "bill", "invoice", "transaction", "refund", "paystack", "stripe"],
        "Payment Discussion",
    ),
    (
        &["credit", "credits", "wallet", "balance", "top up", "topup"],
        "Credits & Wallet",
    ),
    (
        &["upgrade", "subscription", "premium", "plan"],
        "Account Upgrade",
    ),
    (
        &["error", "bug", "crash", "broken", "not working"],
        "Troubleshooting",
    ),
    (&["code", "coding", "program", "script", "function"], "Coding Help"),
    (&["write", "writing", "essay", "article", "draft"], "Writing Help"),
    (&["ai", "assistant", "chat", "help", "question"], "AI Assistance"),
];

/// Words dropped from the sentence-extraction fallback.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "i", "im", "me",
    "my", "you", "your", "we", "our", "it", "its", "to", "of", "in", "on",
    "for", "with", "and", "or", "but", "can", "could", "would", "should",
    "do", "does", "did", "how", "what", "when", "where", "why", "please",
    "hi", "hello", "hey", "thanks",
];

/// Suggest a title (at most [`MAX_TITLE_CHARS`] characters) from up to the
/// first three user messages of a chat.
pub fn suggest_title(messages: &[&str]) -> String {
    let combined = messages
        .iter()
        .take(3)
        .map(|m| m.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    // Single-word keywords match whole words only, so "explain" does not
    // trip the "ai" family. Phrases are matched as substrings.
    let words: HashSet<&str> = combined
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    for (keywords, title) in KEYWORD_TITLES {
        let hit = keywords.iter().any(|k| {
            if k.contains(' ') {
                combined.contains(k)
            } else {
                words.contains(k)
            }
        });
        if hit {
            return (*title).to_string();
        }
    }

    if let Some(title) = title_from_first_sentence(&combined) {
        return title;
    }

    format!("Chat {}", chrono::Local::now().format("%H:%M"))
}

/// Fallback: first sentence, stop words removed, up to three tokens,
/// title-cased, truncated with an ellipsis if needed.
fn title_from_first_sentence(text: &str) -> Option<String> {
    let sentence = text.split(['.', '!', '?', '\n']).next()?.trim();

    let tokens: Vec<&str> = sentence
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .take(3)
        .collect();

    if tokens.is_empty() {
        return None;
    }

    let title = tokens
        .iter()
        .map(|w| title_case(w))
        .collect::<Vec<_>>()
        .join(" ");

    Some(truncate_chars(title, MAX_TITLE_CHARS))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn truncate_chars(s: String, max: usize) -> String {
    if s.chars().count() <= max {
        return s;
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_keyword_wins_over_sentence_fallback() {
        let title = suggest_title(&["Can you help me with a payment issue?"]);
        assert_eq!(title, "Payment Discussion");
    }

    #[test]
    fn payment_family_outranks_generic_ai_family() {
        // "help" is in the AI family, but payment is checked first.
        let title = suggest_title(&["help with my bill"]);
        assert_eq!(title, "Payment Discussion");
    }

    #[test]
    fn keyword_match_requires_whole_words() {
        // "explain" contains "ai" as a substring; it must not match.
        let title = suggest_title(&["explain recursion basics"]);
        assert_eq!(title, "Explain Recursion Basics");
    }

    #[test]
    fn sentence_fallback_title_cases_three_tokens() {
        let title = suggest_title(&["xyz qwerty zzz"]);
        assert_eq!(title, "Xyz Qwerty Zzz");
    }

    #[test]
    fn fallback_takes_first_sentence_only() {
        let title = suggest_title(&["quantum flux capacitors. also payments"]);
        assert_eq!(title, "Quantum Flux Capacitors");
    }

    #[test]
    fn stop_words_are_dropped() {
        let title = suggest_title(&["how do i configure nginx proxies"]);
        assert_eq!(title, "Configure Nginx Proxies");
    }

    #[test]
    fn long_titles_are_truncated_with_ellipsis() {
        let long = "abcdefghijklmnopqrstuvwx abcdefghijklmnopqrstuvwx abc";
        let title = suggest_title(&[long]);
        assert!(title.chars().count() <= MAX_TITLE_CHARS);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn empty_input_falls_back_to_clock_title() {
        let title = suggest_title(&["??? !!!"]);
        assert!(title.starts_with("Chat "));
    }

    #[test]
    fn only_first_three_messages_considered() {
        let title = suggest_title(&["xyz", "qwerty", "zzz", "payment"]);
        assert_eq!(title, "Xyz Qwerty Zzz");
    }
}
