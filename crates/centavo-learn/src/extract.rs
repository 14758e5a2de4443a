//! Word extraction from transaction descriptions.
//!
//! Turns a raw description string into the set of candidate tokens the
//! learning engine tracks weights for.
//!
//! # Rules
//!
//! 1. Digits and currency/punctuation symbols are removed
//! 2. Text is lowercased and split on whitespace
//! 3. Stopwords are dropped (prepositions, common transaction verbs such as
//!    "bought"/"paid", currency-unit words)
//! 4. Only tokens of length >= 3 are kept
//! 5. Duplicates within one description collapse (result is a set)
//!
//! A description containing only numbers and stopwords yields the empty
//! set — a legitimate no-op for the caller, not an error.
//!
//! # Examples
//!
//! ```
//! use centavo_learn::extract;
//!
//! let tokens = extract("coffee starbucks 350");
//! assert!(tokens.contains("coffee"));
//! assert!(tokens.contains("starbucks"));
//! assert_eq!(tokens.len(), 2);
//! ```

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use centavo_core::defaults::MIN_TOKEN_LEN;

/// Anything that is not a letter or whitespace: digits, currency symbols,
/// punctuation. Replaced by a space so "coffee,bread" splits cleanly.
static NON_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\s]+").unwrap());

/// Tokens that carry no category signal. Prepositions and articles shorter
/// than three characters are already dropped by the length filter.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Prepositions, articles, conjunctions
        "the", "and", "for", "with", "from", "into", "onto", "over", "under", "near", "between",
        "about", "after", "before", "during", "via", "per", "this", "that",
        // Common transaction verbs and noise
        "bought", "buy", "buying", "paid", "pay", "paying", "payment", "purchase", "purchased",
        "spent", "spend", "order", "ordered", "transfer", "card", "cash", "total", "amount",
        // Currency-unit words
        "usd", "eur", "gbp", "rub", "uah", "kzt", "jpy", "dollar", "dollars", "euro", "euros",
        "pound", "pounds", "ruble", "rubles", "rouble", "roubles", "hryvnia", "tenge", "yen",
        "cent", "cents",
    ]
    .into_iter()
    .collect()
});

/// Extract candidate tokens from a transaction description.
///
/// Returns a deduplicated, lowercase set. See the module docs for the full
/// rule list.
pub fn extract(description: &str) -> HashSet<String> {
    let cleaned = NON_LETTER.replace_all(description, " ");

    cleaned
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .filter(|token| !STOPWORDS.contains(token.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_digits_and_currency() {
        let tokens = extract("coffee starbucks 350 $12.50");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("coffee"));
        assert!(tokens.contains("starbucks"));
    }

    #[test]
    fn test_lowercases() {
        let tokens = extract("STARBUCKS Coffee");
        assert!(tokens.contains("starbucks"));
        assert!(tokens.contains("coffee"));
    }

    #[test]
    fn test_drops_short_tokens() {
        let tokens = extract("to go at no tea");
        assert_eq!(tokens.len(), 1);
        assert!(tokens.contains("tea"));
    }

    #[test]
    fn test_drops_stopwords() {
        let tokens = extract("bought coffee for the office with usd");
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("coffee"));
        assert!(tokens.contains("office"));
    }

    #[test]
    fn test_only_numbers_and_stopwords_yield_empty_set() {
        assert!(extract("350 1200").is_empty());
        assert!(extract("paid 40 dollars").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let tokens = extract("coffee coffee COFFEE");
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn test_punctuation_splits_tokens() {
        let tokens = extract("coffee,bread;milk");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.contains("bread"));
    }

    #[test]
    fn test_unicode_letters_survive() {
        let tokens = extract("кофе пекарня 350");
        assert!(tokens.contains("кофе"));
        assert!(tokens.contains("пекарня"));
    }
}
