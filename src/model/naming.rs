//! Naming helpers for derived accessor names.
//!
//! Uses the `inflector` crate with handling for irregular plurals that show up
//! in entity names.

use inflector::Inflector;

/// Irregular plurals that inflector gets wrong for entity names.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("analysis", "analyses"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

/// Pluralize a word, keeping the case of its first letter.
///
/// # Examples
/// ```ignore
/// assert_eq!(pluralize("Order"), "Orders");
/// assert_eq!(pluralize("Category"), "Categories");
/// assert_eq!(pluralize("Person"), "People");
/// ```
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *singular || lower == *plural {
            return match_leading_case(word, plural);
        }
    }

    word.to_plural()
}

fn match_leading_case(original: &str, word: &str) -> String {
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        word.to_string()
    }
}
