//! String inflection for table-name matching.
//!
//! The partial-name rule needs a table's singular form (`Suppliers` →
//! `supplier`) to test whether a column like `supplier_id` embeds it. Uses
//! the `inflector` crate with a small irregular table for words that show up
//! in schemas and that inflector gets wrong.

use inflector::Inflector;

/// Irregular singular/plural pairs seen in real schema names.
static IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("address", "addresses"),
    ("status", "statuses"),
    ("analysis", "analyses"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("datum", "data"),
    ("medium", "media"),
    ("criterion", "criteria"),
];

/// Singular, lowercase form of a table name.
///
/// Already-singular input passes through unchanged (apart from case).
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULARS {
        if lower == *plural || lower == *singular {
            return (*singular).to_string();
        }
    }

    lower.to_singular()
}

/// Plural, lowercase form of a table name.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULARS {
        if lower == *singular || lower == *plural {
            return (*plural).to_string();
        }
    }

    lower.to_plural()
}
