//! English pluralization for resource names

use once_cell::sync::Lazy;
use regex::Regex;

static UNCOUNTABLE: &[&str] = &[
    "advice",
    "data",
    "equipment",
    "feedback",
    "fish",
    "information",
    "media",
    "metadata",
    "money",
    "news",
    "police",
    "rice",
    "series",
    "sheep",
    "species",
    "deer",
    "software",
    "traffic",
];

static IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("goose", "geese"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("quiz", "quizzes"),
];

/// Suffix rules, most specific first
static RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)(matr|vert|ind)(ix|ex)$", "${1}ices"),
        (r"(?i)(alias|status|bus|campus)$", "${1}es"),
        (r"(?i)(octop|vir|radi|fung|cact)us$", "${1}i"),
        (r"(?i)(ax|test|cris|analys|diagnos|ellips|thes)is$", "${1}es"),
        (r"(?i)([^aeiouy]|qu)y$", "${1}ies"),
        (r"(?i)(x|ch|ss|sh|zz)$", "${1}es"),
        (r"(?i)(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
        (r"(?i)(tomat|potat|ech|her|vet)o$", "${1}oes"),
        (r"(?i)(criteri|phenomen)on$", "${1}a"),
        (r"(?i)(memorand|curricul|medi)um$", "${1}a"),
        (r"(?i)s$", "s"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("valid inflection rule"),
            replacement,
        )
    })
    .collect()
});

/// Pluralize the last word of `word`.
///
/// Irregular nouns and uncountables are honoured; anything unknown gets an
/// `s` appended. Never fails.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_ascii_lowercase();
    let last_word_start = lower
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let last_word = &lower[last_word_start..];

    if UNCOUNTABLE.contains(&last_word) {
        return word.to_string();
    }

    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, plural)| {
        *singular == last_word || *plural == last_word
    }) {
        if *plural == last_word {
            return word.to_string();
        }
        let head = &word[..last_word_start];
        return format!("{head}{}", restore_case(&word[last_word_start..], plural));
    }

    for (rule, replacement) in RULES.iter() {
        if rule.is_match(word) {
            return rule.replace(word, *replacement).into_owned();
        }
    }

    format!("{word}s")
}

/// Keep a leading capital when swapping an irregular form
fn restore_case(original: &str, plural: &str) -> String {
    if original.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        let mut chars = plural.chars();
        chars
            .next()
            .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
            .unwrap_or_default()
    } else {
        plural.to_string()
    }
}
