//! Heuristic cluster titles built from member titles and term frequencies.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::cluster::ClusterDocument;
use crate::tokenize::tokenize;

/// Entities taken from each member title.
const MAX_ENTITIES_PER_TITLE: usize = 3;

/// Topic templates keyed by keyword patterns (Russian and English stems).
static TEMPLATES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)запуск|релиз|анонс|launch|release|announce", "Product launch"),
        (r"(?i)проблем|баг|ошибк|outage|bug|error", "Technical problems"),
        (r"(?i)стоимост|цен|дорог|price|pricing|cost", "Pricing"),
        (r"(?i)интеграц|api", "Integrations and API"),
        (r"(?i)безопасност|уязвим|security|vulnerab", "Security"),
    ]
    .into_iter()
    .map(|(pattern, template)| (Regex::new(pattern).expect("valid regex"), template))
    .collect()
});

/// Title from the dominant entity and most frequent tokens of the members.
///
/// 1. If any member title contains a capitalized phrase or abbreviation, the
///    first one found leads: `"Entity: a, b, c"`.
/// 2. Otherwise, if a top term matches a topic template: `"Template: a, b"`.
/// 3. Otherwise the three most frequent terms.
pub fn smart_title(docs: &[&ClusterDocument<'_>]) -> String {
    let mut freq: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entities: Vec<String> = Vec::new();

    for doc in docs {
        for token in tokenize(&format!("{} {}", doc.title, doc.text)) {
            match index.get(&token) {
                Some(&slot) => freq[slot].1 += 1,
                None => {
                    index.insert(token.clone(), freq.len());
                    freq.push((token, 1));
                }
            }
        }
        for entity in extract_entities(doc.title) {
            if !entities.contains(&entity) {
                entities.push(entity);
            }
        }
    }

    freq.sort_by(|a, b| b.1.cmp(&a.1));
    let top: Vec<&str> = freq.iter().take(5).map(|(t, _)| t.as_str()).collect();

    if top.is_empty() {
        return "cluster".to_string();
    }

    if let Some(entity) = entities.first() {
        return format!("{entity}: {}", join_top(&top, 3));
    }

    for (pattern, template) in TEMPLATES.iter() {
        if top.iter().any(|term| pattern.is_match(term)) {
            return format!("{template}: {}", join_top(&top, 2));
        }
    }

    join_top(&top, 3)
}

fn join_top(terms: &[&str], n: usize) -> String {
    terms.iter().take(n).copied().collect::<Vec<_>>().join(", ")
}

/// Capitalized word runs, then all-caps abbreviations; deduplicated.
fn extract_entities(title: &str) -> Vec<String> {
    static CAPITALIZED_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b[A-ZА-ЯЁ][a-zа-яё]+(?:\s+[A-ZА-ЯЁ][a-zа-яё]+)*\b").expect("valid regex")
    });
    static ABBR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b[A-ZА-ЯЁ]{2,}\b").expect("valid regex"));

    let mut found: Vec<String> = Vec::new();
    let matches = CAPITALIZED_RE
        .find_iter(title)
        .chain(ABBR_RE.find_iter(title))
        .map(|m| m.as_str().to_string());
    for entity in matches {
        if !found.contains(&entity) {
            found.push(entity);
        }
    }
    found.truncate(MAX_ENTITIES_PER_TITLE);
    found
}
