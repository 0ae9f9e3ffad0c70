use super::OntologyGraph;
use std::collections::BTreeSet;

/// Domain phrases and the ontology type they point at.
const DOMAIN_TERMS: &[(&str, &str)] = &[
    ("project", "Project"),
    ("projects", "Project"),
    ("designer", "Designer"),
    ("designers", "Designer"),
    ("furniture", "FurnitureItem"),
    ("client", "Client"),
    ("clients", "Client"),
    ("purchasing agent", "PurchasingAgent"),
    ("purchasing", "PurchasingAgent"),
    ("team member", "TeamMember"),
    ("team", "TeamMember"),
    ("image", "ImageAsset"),
    ("images", "ImageAsset"),
    ("room", "RoomType"),
    ("rooms", "RoomType"),
    ("style", "DesignStyle"),
    ("styles", "DesignStyle"),
    ("site", "ProjectSiteNature"),
    ("bid", "BiddingDocument"),
    ("bidding", "BiddingDocument"),
    ("deal", "Deal"),
    ("deals", "Deal"),
    ("design document", "DesignDocument"),
    ("ai module", "AIModule"),
    ("re agent", "REAgent"),
];

/// Naive keyword match of a user message against the domain vocabulary and,
/// when a graph is loaded, the names of its nodes.
pub fn focus_entities(text: &str, graph: Option<&OntologyGraph>) -> Vec<String> {
    let words = words(text);
    let mut entities = BTreeSet::new();

    for (phrase, entity) in DOMAIN_TERMS {
        if contains_phrase(&words, phrase) {
            entities.insert(entity.to_string());
        }
    }

    if let Some(graph) = graph {
        for node in &graph.nodes {
            let phrase = split_camel_case(&node.name);
            if !phrase.is_empty() && contains_phrase(&words, &phrase) {
                entities.insert(node.name.clone());
            }
        }
    }

    entities.into_iter().collect()
}

fn words(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(word, part)| word == part))
}

/// `HotelAurora` -> `hotel aurora`, `AIModule` -> `ai module`.
fn split_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::new();
    for (index, ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            continue;
        }
        if index > 0 && ch.is_uppercase() {
            let prev = chars[index - 1];
            let next_is_lower = chars.get(index + 1).is_some_and(|next| next.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_is_lower) {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
        }
        out.extend(ch.to_lowercase());
    }
    out.trim().to_string()
}
