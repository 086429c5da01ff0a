//! Resolve loosely typed setting names to attribute keys.

use crate::definition::AttributeDefinition;
use crate::table::{AttributeTable, normalize_key};
use std::cmp::Ordering;

/// Most candidates returned for an ambiguous substring query.
const MAX_SUBSTRING_MATCHES: usize = 10;
/// Most candidates returned for a fuzzy query.
const MAX_FUZZY_MATCHES: usize = 5;
/// Minimum Jaro-Winkler similarity for a fuzzy candidate.
const FUZZY_CUTOFF: f64 = 0.85;

/// Outcome of a setting-name lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingMatch<'a> {
    /// Set when the query identifies exactly one attribute
    pub key: Option<&'a str>,
    /// The attribute, or the candidates to choose from
    pub candidates: Vec<&'a AttributeDefinition>,
}

impl<'a> SettingMatch<'a> {
    fn none() -> Self {
        Self {
            key: None,
            candidates: Vec::new(),
        }
    }

    fn from_candidates(candidates: Vec<&'a AttributeDefinition>) -> Self {
        let key = match candidates.as_slice() {
            [only] => Some(only.key.as_str()),
            _ => None,
        };
        Self { key, candidates }
    }
}

/// Find the attribute a user meant by `query`.
///
/// Tried in order: normalized key, exact label, substring of key or label,
/// then fuzzy similarity on labels and finally on keys.
pub fn resolve_setting<'a>(table: &'a AttributeTable, query: &str) -> SettingMatch<'a> {
    let query = query.trim();
    if query.is_empty() {
        return SettingMatch::none();
    }

    let exact = table
        .key_for_normalized(query)
        .or_else(|| table.key_for_label(query))
        .and_then(|key| table.get(key));
    if let Some(attr) = exact {
        return SettingMatch::from_candidates(vec![attr]);
    }

    let lower = query.to_lowercase();
    let substring: Vec<&AttributeDefinition> = table
        .iter()
        .filter(|attr| attr.key.to_lowercase().contains(&lower) || attr.label.to_lowercase().contains(&lower))
        .take(MAX_SUBSTRING_MATCHES)
        .collect();
    if !substring.is_empty() {
        return SettingMatch::from_candidates(substring);
    }

    let by_label = fuzzy(&lower, table.labels().map(|(label, key)| (label.to_string(), key)));
    if !by_label.is_empty() {
        return SettingMatch::from_candidates(resolve_keys(table, by_label));
    }

    let normalized = normalize_key(query);
    let by_key = fuzzy(&normalized, table.iter().map(|attr| (attr.key.to_lowercase(), attr.key.as_str())));
    SettingMatch::from_candidates(resolve_keys(table, by_key))
}

fn fuzzy<'a>(query: &str, haystack: impl Iterator<Item = (String, &'a str)>) -> Vec<&'a str> {
    let mut scored: Vec<(f64, &'a str)> = haystack
        .map(|(text, key)| (strsim::jaro_winkler(query, &text), key))
        .filter(|(score, _)| *score >= FUZZY_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().take(MAX_FUZZY_MATCHES).map(|(_, key)| key).collect()
}

fn resolve_keys<'a>(table: &'a AttributeTable, keys: Vec<&str>) -> Vec<&'a AttributeDefinition> {
    keys.into_iter().filter_map(|key| table.get(key)).collect()
}
