use crate::types::InterestConfig;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Static interest table, embedded at build time and parsed once. Maps a
/// normalized interest string to chart category tokens and/or search
/// keyword groups. Read-only for the process lifetime.
static INTEREST_TABLE: Lazy<HashMap<String, InterestConfig>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../assets/interests.json"))
        .expect("embedded interest table is valid JSON")
});

/// Outcome of resolving a batch of user interests. Category tokens carry
/// set semantics (insertion-ordered, deduplicated); search interests keep
/// first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ResolvedInterests {
    pub category_tokens: Vec<String>,
    pub search_interests: Vec<String>,
}

impl ResolvedInterests {
    pub fn is_empty(&self) -> bool {
        self.category_tokens.is_empty() && self.search_interests.is_empty()
    }

    pub fn source_count(&self) -> usize {
        self.category_tokens.len() + self.search_interests.len()
    }
}

/// Maps free-text interests to category tokens and search interests.
/// Unresolved interests are skipped silently. An entry that defines search
/// keywords is always classified as a search interest, even when it also
/// lists categories.
pub fn resolve(interests: &[String]) -> ResolvedInterests {
    resolve_with(&INTEREST_TABLE, interests)
}

fn resolve_with(
    table: &HashMap<String, InterestConfig>,
    interests: &[String],
) -> ResolvedInterests {
    let mut resolved = ResolvedInterests::default();

    for interest in interests {
        let normalized = interest.trim().to_lowercase();
        let Some(config) = table.get(&normalized) else {
            continue;
        };

        if config.search_keywords.is_some() {
            // Deferred resolution: the keyword list itself is looked up
            // again at fetch time via `keywords_for`.
            if !resolved.search_interests.contains(&normalized) {
                resolved.search_interests.push(normalized);
            }
        } else if let Some(categories) = &config.categories {
            for token in categories {
                if !resolved.category_tokens.contains(token) {
                    resolved.category_tokens.push(token.clone());
                }
            }
        }
    }

    resolved
}

/// Keyword group for a previously resolved search interest.
pub fn keywords_for(interest: &str) -> Option<&'static [String]> {
    INTEREST_TABLE
        .get(interest.trim().to_lowercase().as_str())?
        .search_keywords
        .as_deref()
}
