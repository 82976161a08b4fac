use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The recipe record flowing through the whole pipeline. Wire shape is the
/// camelCase JSON the model is instructed to emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Stable slug of the title, unique within a result set.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Free text, e.g. "30 min".
    #[serde(default)]
    pub prep_time: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Ordered steps; numbering is derived from position at render time.
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Lowercased, hyphen-separated slug of a title ("Mashed Potatoes" ->
/// "mashed-potatoes"). Used to rebuild ids the model left out.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Normalizes raw candidates parsed out of the model response: drops records
/// with no title, rebuilds missing ids as title slugs, and keeps only the
/// first record for any duplicated id. Counts other than the requested 3
/// pass through unchanged.
pub fn normalize_candidates(candidates: Vec<Recipe>) -> Vec<Recipe> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(candidates.len());

    for mut recipe in candidates {
        if recipe.title.trim().is_empty() {
            log::warn!("dropping model recipe with empty title");
            continue;
        }
        if recipe.id.trim().is_empty() {
            recipe.id = slugify(&recipe.title);
        }
        if !seen.insert(recipe.id.clone()) {
            log::warn!("dropping model recipe with duplicate id {:?}", recipe.id);
            continue;
        }
        out.push(recipe);
    }

    out
}
