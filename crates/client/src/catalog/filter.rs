//! In-memory product filtering.
//!
//! Category filtering runs first, then the text search over what remains.

use std::collections::BTreeMap;

use crate::models::Product;

/// Products whose category tag equals `category`, ignoring case.
pub fn by_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.in_category(category)).collect()
}

/// Products whose name, description or category contains `query`, ignoring
/// case. A blank query matches everything.
pub fn search<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    apply(products, None, query)
}

/// Category filter (if any) followed by text search.
pub fn apply<'a>(products: &'a [Product], category: Option<&str>, query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    products
        .iter()
        .filter(|p| category.is_none_or(|c| p.in_category(c)))
        .filter(|p| needle.is_empty() || p.matches_lowercase(&needle))
        .collect()
}

/// Distinct non-empty category tags, sorted ignoring case.
///
/// Tags differing only in case are one category, listed under the first
/// spelling seen.
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for tag in products.iter().map(|p| p.category.trim()) {
        if !tag.is_empty() {
            seen.entry(tag.to_lowercase()).or_insert(tag);
        }
    }
    seen.into_values().map(str::to_string).collect()
}
