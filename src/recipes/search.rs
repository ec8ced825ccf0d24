use serde::Deserialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::database::{DatabaseError, Recipe, RecipeFilter, RecipeStore};

/// Query-string arguments accepted by the list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Allowed page sizes, shared with the category listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    pub min: i64,
    pub max: i64,
}

impl PageBounds {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            min: api.per_page_min,
            max: api.per_page_max,
        }
    }

    /// Missing or undersized values become `min`, oversized ones `max`.
    pub fn clamp(&self, per_page: Option<i64>) -> i64 {
        match per_page {
            Some(n) if n > self.max => self.max,
            Some(n) if n >= self.min => n,
            _ => self.min,
        }
    }
}

/// What a list request resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// The scoped collection has no recipes at all
    Empty,
    /// First recipe whose name contains the search term
    Match(Recipe),
    Page(Vec<Recipe>),
}

/// Resolve a list request against an already scoped collection.
///
/// A non-empty `q` returns only the first recipe (in `recipe_id` order)
/// whose name contains it, ignoring case. Without `q`, or when nothing
/// matches, the requested page is returned instead.
pub async fn resolve(
    store: &dyn RecipeStore,
    filter: &RecipeFilter,
    params: &SearchParams,
    bounds: PageBounds,
) -> Result<Listing, DatabaseError> {
    if store.count(filter).await? == 0 {
        return Ok(Listing::Empty);
    }

    let per_page = bounds.clamp(params.per_page);

    if let Some(q) = params.q.as_deref().filter(|q| !q.is_empty()) {
        let recipes = store.select_any(filter).await?;
        if let Some(found) = first_match(&recipes, q) {
            return Ok(Listing::Match(found.clone()));
        }
        debug!("No recipe name contains {:?}, falling back to pagination", q);
    }

    let page = params.page.unwrap_or(1).max(1);
    let page = store.paginate(filter, page, per_page).await?;
    Ok(Listing::Page(page.items))
}

pub fn first_match<'a>(recipes: &'a [Recipe], q: &str) -> Option<&'a Recipe> {
    let q = q.to_lowercase();
    recipes
        .iter()
        .find(|r| r.recipe_name.to_lowercase().contains(&q))
}
