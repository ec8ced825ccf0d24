use async_trait::async_trait;
use serde::Serialize;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewRecipe, Recipe};

/// Field-equality filter over the recipes collection.
///
/// Unset fields do not constrain the result. `recipe_name` compares
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub created_by: Option<i64>,
    pub category_id: Option<i64>,
    pub recipe_id: Option<i64>,
    pub recipe_name: Option<String>,
}

impl RecipeFilter {
    pub fn owned_by(user_id: i64) -> Self {
        Self {
            created_by: Some(user_id),
            ..Default::default()
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_id(mut self, recipe_id: i64) -> Self {
        self.recipe_id = Some(recipe_id);
        self
    }

    pub fn named(mut self, recipe_name: impl Into<String>) -> Self {
        self.recipe_name = Some(recipe_name.into());
        self
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        self.created_by.map_or(true, |v| recipe.created_by == v)
            && self.category_id.map_or(true, |v| recipe.category_id == v)
            && self.recipe_id.map_or(true, |v| recipe.recipe_id == v)
            && self
                .recipe_name
                .as_deref()
                .map_or(true, |v| recipe.recipe_name.to_lowercase() == v.to_lowercase())
    }
}

/// One page of a paginated query
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Durable recipe storage.
///
/// Every call commits on its own. Results are ordered by `recipe_id`.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn select_any(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>, DatabaseError>;

    async fn select_one(&self, filter: &RecipeFilter) -> Result<Option<Recipe>, DatabaseError>;

    async fn count(&self, filter: &RecipeFilter) -> Result<i64, DatabaseError>;

    /// `page` is 1-based. A page past the end has no items.
    async fn paginate(
        &self,
        filter: &RecipeFilter,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Recipe>, DatabaseError>;

    /// Insert a new recipe.
    ///
    /// Fails with [`DatabaseError::Conflict`] when the owner already has a
    /// recipe with the same name (case-insensitive) in the category.
    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe, DatabaseError>;

    /// Overwrite name and ingredients of an existing recipe
    async fn update(&self, recipe: &Recipe) -> Result<Recipe, DatabaseError>;

    async fn delete(&self, recipe_id: i64) -> Result<(), DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn close(&self);
}
