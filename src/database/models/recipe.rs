use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored recipe as returned to clients.
///
/// The free-text description is persisted and serialized as `ingredients`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub recipe_id: i64,
    pub recipe_name: String,
    pub ingredients: String,
    pub category_id: i64,
    pub created_by: i64,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

/// Values for a recipe that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub recipe_name: String,
    pub ingredients: String,
    pub category_id: i64,
    pub created_by: i64,
}

impl NewRecipe {
    pub fn new(
        recipe_name: impl Into<String>,
        ingredients: impl Into<String>,
        category_id: i64,
        created_by: i64,
    ) -> Self {
        Self {
            recipe_name: recipe_name.into(),
            ingredients: ingredients.into(),
            category_id,
            created_by,
        }
    }
}
