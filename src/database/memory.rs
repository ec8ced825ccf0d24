use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewRecipe, Recipe};
use crate::database::repository::{Page, RecipeFilter, RecipeStore};

#[derive(Default)]
struct Table {
    rows: Vec<Recipe>,
    next_id: i64,
}

/// Process-local recipe storage for `serve --in-memory` and tests.
///
/// Rows are kept in insertion order, which is also `recipe_id` order.
#[derive(Default)]
pub struct MemoryRecipeStore {
    table: RwLock<Table>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn select_any(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    async fn select_one(&self, filter: &RecipeFilter) -> Result<Option<Recipe>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|r| filter.matches(r)).cloned())
    }

    async fn count(&self, filter: &RecipeFilter) -> Result<i64, DatabaseError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().filter(|r| filter.matches(r)).count() as i64)
    }

    async fn paginate(
        &self,
        filter: &RecipeFilter,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Recipe>, DatabaseError> {
        let table = self.table.read().await;
        let matching: Vec<&Recipe> = table.rows.iter().filter(|r| filter.matches(r)).collect();
        let offset = usize::try_from((page.max(1) - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);

        Ok(Page {
            items: matching
                .iter()
                .skip(offset)
                .take(usize::try_from(per_page).unwrap_or(0))
                .map(|r| (*r).clone())
                .collect(),
            total: matching.len() as i64,
            page,
            per_page,
        })
    }

    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe, DatabaseError> {
        let mut table = self.table.write().await;

        let scope = RecipeFilter::owned_by(recipe.created_by)
            .in_category(recipe.category_id)
            .named(recipe.recipe_name.as_str());
        if let Some(existing) = table.rows.iter().find(|r| scope.matches(r)) {
            return Err(DatabaseError::Conflict(format!(
                "recipe '{}' already exists as {}",
                recipe.recipe_name, existing.recipe_id
            )));
        }

        table.next_id += 1;
        let now = Utc::now();
        let created = Recipe {
            recipe_id: table.next_id,
            recipe_name: recipe.recipe_name,
            ingredients: recipe.ingredients,
            category_id: recipe.category_id,
            created_by: recipe.created_by,
            date_created: now,
            date_modified: now,
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn update(&self, recipe: &Recipe) -> Result<Recipe, DatabaseError> {
        let mut table = self.table.write().await;
        let row = table
            .rows
            .iter_mut()
            .find(|r| r.recipe_id == recipe.recipe_id)
            .ok_or_else(|| DatabaseError::NotFound(format!("recipe {}", recipe.recipe_id)))?;

        row.recipe_name = recipe.recipe_name.clone();
        row.ingredients = recipe.ingredients.clone();
        row.date_modified = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, recipe_id: i64) -> Result<(), DatabaseError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|r| r.recipe_id != recipe_id);

        if table.rows.len() == before {
            return Err(DatabaseError::NotFound(format!("recipe {}", recipe_id)));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn close(&self) {}
}
