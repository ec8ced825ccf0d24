use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewRecipe, Recipe};
use crate::database::repository::{Page, RecipeFilter, RecipeStore};

const RECIPE_COLUMNS: &str =
    "recipe_id, recipe_name, ingredients, category_id, created_by, date_created, date_modified";

/// Recipe storage backed by a PostgreSQL pool
pub struct PgRecipeStore {
    pool: PgPool,
}

impl PgRecipeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select(filter: &RecipeFilter) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM recipes", RECIPE_COLUMNS));
        push_where(&mut qb, filter);
        qb
    }
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, filter: &RecipeFilter) {
    qb.push(" WHERE TRUE");
    if let Some(created_by) = filter.created_by {
        qb.push(" AND created_by = ").push_bind(created_by);
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(recipe_id) = filter.recipe_id {
        qb.push(" AND recipe_id = ").push_bind(recipe_id);
    }
    if let Some(recipe_name) = &filter.recipe_name {
        qb.push(" AND LOWER(recipe_name) = LOWER(")
            .push_bind(recipe_name.clone())
            .push(")");
    }
}

/// Rows to skip for a 1-based page; saturates instead of overflowing
fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page.max(0))
}

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn select_any(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>, DatabaseError> {
        let mut qb = Self::select(filter);
        qb.push(" ORDER BY recipe_id");
        let rows = qb.build_query_as::<Recipe>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn select_one(&self, filter: &RecipeFilter) -> Result<Option<Recipe>, DatabaseError> {
        let mut qb = Self::select(filter);
        qb.push(" ORDER BY recipe_id LIMIT 1");
        let row = qb.build_query_as::<Recipe>().fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn count(&self, filter: &RecipeFilter) -> Result<i64, DatabaseError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) AS count FROM recipes");
        push_where(&mut qb, filter);
        let row = qb.build().fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn paginate(
        &self,
        filter: &RecipeFilter,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Recipe>, DatabaseError> {
        let total = self.count(filter).await?;

        let mut qb = Self::select(filter);
        qb.push(" ORDER BY recipe_id LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(page_offset(page, per_page));
        let items = qb.build_query_as::<Recipe>().fetch_all(&self.pool).await?;

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    async fn insert(&self, recipe: NewRecipe) -> Result<Recipe, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent creates of the same name in one owner/category scope
        let lock_key = format!(
            "recipes:{}:{}:{}",
            recipe.created_by,
            recipe.category_id,
            recipe.recipe_name.to_lowercase()
        );
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&lock_key)
            .execute(&mut *tx)
            .await?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT recipe_id FROM recipes \
             WHERE created_by = $1 AND category_id = $2 AND LOWER(recipe_name) = LOWER($3) \
             LIMIT 1",
        )
        .bind(recipe.created_by)
        .bind(recipe.category_id)
        .bind(&recipe.recipe_name)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(recipe_id) = existing {
            return Err(DatabaseError::Conflict(format!(
                "recipe '{}' already exists as {}",
                recipe.recipe_name, recipe_id
            )));
        }

        let sql = format!(
            "INSERT INTO recipes (recipe_name, ingredients, category_id, created_by) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            RECIPE_COLUMNS
        );
        let created = sqlx::query_as::<_, Recipe>(&sql)
            .bind(&recipe.recipe_name)
            .bind(&recipe.ingredients)
            .bind(recipe.category_id)
            .bind(recipe.created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, recipe: &Recipe) -> Result<Recipe, DatabaseError> {
        let sql = format!(
            "UPDATE recipes SET recipe_name = $1, ingredients = $2, date_modified = NOW() \
             WHERE recipe_id = $3 RETURNING {}",
            RECIPE_COLUMNS
        );
        sqlx::query_as::<_, Recipe>(&sql)
            .bind(&recipe.recipe_name)
            .bind(&recipe.ingredients)
            .bind(recipe.recipe_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("recipe {}", recipe.recipe_id)))
    }

    async fn delete(&self, recipe_id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM recipes WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("recipe {}", recipe_id)));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
