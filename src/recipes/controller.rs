use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::database::{DatabaseError, NewRecipe, Recipe, RecipeFilter, RecipeStore};
use crate::recipes::search::{self, Listing, PageBounds, SearchParams};
use crate::recipes::validation::is_valid_name;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error(
        "{0} is not a valid name. Recipe names can only comprise of alphabetical \
         characters and can be more than one word"
    )]
    InvalidName(String),

    #[error("No recipes in category {0}")]
    CategoryEmpty(i64),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Body of a create request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipe {
    pub recipe_name: String,
    #[serde(default)]
    pub description: String,
}

/// Body of an update request. Missing or empty fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecipe {
    pub recipe_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Recipe),
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Recipe),
    InvalidName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Missing(i64),
}

/// Recipe lifecycle. Every operation is scoped to the calling user.
#[derive(Clone)]
pub struct RecipeController {
    store: Arc<dyn RecipeStore>,
    bounds: PageBounds,
}

impl RecipeController {
    pub fn new(store: Arc<dyn RecipeStore>, bounds: PageBounds) -> Self {
        Self { store, bounds }
    }

    pub fn store(&self) -> &Arc<dyn RecipeStore> {
        &self.store
    }

    pub async fn list_all(&self, caller: i64, params: &SearchParams) -> Result<Listing, RecipeError> {
        let filter = RecipeFilter::owned_by(caller);
        Ok(search::resolve(self.store.as_ref(), &filter, params, self.bounds).await?)
    }

    pub async fn list_in_category(
        &self,
        caller: i64,
        category_id: i64,
        params: &SearchParams,
    ) -> Result<Listing, RecipeError> {
        let filter = RecipeFilter::owned_by(caller).in_category(category_id);
        match search::resolve(self.store.as_ref(), &filter, params, self.bounds).await? {
            Listing::Empty => Err(RecipeError::CategoryEmpty(category_id)),
            listing => Ok(listing),
        }
    }

    pub async fn create(
        &self,
        caller: i64,
        category_id: i64,
        input: CreateRecipe,
    ) -> Result<CreateOutcome, RecipeError> {
        // The stored, lower-cased form must pass as well
        let recipe_name = input.recipe_name.to_lowercase();
        if !is_valid_name(&input.recipe_name) || !is_valid_name(&recipe_name) {
            return Err(RecipeError::InvalidName(input.recipe_name));
        }
        let description = input.description.to_lowercase();

        let duplicate = RecipeFilter::owned_by(caller)
            .in_category(category_id)
            .named(recipe_name.as_str());
        if self.store.select_one(&duplicate).await?.is_some() {
            debug!("User {} already has '{}' in category {}", caller, recipe_name, category_id);
            return Ok(CreateOutcome::AlreadyExists);
        }

        let new = NewRecipe::new(recipe_name, description, category_id, caller);
        match self.store.insert(new).await {
            Ok(recipe) => {
                debug!("Created recipe {} for user {}", recipe.recipe_id, caller);
                Ok(CreateOutcome::Created(recipe))
            }
            // Lost a race with a concurrent create of the same name
            Err(DatabaseError::Conflict(_)) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, caller: i64, category_id: i64, recipe_id: i64) -> Result<Recipe, RecipeError> {
        self.find(caller, category_id, recipe_id)
            .await?
            .ok_or_else(|| RecipeError::NotFound(format!("You don't have a recipe with id {}", recipe_id)))
    }

    pub async fn update(
        &self,
        caller: i64,
        category_id: i64,
        recipe_id: i64,
        input: UpdateRecipe,
    ) -> Result<UpdateOutcome, RecipeError> {
        let mut recipe = self
            .find(caller, category_id, recipe_id)
            .await?
            .ok_or_else(|| RecipeError::NotFound(format!("No recipe with id {}", recipe_id)))?;

        let recipe_name = input
            .recipe_name
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| recipe.recipe_name.clone())
            .to_lowercase();
        let description = input
            .description
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| recipe.ingredients.clone())
            .to_lowercase();

        if !is_valid_name(&recipe_name) {
            debug!("Rejected rename of recipe {} to {:?}", recipe_id, recipe_name);
            return Ok(UpdateOutcome::InvalidName);
        }

        recipe.recipe_name = recipe_name;
        recipe.ingredients = description;
        let updated = self.store.update(&recipe).await?;
        Ok(UpdateOutcome::Updated(updated))
    }

    pub async fn delete(&self, caller: i64, category_id: i64, recipe_id: i64) -> Result<DeleteOutcome, RecipeError> {
        if self.find(caller, category_id, recipe_id).await?.is_none() {
            return Ok(DeleteOutcome::Missing(recipe_id));
        }

        match self.store.delete(recipe_id).await {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(DatabaseError::NotFound(_)) => Ok(DeleteOutcome::Missing(recipe_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, caller: i64, category_id: i64, recipe_id: i64) -> Result<Option<Recipe>, RecipeError> {
        let filter = RecipeFilter::owned_by(caller)
            .in_category(category_id)
            .with_id(recipe_id);
        Ok(self.store.select_one(&filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryRecipeStore;

    const OWNER: i64 = 1;
    const OTHER: i64 = 2;

    fn controller() -> RecipeController {
        RecipeController::new(Arc::new(MemoryRecipeStore::new()), PageBounds { min: 5, max: 20 })
    }

    fn create(name: &str, description: &str) -> CreateRecipe {
        CreateRecipe {
            recipe_name: name.to_string(),
            description: description.to_string(),
        }
    }

    async fn created(controller: &RecipeController, caller: i64, category_id: i64, name: &str) -> Recipe {
        match controller.create(caller, category_id, create(name, "")).await.unwrap() {
            CreateOutcome::Created(recipe) => recipe,
            other => panic!("expected creation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_lowercases_name_and_description() {
        let controller = controller();
        let outcome = controller.create(OWNER, 1, create("Pasta Bake", "Pasta AND Cheese")).await.unwrap();

        let CreateOutcome::Created(recipe) = outcome else {
            panic!("expected creation");
        };
        assert_eq!(recipe.recipe_name, "pasta bake");
        assert_eq!(recipe.ingredients, "pasta and cheese");
        assert_eq!(recipe.category_id, 1);
        assert_eq!(recipe.created_by, OWNER);
    }

    #[tokio::test]
    async fn create_same_name_twice_is_duplicate() {
        let controller = controller();
        created(&controller, OWNER, 1, "Pasta Bake").await;

        let outcome = controller.create(OWNER, 1, create("pasta bake", "")).await.unwrap();
        assert_eq!(outcome, CreateOutcome::AlreadyExists);
        assert_eq!(controller.store().count(&RecipeFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn same_name_is_allowed_for_other_owner_or_category() {
        let controller = controller();
        created(&controller, OWNER, 1, "soup").await;
        created(&controller, OWNER, 2, "soup").await;
        created(&controller, OTHER, 1, "soup").await;
        assert_eq!(controller.store().count(&RecipeFilter::default()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn create_invalid_name_persists_nothing() {
        let controller = controller();
        let err = controller.create(OWNER, 1, create("Pasta123", "")).await.unwrap_err();

        assert!(matches!(err, RecipeError::InvalidName(ref name) if name == "Pasta123"));
        assert!(err.to_string().starts_with("Pasta123 is not a valid name"));
        assert_eq!(controller.store().count(&RecipeFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_rejects_name_whose_lowercase_form_is_invalid() {
        let controller = controller();
        // 'İ' lower-cases to 'i' followed by U+0307 COMBINING DOT ABOVE
        let err = controller.create(OWNER, 1, create("İmam Bayıldı", "")).await.unwrap_err();

        assert!(matches!(err, RecipeError::InvalidName(ref name) if name == "İmam Bayıldı"));
        assert_eq!(controller.store().count(&RecipeFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn created_unicode_name_stays_updatable() {
        let controller = controller();
        let recipe = created(&controller, OWNER, 1, "Crème Brûlée").await;
        assert_eq!(recipe.recipe_name, "crème brûlée");

        let input = UpdateRecipe {
            recipe_name: None,
            description: Some("cream".to_string()),
        };
        let outcome = controller.update(OWNER, 1, recipe.recipe_id, input).await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated(ref r) if r.ingredients == "cream"));
    }

    #[tokio::test]
    async fn list_in_category_is_scoped_to_caller() {
        let controller = controller();
        created(&controller, OWNER, 1, "Soup").await;

        let err = controller
            .list_in_category(OTHER, 1, &SearchParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::CategoryEmpty(1)));
        assert_eq!(err.to_string(), "No recipes in category 1");

        let listing = controller.list_in_category(OWNER, 1, &SearchParams::default()).await.unwrap();
        assert!(matches!(listing, Listing::Page(ref items) if items.len() == 1));
    }

    #[tokio::test]
    async fn list_all_spans_categories_but_not_owners() {
        let controller = controller();
        created(&controller, OWNER, 1, "soup").await;
        created(&controller, OWNER, 2, "stew").await;
        created(&controller, OTHER, 1, "pie").await;

        let Listing::Page(items) = controller.list_all(OWNER, &SearchParams::default()).await.unwrap() else {
            panic!("expected a page");
        };
        let names: Vec<&str> = items.iter().map(|r| r.recipe_name.as_str()).collect();
        assert_eq!(names, vec!["soup", "stew"]);

        let nothing = controller.list_all(3, &SearchParams::default()).await.unwrap();
        assert_eq!(nothing, Listing::Empty);
    }

    #[tokio::test]
    async fn get_requires_matching_scope() {
        let controller = controller();
        let recipe = created(&controller, OWNER, 1, "soup").await;

        assert_eq!(controller.get(OWNER, 1, recipe.recipe_id).await.unwrap(), recipe);

        let wrong_category = controller.get(OWNER, 2, recipe.recipe_id).await.unwrap_err();
        assert_eq!(
            wrong_category.to_string(),
            format!("You don't have a recipe with id {}", recipe.recipe_id)
        );
        assert!(matches!(
            controller.get(OTHER, 1, recipe.recipe_id).await,
            Err(RecipeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_description_only_keeps_name() {
        let controller = controller();
        let recipe = created(&controller, OWNER, 1, "Soup").await;

        let input = UpdateRecipe {
            recipe_name: None,
            description: Some("Carrots AND Leeks".to_string()),
        };
        let outcome = controller.update(OWNER, 1, recipe.recipe_id, input).await.unwrap();

        let UpdateOutcome::Updated(updated) = outcome else {
            panic!("expected update");
        };
        assert_eq!(updated.recipe_name, "soup");
        assert_eq!(updated.ingredients, "carrots and leeks");
    }

    #[tokio::test]
    async fn update_empty_fields_fall_back_to_current_values() {
        let controller = controller();
        let recipe = match controller.create(OWNER, 1, create("soup", "water")).await.unwrap() {
            CreateOutcome::Created(recipe) => recipe,
            other => panic!("expected creation, got {:?}", other),
        };

        let input = UpdateRecipe {
            recipe_name: Some(String::new()),
            description: Some(String::new()),
        };
        let UpdateOutcome::Updated(updated) = controller.update(OWNER, 1, recipe.recipe_id, input).await.unwrap() else {
            panic!("expected update");
        };
        assert_eq!(updated.recipe_name, "soup");
        assert_eq!(updated.ingredients, "water");
    }

    #[tokio::test]
    async fn update_invalid_name_leaves_record_untouched() {
        let controller = controller();
        let recipe = created(&controller, OWNER, 1, "soup").await;

        let input = UpdateRecipe {
            recipe_name: Some("soup 2".to_string()),
            description: Some("new".to_string()),
        };
        let outcome = controller.update(OWNER, 1, recipe.recipe_id, input).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::InvalidName);
        assert_eq!(controller.get(OWNER, 1, recipe.recipe_id).await.unwrap(), recipe);
    }

    #[tokio::test]
    async fn update_missing_recipe_is_not_found() {
        let controller = controller();
        let err = controller.update(OWNER, 1, 99, UpdateRecipe::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "No recipe with id 99");
    }

    #[tokio::test]
    async fn delete_removes_then_reports_missing() {
        let controller = controller();
        let recipe = created(&controller, OWNER, 1, "soup").await;

        assert_eq!(
            controller.delete(OTHER, 1, recipe.recipe_id).await.unwrap(),
            DeleteOutcome::Missing(recipe.recipe_id)
        );
        assert_eq!(controller.delete(OWNER, 1, recipe.recipe_id).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(
            controller.delete(OWNER, 1, recipe.recipe_id).await.unwrap(),
            DeleteOutcome::Missing(recipe.recipe_id)
        );
    }
}
