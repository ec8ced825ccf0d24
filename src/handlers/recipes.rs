// handlers/recipes.rs - /recipes/* handlers (JWT authentication required)
//
// Every handler reads the caller from the AuthUser extension injected by
// jwt_auth_middleware and hands off to the RecipeController.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::recipes::{
    CreateOutcome, CreateRecipe, DeleteOutcome, Listing, SearchParams, UpdateOutcome, UpdateRecipe,
};

fn listing_response(listing: Listing) -> ApiResult<Value> {
    let body = match listing {
        Listing::Empty => return Ok(ApiResponse::message("There are no recipes")),
        Listing::Match(recipe) => serde_json::to_value(recipe)?,
        Listing::Page(recipes) => serde_json::to_value(recipes)?,
    };
    Ok(ApiResponse::success(body))
}

/// GET /recipes/ - all of the caller's recipes, or the first one matching `q`
pub async fn list_all(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(params) = params?;
    let listing = state.recipes.list_all(user.user_id, &params).await?;
    listing_response(listing)
}

/// GET /recipes/:category_id/ - the caller's recipes in one category
pub async fn list_in_category(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Value> {
    let Path(category_id) = path?;
    let Query(params) = params?;
    let listing = state
        .recipes
        .list_in_category(user.user_id, category_id, &params)
        .await?;
    listing_response(listing)
}

/// POST /recipes/:category_id/ - create a recipe in a category
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CreateRecipe>, JsonRejection>,
) -> ApiResult<Value> {
    let Path(category_id) = path?;
    let Json(payload) = payload?;

    match state.recipes.create(user.user_id, category_id, payload).await? {
        CreateOutcome::Created(recipe) => Ok(ApiResponse::created(json!({
            "status": "Success",
            "message": "Recipe has been created",
            "recipe_id": recipe.recipe_id
        }))),
        CreateOutcome::AlreadyExists => Ok(ApiResponse::message("Recipe already exists")),
    }
}

/// GET /recipes/:category_id/:recipe_id/ - one recipe
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<Value> {
    let Path((category_id, recipe_id)) = path?;
    let recipe = state.recipes.get(user.user_id, category_id, recipe_id).await?;
    Ok(ApiResponse::success(serde_json::to_value(recipe)?))
}

/// PUT /recipes/:category_id/:recipe_id/ - edit name and/or description
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<UpdateRecipe>, JsonRejection>,
) -> ApiResult<Value> {
    let Path((category_id, recipe_id)) = path?;
    let Json(payload) = payload?;

    match state
        .recipes
        .update(user.user_id, category_id, recipe_id, payload)
        .await?
    {
        UpdateOutcome::Updated(_) => Ok(ApiResponse::success(json!({
            "status": "Success",
            "message": "Recipe details successfully edited"
        }))),
        UpdateOutcome::InvalidName => Ok(ApiResponse::message(
            "The recipe name should comprise alphabetical characters and can be more than one word",
        )),
    }
}

/// DELETE /recipes/:category_id/:recipe_id/
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<Value> {
    let Path((category_id, recipe_id)) = path?;

    match state.recipes.delete(user.user_id, category_id, recipe_id).await? {
        DeleteOutcome::Deleted => Ok(ApiResponse::message("Recipe was deleted")),
        DeleteOutcome::Missing(id) => Ok(ApiResponse::message(format!("recipe id {} does not exist", id))),
    }
}
