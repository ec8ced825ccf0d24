use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::RecipeStore;
use crate::handlers::recipes;
use crate::middleware::jwt_auth_middleware;
use crate::recipes::{PageBounds, RecipeController};

/// Shared per-process dependencies handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub recipes: RecipeController,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RecipeStore>) -> Self {
        let bounds = PageBounds::from_config(&config.api);
        Self {
            config: Arc::new(config),
            recipes: RecipeController::new(store, bounds),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Protected
        .merge(recipe_routes(state.clone()))
        .with_state(state.clone());

    if state.config.security.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }
    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn recipe_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/recipes", get(recipes::list_all))
        .route("/recipes/", get(recipes::list_all))
        .route(
            "/recipes/:category_id",
            get(recipes::list_in_category).post(recipes::create),
        )
        .route(
            "/recipes/:category_id/",
            get(recipes::list_in_category).post(recipes::create),
        )
        .route(
            "/recipes/:category_id/:recipe_id",
            get(recipes::get).put(recipes::update).delete(recipes::delete),
        )
        .route(
            "/recipes/:category_id/:recipe_id/",
            get(recipes::get).put(recipes::update).delete(recipes::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Recipes API",
        "version": version,
        "description": "A simple recipes creation and categorisation API",
        "endpoints": {
            "health": "/health (public)",
            "recipes": "/recipes/ (protected)",
            "category": "/recipes/:category_id/ (protected)",
            "recipe": "/recipes/:category_id/:recipe_id/ (protected)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.recipes.store().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt, Claims};
    use crate::database::MemoryRecipeStore;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    fn app() -> Router {
        let store: Arc<dyn RecipeStore> = Arc::new(MemoryRecipeStore::new());
        router(AppState::new(AppConfig::development(), store))
    }

    fn token(user_id: i64) -> String {
        let secret = AppConfig::development().security.jwt_secret;
        generate_jwt(&Claims::new(user_id, 1).unwrap(), &secret).unwrap()
    }

    async fn send(app: &Router, method: Method, uri: &str, user_id: Option<i64>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user_id)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = send(&app(), Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn recipes_require_bearer_token() {
        let (status, body) = send(&app(), Method::GET, "/recipes/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/recipes/1/",
            Some(1),
            Some(json!({ "recipe_name": "Pasta Bake", "description": "Pasta" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "Success");
        let recipe_id = body["recipe_id"].as_i64().unwrap();

        let (status, body) = send(&app, Method::GET, &format!("/recipes/1/{}/", recipe_id), Some(1), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipe_name"], "pasta bake");
        assert_eq!(body["ingredients"], "pasta");
    }

    #[tokio::test]
    async fn create_without_name_is_bad_request() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/recipes/1/",
            Some(1),
            Some(json!({ "description": "no name" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("Try again"));
    }

    #[tokio::test]
    async fn list_without_recipes_is_informational() {
        let (status, body) = send(&app(), Method::GET, "/recipes", Some(5), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "There are no recipes" }));
    }

    #[tokio::test]
    async fn non_numeric_page_is_rejected() {
        let app = app();
        send(&app, Method::POST, "/recipes/1/", Some(1), Some(json!({ "recipe_name": "soup" }))).await;
        let (status, _) = send(&app, Method::GET, "/recipes/?page=two", Some(1), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
