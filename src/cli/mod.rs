use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::app::{self, AppState};
use crate::auth::{generate_jwt, Claims};
use crate::config::{self, ApiConfig, AppConfig};
use crate::database::{DatabaseManager, MemoryRecipeStore, PgRecipeStore, RecipeStore};

#[derive(Parser)]
#[command(name = "recipes-api")]
#[command(about = "Recipes API - recipes grouped into categories, behind JWT authentication")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides RECIPES_API_PORT)")]
        port: Option<u16>,
        #[arg(long, help = "Keep recipes in process memory instead of PostgreSQL")]
        in_memory: bool,
    },

    #[command(about = "Print a signed access token for a user id")]
    Token {
        #[arg(long, help = "User id to embed in the token")]
        user_id: i64,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::config().clone();

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        in_memory: false,
    }) {
        Commands::Serve { port, in_memory } => serve(config, port, in_memory).await,
        Commands::Token { user_id } => {
            let claims = Claims::new(user_id, config.security.jwt_expiry_hours)?;
            let token = generate_jwt(&claims, &config.security.jwt_secret)?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, port: Option<u16>, in_memory: bool) -> anyhow::Result<()> {
    info!("Starting Recipes API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in {:?} mode", config.environment);
    }
    check_page_bounds(&config.api)?;

    let store: Arc<dyn RecipeStore> = if in_memory {
        info!("Using in-memory recipe storage");
        Arc::new(MemoryRecipeStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to open database pool")?;
        Arc::new(PgRecipeStore::new(pool))
    };

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.api.port));
    let app = app::router(AppState::new(config, store.clone()));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Recipes API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Recipes API stopped");
    Ok(())
}

fn check_page_bounds(api: &ApiConfig) -> anyhow::Result<()> {
    if api.per_page_min < 1 || api.per_page_min > api.per_page_max {
        anyhow::bail!(
            "page size bounds must satisfy 1 <= API_PER_PAGE_MIN <= API_PER_PAGE_MAX (got {} and {})",
            api.per_page_min,
            api.per_page_max
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
