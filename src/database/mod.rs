pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryRecipeStore;
pub use models::{NewRecipe, Recipe};
pub use postgres::PgRecipeStore;
pub use repository::{Page, RecipeFilter, RecipeStore};
