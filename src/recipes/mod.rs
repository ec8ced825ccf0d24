pub mod controller;
pub mod search;
pub mod validation;

pub use controller::{
    CreateOutcome, CreateRecipe, DeleteOutcome, RecipeController, RecipeError, UpdateOutcome, UpdateRecipe,
};
pub use search::{Listing, PageBounds, SearchParams};
pub use validation::is_valid_name;
