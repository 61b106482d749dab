//! Services wiring domain contracts to infrastructure

mod recipe_service;

pub use recipe_service::{CreateRecipeRequest, RecipeQuery, RecipeService};
