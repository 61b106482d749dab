//! Recipe execution infrastructure

mod executor_impl;

pub use executor_impl::RecipeExecutorImpl;
