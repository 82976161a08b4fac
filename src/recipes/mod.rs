pub mod generation;
pub mod model;

// Re-export common types
pub use generation::{GenerationError, RecipeGenerator, RecipeSource};
pub use model::Recipe;
