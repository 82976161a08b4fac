pub mod groq;
pub mod traits;

// Re-export common types
pub use groq::GroqProvider;
pub use traits::ChatCompletion;
