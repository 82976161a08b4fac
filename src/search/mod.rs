pub mod controller;
pub mod debounce;

pub use controller::{SearchController, SearchPhase, SearchSnapshot};
