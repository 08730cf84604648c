//! Built-in registered types.
pub mod ejson;
pub mod json;
mod skeleton;
pub mod text;

pub use skeleton::{MARKER_KEY, MAX_DEPTH};
