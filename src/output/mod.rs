//! Output formatters for count and clean results.
//!
//! - Text for people, colored with yansi unless disabled
//! - JSON for automation and scripting

pub mod json;
pub mod text;

pub use json::{JsonClean, JsonCount};
