//! Internal utilities for the chat surface.
//!
//! The content filter applied to every rendered message and the input
//! validation used by the reference chat client.

pub mod sanitizer;
pub mod validation;

// Re-export utilities
pub use sanitizer::{ContentSanitizer, Verdict};
pub use validation::Validator;
