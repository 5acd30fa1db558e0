//! Blog Platform Shared Library
//!
//! This crate contains the wire types, enums and pure helpers shared
//! between the backend and API clients.

pub mod errors;
pub mod models;
pub mod text;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::{ContentType, PostStatus, Role};
pub use types::*;
