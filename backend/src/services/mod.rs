//! Business logic layer
//!
//! Services hold the rules; handlers translate HTTP to service calls and
//! repositories do the storage.

pub mod auth;
pub mod category;
pub mod post;
pub mod publication;
pub mod storage;
pub mod topic;
pub mod user;

pub use auth::{AuthService, Session};
pub use category::CategoryService;
pub use post::PostService;
pub use topic::TopicService;
pub use user::UserService;
