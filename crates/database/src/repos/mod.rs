//! Database repository implementations

pub mod course_repository;
pub mod user_repository;
pub mod waitlist_repository;

pub use course_repository::*;
pub use user_repository::*;
pub use waitlist_repository::*;
