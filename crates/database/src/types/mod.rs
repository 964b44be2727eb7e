//! Shared result types for the database layer

pub mod errors;

pub use errors::{CourseError, DatabaseError, UserError, WaitlistError};

pub type DatabaseResult<T> = Result<T, DatabaseError>;
pub type UserResult<T> = Result<T, UserError>;
pub type CourseResult<T> = Result<T, CourseError>;
pub type WaitlistResult<T> = Result<T, WaitlistError>;
