//! Domain entities for the database layer

pub mod course;
pub mod user;
pub mod waitlist;

pub use course::{Course, CourseFile, CreateCourseRequest};
pub use user::{UpdateUserRequest, User, UserStatus};
pub use waitlist::{CreateWaitlistEntryRequest, WaitlistEntry, WaitlistStatus};
