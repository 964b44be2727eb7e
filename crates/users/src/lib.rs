//! # TutorHub Users Crate
//!
//! Admin-side account management: reviewing pending sign-ups, approving them
//! into students with course assignments, declining them, and editing
//! existing accounts.
//!
//! [`UserService`] is generic over [`UserRepo`] so the rules can be tested
//! against [`MockUserRepository`] without a database.

pub mod services;

pub use services::{MockUserRepository, UserRepo, UserService};

pub use tutorhub_database::{
    Role, UpdateUserRequest, User, UserError, UserRepository, UserResult, UserStatus,
};
