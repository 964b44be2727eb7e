//! Course materials for TutorHub.
//!
//! Files are stored as blobs under `courses/<course_id>/<file_id>` and listed
//! on the course record. Students see a file only when its allow-list names
//! them; admins see everything.

pub mod blob_store;
pub mod error;
pub mod service;

pub use blob_store::{course_file_key, BlobError, BlobStore, LocalBlobStore};
pub use error::{CourseServiceError, CourseServiceResult};
pub use service::{download_url, sanitize_file_name, CourseService, CourseView, FileUpload};
