//! Course reads and course file management.

use bytes::Bytes;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use tracing::{info, warn};
use tutorhub_database::{Course, CourseFile, CourseRepository, CreateCourseRequest, Role, User};

use crate::blob_store::{course_file_key, course_prefix, BlobError, BlobStore, LocalBlobStore};
use crate::error::{CourseServiceError, CourseServiceResult};

/// Characters escaped inside a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// A course as one viewer may see it.
#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    pub can_manage: bool,
}

/// An upload as received from the client.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub data: Bytes,
    pub allowed_users: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct CourseService<B = LocalBlobStore> {
    repository: CourseRepository,
    blobs: B,
    max_upload_bytes: u64,
}

impl<B: BlobStore> CourseService<B> {
    pub fn new(repository: CourseRepository, blobs: B, max_upload_bytes: u64) -> Self {
        Self {
            repository,
            blobs,
            max_upload_bytes,
        }
    }

    pub fn repository(&self) -> &CourseRepository {
        &self.repository
    }

    /// Courses the viewer may open: every course for admins, the assigned
    /// ones (in assignment order) for students.
    pub async fn list_for(&self, viewer: &User) -> CourseServiceResult<Vec<CourseView>> {
        let courses = match viewer.role {
            Role::Admin => self.repository.list().await?,
            Role::Student => self.repository.list_by_ids(&viewer.assigned_courses).await?,
            _ => return Err(CourseServiceError::Forbidden),
        };

        Ok(courses
            .into_iter()
            .map(|course| visible_view(course, viewer))
            .collect())
    }

    /// One course with the files the viewer may see.
    pub async fn course_for(&self, viewer: &User, course_id: &str) -> CourseServiceResult<CourseView> {
        let course = self
            .repository
            .find_by_id(course_id)
            .await?
            .ok_or(CourseServiceError::CourseNotFound)?;

        if !may_open(viewer, course_id) {
            return Err(CourseServiceError::Forbidden);
        }

        Ok(visible_view(course, viewer))
    }

    /// Store the blob, then append the file entry to the course.
    pub async fn upload_file(
        &self,
        uploader: &User,
        course_id: &str,
        upload: FileUpload,
    ) -> CourseServiceResult<CourseFile> {
        if !uploader.is_admin() {
            return Err(CourseServiceError::Forbidden);
        }

        if self.repository.find_by_id(course_id).await?.is_none() {
            return Err(CourseServiceError::CourseNotFound);
        }

        let name = sanitize_file_name(&upload.file_name)?;
        if upload.data.len() as u64 > self.max_upload_bytes {
            return Err(CourseServiceError::TooLarge {
                limit: self.max_upload_bytes,
            });
        }

        let uploaded_at = Utc::now();
        let file_id = format!("{}_{}", uploaded_at.timestamp_millis(), name);
        let key = course_file_key(course_id, &file_id);
        let size = upload.data.len() as i64;

        self.blobs.put(&key, upload.data).await?;

        let file = CourseFile {
            url: download_url(course_id, &file_id),
            id: file_id,
            name,
            size,
            uploaded_at: uploaded_at.to_rfc3339(),
            uploaded_by: uploader.public_id.clone(),
            allowed_users: upload.allowed_users.map(normalize_allow_list),
        };

        match self.repository.add_file(course_id, &file).await {
            Ok(file) => {
                info!(course = %course_id, file = %file.id, size = file.size, "uploaded course file");
                Ok(file)
            }
            Err(err) => {
                warn!(course = %course_id, key = %key, error = %err, "file entry not recorded, blob left orphaned");
                Err(err.into())
            }
        }
    }

    /// Delete the blob, then remove the entry. If the second step fails the
    /// entry is left pointing at a blob that no longer exists.
    pub async fn delete_file(&self, course_id: &str, file_id: &str) -> CourseServiceResult<()> {
        self.repository
            .find_file(course_id, file_id)
            .await?
            .ok_or(CourseServiceError::FileNotFound)?;

        let key = course_file_key(course_id, file_id);
        match self.blobs.delete(&key).await {
            Ok(()) => {}
            Err(BlobError::NotFound(_)) => {
                warn!(course = %course_id, file = %file_id, "blob already missing, removing entry");
            }
            Err(err) => return Err(err.into()),
        }

        if let Err(err) = self.repository.remove_file(course_id, file_id).await {
            warn!(
                course = %course_id,
                file = %file_id,
                error = %err,
                "dangling file reference: blob deleted but entry remains"
            );
            return Err(err.into());
        }

        info!(course = %course_id, file = %file_id, "deleted course file");
        Ok(())
    }

    /// Replace a file's allow-list. `None` or an empty list hides the file
    /// from every student.
    pub async fn set_permissions(
        &self,
        course_id: &str,
        file_id: &str,
        allowed_users: Option<Vec<String>>,
    ) -> CourseServiceResult<CourseFile> {
        let allowed = allowed_users.map(normalize_allow_list);
        let file = self
            .repository
            .set_file_permissions(course_id, file_id, allowed.as_deref())
            .await?;

        info!(course = %course_id, file = %file_id, allowed = ?file.allowed_users, "updated file permissions");
        Ok(file)
    }

    /// Fetch a file's bytes for a viewer allowed to see it.
    pub async fn download(
        &self,
        viewer: &User,
        course_id: &str,
        file_id: &str,
    ) -> CourseServiceResult<(CourseFile, Bytes)> {
        let file = self
            .repository
            .find_file(course_id, file_id)
            .await?
            .ok_or(CourseServiceError::FileNotFound)?;

        let allowed = viewer.is_admin()
            || (may_open(viewer, course_id) && file.is_visible_to(&viewer.public_id));
        if !allowed {
            return Err(CourseServiceError::Forbidden);
        }

        let data = match self.blobs.get(&course_file_key(course_id, file_id)).await {
            Ok(data) => data,
            Err(BlobError::NotFound(_)) => {
                warn!(course = %course_id, file = %file_id, "file entry has no blob");
                return Err(CourseServiceError::FileNotFound);
            }
            Err(err) => return Err(err.into()),
        };

        Ok((file, data))
    }

    pub async fn create_course(&self, request: CreateCourseRequest) -> CourseServiceResult<Course> {
        let course = self.repository.create(&request).await?;
        info!(course = %course.id, "created course");
        Ok(course)
    }

    /// Delete a course, its file entries and its blobs.
    pub async fn delete_course(&self, course_id: &str) -> CourseServiceResult<()> {
        self.repository.delete(course_id).await?;
        self.blobs.delete_prefix(&course_prefix(course_id)).await?;
        info!(course = %course_id, "deleted course");
        Ok(())
    }
}

fn may_open(viewer: &User, course_id: &str) -> bool {
    match viewer.role {
        Role::Admin => true,
        Role::Student => viewer.is_assigned_to(course_id),
        _ => false,
    }
}

fn visible_view(mut course: Course, viewer: &User) -> CourseView {
    let can_manage = viewer.is_admin();
    if !can_manage {
        course.files.retain(|file| file.is_visible_to(&viewer.public_id));
    }
    CourseView { course, can_manage }
}

pub fn download_url(course_id: &str, file_id: &str) -> String {
    format!(
        "/api/courses/{}/files/{}/download",
        utf8_percent_encode(course_id, PATH_SEGMENT),
        utf8_percent_encode(file_id, PATH_SEGMENT)
    )
}

/// Reduce a client-supplied name to a single safe path segment.
pub fn sanitize_file_name(raw: &str) -> CourseServiceResult<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(CourseServiceError::InvalidInput(
            "a file name is required".to_string(),
        ));
    }
    Ok(cleaned)
}

fn normalize_allow_list(ids: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if !id.is_empty() && !normalized.iter().any(|existing| existing == id) {
            normalized.push(id.to_string());
        }
    }
    normalized
}
