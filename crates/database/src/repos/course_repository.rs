//! Course repository for database operations.

use crate::entities::{Course, CourseFile, CreateCourseRequest};
use crate::types::{CourseError, CourseResult};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

const FILE_COLUMNS: &str =
    "course_id, id, name, url, size, uploaded_at, uploaded_by, allowed_users";

/// Repository for courses and their file entries
#[derive(Clone)]
pub struct CourseRepository {
    pool: SqlitePool,
}

impl CourseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create an empty course
    pub async fn create(&self, request: &CreateCourseRequest) -> CourseResult<Course> {
        request.validate().map_err(CourseError::InvalidCourse)?;
        let now = Utc::now().to_rfc3339();
        let id = request.id.trim();

        sqlx::query(
            "INSERT INTO courses (id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| match CourseError::from(e) {
            CourseError::FileAlreadyExists => CourseError::CourseAlreadyExists,
            other => other,
        })?;

        self.find_by_id(id).await?.ok_or(CourseError::CourseNotFound)
    }

    /// Delete a course and, by cascade, its file entries
    pub async fn delete(&self, id: &str) -> CourseResult<()> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CourseError::CourseNotFound);
        }
        Ok(())
    }

    /// Find a course with its files in upload order
    pub async fn find_by_id(&self, id: &str) -> CourseResult<Option<Course>> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM courses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let files = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM course_files WHERE course_id = ? ORDER BY seq"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(file_from_row)
        .collect::<CourseResult<Vec<_>>>()?;

        Ok(Some(course_from_row(&row, files)?))
    }

    /// List every course ordered by id
    pub async fn list(&self) -> CourseResult<Vec<Course>> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM courses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let file_rows = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM course_files ORDER BY seq"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut files_by_course: HashMap<String, Vec<CourseFile>> = HashMap::new();
        for row in &file_rows {
            let course_id: String = row.try_get("course_id")?;
            files_by_course
                .entry(course_id)
                .or_default()
                .push(file_from_row(row)?);
        }

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let files = files_by_course.remove(&id).unwrap_or_default();
                course_from_row(row, files)
            })
            .collect()
    }

    /// Fetch the given courses, keeping the caller's order and skipping ids
    /// that do not resolve.
    pub async fn list_by_ids(&self, ids: &[String]) -> CourseResult<Vec<Course>> {
        let mut courses = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(course) = self.find_by_id(id).await? {
                courses.push(course);
            }
        }
        Ok(courses)
    }

    /// Append a file entry to a course
    pub async fn add_file(&self, course_id: &str, file: &CourseFile) -> CourseResult<CourseFile> {
        let allowed = file
            .allowed_users
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CourseError::CourseNotFound);
        }

        sqlx::query(
            "INSERT INTO course_files (course_id, id, name, url, size, uploaded_at, uploaded_by, allowed_users) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(course_id)
        .bind(&file.id)
        .bind(&file.name)
        .bind(&file.url)
        .bind(file.size)
        .bind(&file.uploaded_at)
        .bind(&file.uploaded_by)
        .bind(allowed)
        .execute(&mut *tx)
        .await?;

        touch_course(&mut tx, course_id).await?;
        tx.commit().await?;

        Ok(file.clone())
    }

    /// Remove a file entry from a course
    pub async fn remove_file(&self, course_id: &str, file_id: &str) -> CourseResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM course_files WHERE course_id = ? AND id = ?")
            .bind(course_id)
            .bind(file_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CourseError::FileNotFound);
        }

        touch_course(&mut tx, course_id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn find_file(&self, course_id: &str, file_id: &str) -> CourseResult<Option<CourseFile>> {
        let row = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM course_files WHERE course_id = ? AND id = ?"
        ))
        .bind(course_id)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(file_from_row).transpose()
    }

    /// Replace a file's allow-list
    pub async fn set_file_permissions(
        &self,
        course_id: &str,
        file_id: &str,
        allowed_users: Option<&[String]>,
    ) -> CourseResult<CourseFile> {
        let allowed = allowed_users.map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            "UPDATE course_files SET allowed_users = ? WHERE course_id = ? AND id = ?",
        )
        .bind(allowed)
        .bind(course_id)
        .bind(file_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CourseError::FileNotFound);
        }

        self.find_file(course_id, file_id)
            .await?
            .ok_or(CourseError::FileNotFound)
    }
}

async fn touch_course(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    course_id: &str,
) -> CourseResult<()> {
    sqlx::query("UPDATE courses SET updated_at = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(course_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn course_from_row(row: &SqliteRow, files: Vec<CourseFile>) -> CourseResult<Course> {
    Ok(Course {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        files,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn file_from_row(row: &SqliteRow) -> CourseResult<CourseFile> {
    let allowed: Option<String> = row.try_get("allowed_users")?;

    Ok(CourseFile {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        size: row.try_get("size")?,
        uploaded_at: row.try_get("uploaded_at")?,
        uploaded_by: row.try_get("uploaded_by")?,
        allowed_users: allowed.as_deref().map(serde_json::from_str).transpose()?,
    })
}
