//! Console commands run against the backend services.

use std::io::Write;

use anyhow::Context;
use tutorhub_database::{Course, CreateCourseRequest, User};
use tutorhub_runtime::BackendServices;

pub async fn create_course(
    services: &BackendServices,
    id: &str,
    name: &str,
    description: &str,
) -> anyhow::Result<Course> {
    services
        .courses
        .create_course(CreateCourseRequest {
            id: id.trim().to_string(),
            name: name.trim().to_string(),
            description: description.trim().to_string(),
        })
        .await
        .with_context(|| format!("failed to create course '{id}'"))
}

/// Removes the course, its file entries and its stored files.
pub async fn delete_course(services: &BackendServices, id: &str) -> anyhow::Result<()> {
    services
        .courses
        .delete_course(id)
        .await
        .with_context(|| format!("failed to delete course '{id}'"))
}

pub async fn promote_admin(services: &BackendServices, email: &str) -> anyhow::Result<User> {
    services
        .users
        .promote_admin(email)
        .await
        .with_context(|| format!("failed to promote '{email}'"))
}

pub async fn dump_data(services: &BackendServices, out: &mut impl Write) -> anyhow::Result<()> {
    let users = services
        .users
        .list_users(None)
        .await
        .context("failed to fetch users")?;

    writeln!(out, "=== USERS ===")?;
    if users.is_empty() {
        writeln!(out, "No users found in database")?;
    } else {
        writeln!(out, "Found {} users:", users.len())?;
        writeln!(
            out,
            "{:<26} {:<20} {:<30} {:<10} {:<10} {:<30}",
            "Public ID", "Name", "Email", "Role", "Status", "Courses"
        )?;
        writeln!(out, "{}", "-".repeat(130))?;
        for user in users {
            writeln!(
                out,
                "{:<26} {:<20} {:<30} {:<10} {:<10} {:<30}",
                user.public_id,
                user.name,
                user.email,
                user.role,
                user.status,
                user.assigned_courses.join(",")
            )?;
        }
    }

    let courses = services
        .courses
        .repository()
        .list()
        .await
        .context("failed to fetch courses")?;

    writeln!(out, "\n=== COURSES ===")?;
    if courses.is_empty() {
        writeln!(out, "No courses found in database")?;
    }
    for course in courses {
        writeln!(out, "{} ({}): {} files", course.id, course.name, course.files.len())?;
        for file in course.files {
            let allowed = file
                .allowed_users
                .map(|ids| ids.join(","))
                .unwrap_or_else(|| "admins only".to_string());
            writeln!(
                out,
                "  {:<40} {:>10} bytes  by {:<26} visible to: {}",
                file.id, file.size, file.uploaded_by, allowed
            )?;
        }
    }

    let entries = services
        .waitlist
        .list()
        .await
        .context("failed to fetch waitlist")?;

    writeln!(out, "\n=== WAITLIST ===")?;
    if entries.is_empty() {
        writeln!(out, "No waitlist entries found in database")?;
    }
    for entry in entries {
        writeln!(
            out,
            "{:<26} {:<10} {:<14} {:<20} {:<30} {}",
            entry.id,
            entry.status,
            entry.source,
            entry.name,
            entry.email,
            entry.created_at
        )?;
    }

    Ok(())
}
