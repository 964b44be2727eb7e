use bytes::Bytes;
use tempfile::TempDir;
use tutorhub_config::DatabaseConfig;
use tutorhub_courses::{
    course_file_key, CourseService, CourseServiceError, FileUpload, LocalBlobStore,
};
use tutorhub_database::{
    initialize_database, CourseRepository, CreateCourseRequest, Role, User, UserStatus,
};

struct TestContext {
    service: CourseService<LocalBlobStore>,
    blob_dir: TempDir,
    _db_dir: TempDir,
}

impl TestContext {
    async fn new() -> Self {
        let db_dir = TempDir::new().unwrap();
        let blob_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_dir.path().join("courses.db").display()),
            max_connections: 2,
        };
        let pool = initialize_database(&config).await.unwrap();
        let service = CourseService::new(
            CourseRepository::new(pool),
            LocalBlobStore::new(blob_dir.path()),
            1024,
        );

        for id in ["algebra", "biology"] {
            service
                .create_course(CreateCourseRequest {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    description: String::new(),
                })
                .await
                .unwrap();
        }

        Self {
            service,
            blob_dir,
            _db_dir: db_dir,
        }
    }
}

fn user(public_id: &str, role: Role, courses: &[&str]) -> User {
    User {
        id: 1,
        public_id: public_id.to_string(),
        name: public_id.to_string(),
        email: format!("{public_id}@example.com"),
        role,
        status: UserStatus::Active,
        assigned_courses: courses.iter().map(|c| c.to_string()).collect(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn upload(name: &str, allowed: Option<Vec<&str>>) -> FileUpload {
    FileUpload {
        file_name: name.to_string(),
        data: Bytes::from_static(b"worksheet"),
        allowed_users: allowed.map(|ids| ids.into_iter().map(String::from).collect()),
    }
}

#[tokio::test]
async fn upload_writes_blob_then_entry() {
    let ctx = TestContext::new().await;
    let admin = user("admin", Role::Admin, &[]);

    let file = ctx
        .service
        .upload_file(&admin, "algebra", upload("week1.pdf", Some(vec!["s1"])))
        .await
        .unwrap();

    let (millis, name) = file.id.split_once('_').unwrap();
    assert!(millis.parse::<i64>().is_ok());
    assert_eq!(name, "week1.pdf");
    assert_eq!(file.size, 9);
    assert_eq!(file.uploaded_by, "admin");
    assert_eq!(file.url, format!("/api/courses/algebra/files/{}/download", file.id));
    assert!(ctx
        .blob_dir
        .path()
        .join(course_file_key("algebra", &file.id))
        .exists());

    let view = ctx.service.course_for(&admin, "algebra").await.unwrap();
    assert!(view.can_manage);
    assert_eq!(view.course.files, vec![file]);
}

#[tokio::test]
async fn upload_rules() {
    let ctx = TestContext::new().await;
    let admin = user("admin", Role::Admin, &[]);
    let student = user("s1", Role::Student, &["algebra"]);

    let err = ctx
        .service
        .upload_file(&student, "algebra", upload("a.pdf", None))
        .await
        .unwrap_err();
    assert!(matches!(err, CourseServiceError::Forbidden));

    let err = ctx
        .service
        .upload_file(&admin, "missing", upload("a.pdf", None))
        .await
        .unwrap_err();
    assert!(matches!(err, CourseServiceError::CourseNotFound));

    let big = FileUpload {
        file_name: "big.bin".into(),
        data: Bytes::from(vec![0u8; 2048]),
        allowed_users: None,
    };
    let err = ctx.service.upload_file(&admin, "algebra", big).await.unwrap_err();
    assert!(matches!(err, CourseServiceError::TooLarge { limit: 1024 }));
}

#[tokio::test]
async fn students_see_only_allow_listed_files() {
    let ctx = TestContext::new().await;
    let admin = user("admin", Role::Admin, &[]);
    let s1 = user("s1", Role::Student, &["algebra"]);
    let s2 = user("s2", Role::Student, &["algebra"]);

    let shared = ctx
        .service
        .upload_file(&admin, "algebra", upload("shared.pdf", Some(vec!["s1", "s2"])))
        .await
        .unwrap();
    let private = ctx
        .service
        .upload_file(&admin, "algebra", upload("s1-only.pdf", Some(vec!["s1"])))
        .await
        .unwrap();
    ctx.service
        .upload_file(&admin, "algebra", upload("admin-only.pdf", None))
        .await
        .unwrap();
    ctx.service
        .upload_file(&admin, "algebra", upload("empty-list.pdf", Some(vec![])))
        .await
        .unwrap();

    let s1_files: Vec<_> = ctx
        .service
        .course_for(&s1, "algebra")
        .await
        .unwrap()
        .course
        .files
        .into_iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(s1_files, vec![shared.id.clone(), private.id.clone()]);

    let s2_view = ctx.service.course_for(&s2, "algebra").await.unwrap();
    assert!(!s2_view.can_manage);
    assert_eq!(s2_view.course.files.len(), 1);

    let admin_view = ctx.service.course_for(&admin, "algebra").await.unwrap();
    assert_eq!(admin_view.course.files.len(), 4);

    let err = ctx.service.download(&s2, "algebra", &private.id).await.unwrap_err();
    assert!(matches!(err, CourseServiceError::Forbidden));

    let (file, data) = ctx.service.download(&s1, "algebra", &private.id).await.unwrap();
    assert_eq!(file.id, private.id);
    assert_eq!(data, Bytes::from_static(b"worksheet"));
}

#[tokio::test]
async fn unassigned_students_are_denied() {
    let ctx = TestContext::new().await;
    let student = user("s1", Role::Student, &["biology"]);
    let pending = user("p1", Role::Pending, &[]);

    let err = ctx.service.course_for(&student, "algebra").await.unwrap_err();
    assert!(matches!(err, CourseServiceError::Forbidden));

    let err = ctx.service.course_for(&student, "chemistry").await.unwrap_err();
    assert!(matches!(err, CourseServiceError::CourseNotFound));

    assert!(matches!(
        ctx.service.list_for(&pending).await.unwrap_err(),
        CourseServiceError::Forbidden
    ));

    let listed = ctx.service.list_for(&student).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|v| v.course.id.as_str()).collect();
    assert_eq!(ids, vec!["biology"]);
}

#[tokio::test]
async fn permissions_can_be_replaced() {
    let ctx = TestContext::new().await;
    let admin = user("admin", Role::Admin, &[]);
    let s1 = user("s1", Role::Student, &["algebra"]);

    let file = ctx
        .service
        .upload_file(&admin, "algebra", upload("notes.pdf", None))
        .await
        .unwrap();
    assert!(ctx.service.download(&s1, "algebra", &file.id).await.is_err());

    let updated = ctx
        .service
        .set_permissions("algebra", &file.id, Some(vec!["s1".into()]))
        .await
        .unwrap();
    assert_eq!(updated.allowed_users, Some(vec!["s1".to_string()]));
    assert!(ctx.service.download(&s1, "algebra", &file.id).await.is_ok());

    let err = ctx
        .service
        .set_permissions("algebra", "nope", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CourseServiceError::FileNotFound));
}

#[tokio::test]
async fn delete_removes_blob_and_entry() {
    let ctx = TestContext::new().await;
    let admin = user("admin", Role::Admin, &[]);

    let file = ctx
        .service
        .upload_file(&admin, "algebra", upload("notes.pdf", None))
        .await
        .unwrap();

    ctx.service.delete_file("algebra", &file.id).await.unwrap();

    let view = ctx.service.course_for(&admin, "algebra").await.unwrap();
    assert!(view.course.files.is_empty());
    assert!(!ctx
        .blob_dir
        .path()
        .join(course_file_key("algebra", &file.id))
        .exists());

    let err = ctx.service.delete_file("algebra", &file.id).await.unwrap_err();
    assert!(matches!(err, CourseServiceError::FileNotFound));
}

#[tokio::test]
async fn failed_entry_removal_leaves_dangling_reference() {
    let ctx = TestContext::new().await;
    let admin = user("admin", Role::Admin, &[]);

    let file = ctx
        .service
        .upload_file(&admin, "algebra", upload("notes.pdf", None))
        .await
        .unwrap();

    sqlx::query(
        "CREATE TRIGGER block_file_delete BEFORE DELETE ON course_files BEGIN SELECT RAISE(ABORT, 'entry locked'); END",
    )
    .execute(ctx.service.repository().pool())
    .await
    .unwrap();

    let err = ctx.service.delete_file("algebra", &file.id).await.unwrap_err();
    assert!(matches!(err, CourseServiceError::Repository(_)));

    let key = course_file_key("algebra", &file.id);
    assert!(!ctx.blob_dir.path().join(&key).exists(), "blob is already gone");

    let view = ctx.service.course_for(&admin, "algebra").await.unwrap();
    assert_eq!(view.course.files.len(), 1, "entry still references the blob");

    let err = ctx.service.download(&admin, "algebra", &file.id).await.unwrap_err();
    assert!(matches!(err, CourseServiceError::FileNotFound));
}

#[tokio::test]
async fn deleting_course_removes_blobs() {
    let ctx = TestContext::new().await;
    let admin = user("admin", Role::Admin, &[]);

    ctx.service
        .upload_file(&admin, "biology", upload("cells.pdf", None))
        .await
        .unwrap();

    ctx.service.delete_course("biology").await.unwrap();

    assert!(!ctx.blob_dir.path().join("courses/biology").exists());
    assert!(matches!(
        ctx.service.course_for(&admin, "biology").await.unwrap_err(),
        CourseServiceError::CourseNotFound
    ));
}

#[tokio::test]
async fn dot_course_ids_are_rejected_and_other_blobs_survive() {
    let ctx = TestContext::new().await;
    let admin = user("admin", Role::Admin, &[]);

    let file = ctx
        .service
        .upload_file(&admin, "algebra", upload("notes.pdf", None))
        .await
        .unwrap();

    for id in [".", ".."] {
        let err = ctx
            .service
            .create_course(CreateCourseRequest {
                id: id.to_string(),
                name: "Dots".to_string(),
                description: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CourseServiceError::InvalidInput(_)), "{id}");
    }

    assert!(ctx.service.delete_course(".").await.is_err());
    assert!(ctx
        .blob_dir
        .path()
        .join(course_file_key("algebra", &file.id))
        .exists());
}
