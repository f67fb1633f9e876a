use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Project record. `original_image_path` is written once by the first
/// upload; `processed_image_path` is the current asset and moves with every
/// transform. Both are opaque asset refs.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub original_image_path: Option<String>,
    pub processed_image_path: Option<String>,
    pub ai_title: Option<String>,
    pub ai_description: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const PROJECT_COLUMNS: &str = "id, user_id, name, original_image_path, processed_image_path, \
                               ai_title, ai_description, created_at, updated_at";

// Every query below filters by (id, user_id). Ownership is a filter, not a
// separate check: a foreign project and a missing one are both `None`.
impl Project {
    pub async fn create(db: &PgPool, user_id: Uuid, name: &str) -> sqlx::Result<Project> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (user_id, name)
            VALUES ($1, $2)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(name)
        .fetch_one(db)
        .await
    }

    /// Owner's projects, newest-created first.
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn get_owned(db: &PgPool, id: Uuid, user_id: Uuid) -> sqlx::Result<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Partial update: `None` keeps the stored value. Callers decide what
    /// becomes `None` (see `UpdateProjectRequest::name_update`).
    pub async fn update_fields(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        name: Option<&str>,
        ai_title: Option<&str>,
        ai_description: Option<&str>,
    ) -> sqlx::Result<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = COALESCE($3, name),
                ai_title = COALESCE($4, ai_title),
                ai_description = COALESCE($5, ai_description),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(ai_title)
        .bind(ai_description)
        .fetch_optional(db)
        .await
    }

    /// Record a fresh upload: the original ref is set only if still unset,
    /// the current ref always moves.
    pub async fn attach_upload(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        asset_ref: &str,
    ) -> sqlx::Result<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET original_image_path = COALESCE(original_image_path, $3),
                processed_image_path = $3,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(asset_ref)
        .fetch_optional(db)
        .await
    }

    /// Move the current pointer after a successful transform. The previous
    /// current asset is deliberately left in place.
    pub async fn set_processed(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        asset_ref: &str,
    ) -> sqlx::Result<Option<Project>> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET processed_image_path = $3,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(asset_ref)
        .fetch_optional(db)
        .await
    }

    /// Remove the record, handing back both asset refs so the caller can
    /// run the best-effort asset cleanup.
    pub async fn delete_owned(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> sqlx::Result<Option<(Option<String>, Option<String>)>> {
        sqlx::query_as::<_, (Option<String>, Option<String>)>(
            r#"
            DELETE FROM projects
            WHERE id = $1 AND user_id = $2
            RETURNING original_image_path, processed_image_path
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(db: &PgPool, email: &str) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(email)
        .fetch_one(db)
        .await
        .expect("seed user")
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn foreign_owner_sees_nothing(db: PgPool) {
        let owner = seed_user(&db, "owner@example.com").await;
        let other = seed_user(&db, "other@example.com").await;
        let project = Project::create(&db, owner, "Lamp").await.expect("create");

        assert!(Project::get_owned(&db, project.id, other)
            .await
            .expect("get")
            .is_none());
        assert!(
            Project::update_fields(&db, project.id, other, Some("Stolen"), None, None)
                .await
                .expect("update")
                .is_none()
        );
        assert!(Project::delete_owned(&db, project.id, other)
            .await
            .expect("delete")
            .is_none());

        // untouched for the actual owner
        let kept = Project::get_owned(&db, project.id, owner)
            .await
            .expect("get")
            .expect("still present");
        assert_eq!(kept.name, "Lamp");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn attach_upload_keeps_first_original(db: PgPool) {
        let owner = seed_user(&db, "owner@example.com").await;
        let project = Project::create(&db, owner, "Lamp").await.expect("create");

        let first = Project::attach_upload(&db, project.id, owner, "/uploads/first.jpg")
            .await
            .expect("attach")
            .expect("owned");
        assert_eq!(first.original_image_path.as_deref(), Some("/uploads/first.jpg"));
        assert_eq!(first.processed_image_path.as_deref(), Some("/uploads/first.jpg"));

        let second = Project::attach_upload(&db, project.id, owner, "/uploads/second.jpg")
            .await
            .expect("attach")
            .expect("owned");
        assert_eq!(second.original_image_path.as_deref(), Some("/uploads/first.jpg"));
        assert_eq!(second.processed_image_path.as_deref(), Some("/uploads/second.jpg"));

        let moved = Project::set_processed(&db, project.id, owner, "/uploads/nobg.png")
            .await
            .expect("set_processed")
            .expect("owned");
        assert_eq!(moved.original_image_path.as_deref(), Some("/uploads/first.jpg"));
        assert_eq!(moved.processed_image_path.as_deref(), Some("/uploads/nobg.png"));
    }
}
