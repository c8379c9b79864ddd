use crate::data::post_repository::like_pattern;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

/// Admin console query over groups. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSearch {
    /// Case-insensitive substring matched against title, slug and description.
    pub term: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn create(&self, group: Group) -> Result<Group, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError>;
    /// Ordered by title.
    async fn list(&self) -> Result<Vec<Group>, DomainError>;
    async fn search(&self, query: &GroupSearch) -> Result<Vec<Group>, DomainError>;
    async fn update(&self, group: Group) -> Result<Option<Group>, DomainError>;
    /// Posts of a deleted group stay, with their group cleared.
    async fn delete(&self, id: i64) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresGroupRepository {
    pool: PgPool,
}

impl PostgresGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error, slug: &str) -> DomainError {
    if e.as_database_error()
        .and_then(|db| db.constraint())
        .map(|c| c.contains("slug"))
        == Some(true)
    {
        DomainError::GroupAlreadyExists(slug.to_string())
    } else {
        error!("failed to write group {}: {}", slug, e);
        DomainError::Internal(format!("database error: {}", e))
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn create(&self, group: Group) -> Result<Group, DomainError> {
        let created = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO post_groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &group.slug))?;

        info!(group_id = created.id, slug = %created.slug, "group created");
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find group {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find group by slug {}: {}", slug, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while listing groups: {}", e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn search(&self, query: &GroupSearch) -> Result<Vec<Group>, DomainError> {
        let pattern = query.term.as_deref().map(like_pattern);
        sqlx::query_as::<_, Group>(
            r#"
            SELECT id, title, slug, description FROM post_groups
            WHERE ($1::TEXT IS NULL
                   OR title ILIKE $1 OR slug ILIKE $1 OR description ILIKE $1)
              AND ($2::TEXT IS NULL OR title = $2)
              AND ($3::TEXT IS NULL OR slug = $3)
            ORDER BY title, id
            "#,
        )
        .bind(pattern)
        .bind(query.title.as_deref())
        .bind(query.slug.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while searching groups: {}", e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn update(&self, group: Group) -> Result<Option<Group>, DomainError> {
        let updated = sqlx::query_as::<_, Group>(
            r#"
            UPDATE post_groups
            SET title = $1, slug = $2, description = $3
            WHERE id = $4
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .bind(group.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &group.slug))?;

        if updated.is_some() {
            info!(group_id = group.id, "group updated");
        }
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM post_groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(group_id = id, "group deleted");
        }
        Ok(removed)
    }
}
