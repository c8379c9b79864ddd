use crate::domain::error::DomainError;
use crate::domain::post::{GroupSummary, Post, PostDraft, PostEntry, PostScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

/// Admin console query over posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostSearch {
    /// Case-insensitive substring matched against text and author username.
    pub term: Option<String>,
    pub published_since: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, DomainError>;
    /// Newest first.
    async fn list(
        &self,
        scope: PostScope,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostEntry>, DomainError>;
    async fn count(&self, scope: PostScope) -> Result<u64, DomainError>;
    async fn update_post(
        &self,
        id: i64,
        author_id: Uuid,
        draft: PostDraft,
    ) -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;
    async fn search(&self, query: &PostSearch) -> Result<Vec<PostEntry>, DomainError>;
}

#[derive(Debug, sqlx::FromRow)]
struct PostEntryRow {
    id: i64,
    text: String,
    pub_date: DateTime<Utc>,
    author_id: Uuid,
    group_id: Option<i64>,
    author_username: String,
    group_slug: Option<String>,
    group_title: Option<String>,
}

impl From<PostEntryRow> for PostEntry {
    fn from(row: PostEntryRow) -> Self {
        let group = match (row.group_slug, row.group_title) {
            (Some(slug), Some(title)) => Some(GroupSummary { slug, title }),
            _ => None,
        };
        PostEntry {
            post: Post {
                id: row.id,
                text: row.text,
                pub_date: row.pub_date,
                author_id: row.author_id,
                group_id: row.group_id,
            },
            author: row.author_username,
            group,
        }
    }
}

const ENTRY_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.author_id, p.group_id,
           u.username AS author_username,
           g.slug AS group_slug, g.title AS group_title
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

fn scope_binds(scope: PostScope) -> (Option<i64>, Option<Uuid>) {
    match scope {
        PostScope::All => (None, None),
        PostScope::Group(group_id) => (Some(group_id), None),
        PostScope::Author(author_id) => (None, Some(author_id)),
    }
}

/// Escapes LIKE wildcards and wraps the term for a substring match.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let created = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (text, pub_date, author_id, group_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, text, pub_date, author_id, group_id
            "#,
        )
        .bind(&post.text)
        .bind(post.pub_date)
        .bind(post.author_id)
        .bind(post.group_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = created.id, author_id = %created.author_id, "post created");
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, text, pub_date, author_id, group_id
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, DomainError> {
        let sql = format!("{ENTRY_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostEntryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_entry {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })?;
        Ok(row.map(PostEntry::from))
    }

    async fn list(
        &self,
        scope: PostScope,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostEntry>, DomainError> {
        let (group_id, author_id) = scope_binds(scope);
        let sql = format!(
            r#"{ENTRY_SELECT}
            WHERE ($1::BIGINT IS NULL OR p.group_id = $1)
              AND ($2::UUID IS NULL OR p.author_id = $2)
            ORDER BY p.pub_date DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, PostEntryRow>(&sql)
            .bind(group_id)
            .bind(author_id)
            .bind(i64::from(limit))
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while fetching posts: {}", e);
                DomainError::Internal(e.to_string())
            })?;
        Ok(rows.into_iter().map(PostEntry::from).collect())
    }

    async fn count(&self, scope: PostScope) -> Result<u64, DomainError> {
        let (group_id, author_id) = scope_binds(scope);
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM posts p
            WHERE ($1::BIGINT IS NULL OR p.group_id = $1)
              AND ($2::UUID IS NULL OR p.author_id = $2)
            "#,
        )
        .bind(group_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while counting posts: {}", e);
            DomainError::Internal(e.to_string())
        })?;
        Ok(total.max(0) as u64)
    }

    async fn update_post(
        &self,
        id: i64,
        author_id: Uuid,
        draft: PostDraft,
    ) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET text = $1, group_id = $2
            WHERE id = $3 AND author_id = $4
            RETURNING id, text, pub_date, author_id, group_id
            "#,
        )
        .bind(&draft.text)
        .bind(draft.group_id)
        .bind(id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        if post.is_some() {
            info!(post_id = id, "post updated");
        }

        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(post_id = id, "post deleted");
        }
        Ok(removed)
    }

    async fn search(&self, query: &PostSearch) -> Result<Vec<PostEntry>, DomainError> {
        let pattern = query.term.as_deref().map(like_pattern);
        let sql = format!(
            r#"{ENTRY_SELECT}
            WHERE ($1::TEXT IS NULL OR p.text ILIKE $1 OR u.username ILIKE $1)
              AND ($2::TIMESTAMPTZ IS NULL OR p.pub_date >= $2)
            ORDER BY p.pub_date DESC, p.id DESC
            "#
        );
        let rows = sqlx::query_as::<_, PostEntryRow>(&sql)
            .bind(pattern)
            .bind(query.published_since)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while searching posts: {}", e);
                DomainError::Internal(e.to_string())
            })?;
        Ok(rows.into_iter().map(PostEntry::from).collect())
    }
}
