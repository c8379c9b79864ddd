//! In-memory repositories - used by tests and for running without PostgreSQL.
//!
//! One store backs all three repository traits so that deleting a user can
//! cascade to their posts and deleting a group can clear it from posts, the
//! way the database foreign keys do.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::data::group_repository::{GroupRepository, GroupSearch};
use crate::data::post_repository::{PostRepository, PostSearch};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::post::{GroupSummary, Post, PostDraft, PostEntry, PostScope};
use crate::domain::user::User;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: HashMap<i64, Group>,
    posts: HashMap<i64, Post>,
    next_group_id: i64,
    next_post_id: i64,
}

impl Tables {
    fn entry(&self, post: &Post) -> Option<PostEntry> {
        let author = self.users.get(&post.author_id)?;
        let group = post
            .group_id
            .and_then(|id| self.groups.get(&id))
            .map(|g| GroupSummary {
                slug: g.slug.clone(),
                title: g.title.clone(),
            });
        Some(PostEntry {
            post: post.clone(),
            author: author.username.clone(),
            group,
        })
    }

    /// Newest first, ties broken by id.
    fn sorted_entries<F>(&self, keep: F) -> Vec<PostEntry>
    where
        F: Fn(&Post, &User) -> bool,
    {
        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| {
                self.users
                    .get(&p.author_id)
                    .map(|u| keep(p, u))
                    .unwrap_or(false)
            })
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts.into_iter().filter_map(|p| self.entry(p)).collect()
    }
}

fn in_scope(post: &Post, scope: PostScope) -> bool {
    match scope {
        PostScope::All => true,
        PostScope::Group(group_id) => post.group_id == Some(group_id),
        PostScope::Author(author_id) => post.author_id == author_id,
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// In-memory store using HashMaps behind an async RwLock.
///
/// Data is lost on process restart.
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DomainError::UserAlreadyExists(user.username));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.posts.retain(|_, p| p.author_id != id);
        Ok(true)
    }
}

#[async_trait]
impl GroupRepository for InMemoryRepository {
    async fn create(&self, mut group: Group) -> Result<Group, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(DomainError::GroupAlreadyExists(group.slug));
        }
        tables.next_group_id += 1;
        group.id = tables.next_group_id;
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn search(&self, query: &GroupSearch) -> Result<Vec<Group>, DomainError> {
        let groups = GroupRepository::list(self).await?;
        Ok(groups
            .into_iter()
            .filter(|g| {
                query.term.as_deref().is_none_or(|t| {
                    contains_ci(&g.title, t)
                        || contains_ci(&g.slug, t)
                        || contains_ci(&g.description, t)
                })
            })
            .filter(|g| query.title.as_deref().is_none_or(|t| g.title == t))
            .filter(|g| query.slug.as_deref().is_none_or(|s| g.slug == s))
            .collect())
    }

    async fn update(&self, group: Group) -> Result<Option<Group>, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&group.id) {
            return Ok(None);
        }
        if tables
            .groups
            .values()
            .any(|g| g.slug == group.slug && g.id != group.id)
        {
            return Err(DomainError::GroupAlreadyExists(group.slug));
        }
        tables.groups.insert(group.id, group.clone());
        Ok(Some(group))
    }

    async fn delete(&self, id: i64) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&id).is_none() {
            return Ok(false);
        }
        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository {
    async fn create(&self, mut post: Post) -> Result<Post, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.author_id) {
            return Err(DomainError::UserNotFound(post.author_id));
        }
        if let Some(group_id) = post.group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(DomainError::GroupNotFound(group_id.to_string()));
            }
        }
        tables.next_post_id += 1;
        post.id = tables.next_post_id;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).and_then(|p| tables.entry(p)))
    }

    async fn list(
        &self,
        scope: PostScope,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostEntry>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sorted_entries(|p, _| in_scope(p, scope))
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, scope: PostScope) -> Result<u64, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().filter(|p| in_scope(p, scope)).count() as u64)
    }

    async fn update_post(
        &self,
        id: i64,
        author_id: Uuid,
        draft: PostDraft,
    ) -> Result<Option<Post>, DomainError> {
        let mut tables = self.tables.write().await;
        if let Some(group_id) = draft.group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(DomainError::GroupNotFound(group_id.to_string()));
            }
        }
        match tables.posts.get_mut(&id) {
            Some(post) if post.author_id == author_id => {
                post.text = draft.text;
                post.group_id = draft.group_id;
                Ok(Some(post.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.tables.write().await.posts.remove(&id).is_some())
    }

    async fn search(&self, query: &PostSearch) -> Result<Vec<PostEntry>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.sorted_entries(|p, author| {
            let term_ok = query
                .term
                .as_deref()
                .is_none_or(|t| contains_ci(&p.text, t) || contains_ci(&author.username, t));
            let date_ok = query.published_since.is_none_or(|since| p.pub_date >= since);
            term_ok && date_ok
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryRepository, User, Group) {
        let repo = InMemoryRepository::new();
        let user = UserRepository::create(
            &repo,
            User::new("alice".into(), String::new(), "hash".into()),
        )
        .await
        .unwrap();
        let group = GroupRepository::create(
            &repo,
            Group::new("Cats".into(), "cats".into(), "About cats".into()),
        )
        .await
        .unwrap();
        (repo, user, group)
    }

    #[tokio::test]
    async fn deleting_group_clears_it_from_posts() {
        let (repo, user, group) = seeded().await;
        let post = PostRepository::create(
            &repo,
            Post::new(user.id, "meow".into(), Some(group.id)),
        )
        .await
        .unwrap();

        assert!(GroupRepository::delete(&repo, group.id).await.unwrap());

        let stored = PostRepository::find_by_id(&repo, post.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.group_id, None);
        assert_eq!(stored.text, "meow");
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_posts() {
        let (repo, user, _) = seeded().await;
        PostRepository::create(&repo, Post::new(user.id, "one".into(), None))
            .await
            .unwrap();
        PostRepository::create(&repo, Post::new(user.id, "two".into(), None))
            .await
            .unwrap();

        assert!(UserRepository::delete(&repo, user.id).await.unwrap());
        assert_eq!(repo.count(PostScope::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let (repo, _, _) = seeded().await;
        let err = GroupRepository::create(
            &repo,
            Group::new("Other".into(), "cats".into(), String::new()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::GroupAlreadyExists(slug) if slug == "cats"));
    }

    #[tokio::test]
    async fn update_requires_matching_author() {
        let (repo, user, _) = seeded().await;
        let post = PostRepository::create(&repo, Post::new(user.id, "mine".into(), None))
            .await
            .unwrap();
        let draft = PostDraft {
            text: "stolen".into(),
            group_id: None,
        };

        let result = repo.update_post(post.id, Uuid::new_v4(), draft).await.unwrap();
        assert!(result.is_none());
        let stored = PostRepository::find_by_id(&repo, post.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.text, "mine");
    }

    #[tokio::test]
    async fn list_is_newest_first_and_windowed() {
        let (repo, user, _) = seeded().await;
        for i in 0..5 {
            PostRepository::create(&repo, Post::new(user.id, format!("post {i}"), None))
                .await
                .unwrap();
        }
        let page = PostRepository::list(&repo, PostScope::All, 2, 1)
            .await
            .unwrap();
        let texts: Vec<&str> = page.iter().map(|e| e.post.text.as_str()).collect();
        assert_eq!(texts, vec!["post 3", "post 2"]);
    }
}
