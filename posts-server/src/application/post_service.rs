use std::sync::Arc;

use crate::application::pagination::{POSTS_PER_PAGE, Page, Paginator};
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::group::Group;
use crate::domain::post::{Post, PostDraft, PostEntry, PostScope};
use crate::domain::user::User;
use crate::domain::error::DomainError;
use tracing::instrument;
use uuid::Uuid;

/// One page of posts, newest first.
#[derive(Debug, Clone)]
pub struct Listing {
    pub entries: Vec<PostEntry>,
    pub page: Page,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub author: User,
    pub post_count: u64,
    pub listing: Listing,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub entry: PostEntry,
    pub author: User,
    pub author_post_count: u64,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
        }
    }

    async fn listing(&self, scope: PostScope, page: Option<&str>) -> Result<Listing, DomainError> {
        let total = self.posts.count(scope).await?;
        let page = Paginator::new(total, POSTS_PER_PAGE).get_page(page);
        let entries = self
            .posts
            .list(scope, page.limit(), page.offset())
            .await?;
        Ok(Listing { entries, page })
    }

    pub async fn feed(&self, page: Option<&str>) -> Result<Listing, DomainError> {
        self.listing(PostScope::All, page).await
    }

    pub async fn group_feed(
        &self,
        slug: &str,
        page: Option<&str>,
    ) -> Result<(Group, Listing), DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))?;
        let listing = self.listing(PostScope::Group(group.id), page).await?;
        Ok((group, listing))
    }

    async fn user_by_name(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UsernameNotFound(username.to_string()))
    }

    pub async fn profile(&self, username: &str, page: Option<&str>) -> Result<Profile, DomainError> {
        let author = self.user_by_name(username).await?;
        let listing = self.listing(PostScope::Author(author.id), page).await?;
        Ok(Profile {
            post_count: listing.page.total,
            author,
            listing,
        })
    }

    /// Resolves a post addressed as `/{username}/{post_id}/`. A post that does
    /// not belong to `username` is reported as missing.
    pub async fn post_detail(&self, username: &str, post_id: i64) -> Result<PostDetail, DomainError> {
        let entry = self
            .posts
            .find_entry(post_id)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))?;
        let author = self.user_by_name(username).await?;
        if entry.post.author_id != author.id {
            return Err(DomainError::PostNotFound(post_id));
        }
        let author_post_count = self.posts.count(PostScope::Author(author.id)).await?;
        Ok(PostDetail {
            entry,
            author,
            author_post_count,
        })
    }

    pub async fn groups(&self) -> Result<Vec<Group>, DomainError> {
        self.groups.list().await
    }

    #[instrument(skip(self, draft))]
    pub async fn create_post(&self, author_id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        let post = Post::new(author_id, draft.text, draft.group_id);
        self.posts.create(post).await
    }

    /// Loads a post for editing by `requester`. Fails with `Forbidden` when
    /// the requester is not its author.
    pub async fn post_for_edit(
        &self,
        requester: Uuid,
        username: &str,
        post_id: i64,
    ) -> Result<Post, DomainError> {
        let detail = self.post_detail(username, post_id).await?;
        if detail.entry.post.author_id != requester {
            return Err(DomainError::Forbidden);
        }
        Ok(detail.entry.post)
    }

    /// Applies `draft` to the text and group of a post. `pub_date` and the
    /// author never change.
    #[instrument(skip(self, draft))]
    pub async fn edit_post(
        &self,
        requester: Uuid,
        username: &str,
        post_id: i64,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        self.post_for_edit(requester, username, post_id).await?;
        match self.posts.update_post(post_id, requester, draft).await {
            Ok(Some(post)) => Ok(post),
            Ok(None) => Err(DomainError::PostNotFound(post_id)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryRepository;

    struct Fixture {
        service: PostService,
        alice: User,
        bob: User,
        cats: Group,
        dogs: Group,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryRepository::new());
        let alice = UserRepository::create(
            repo.as_ref(),
            User::new("alice".into(), String::new(), "x".into()),
        )
        .await
        .unwrap();
        let bob = UserRepository::create(
            repo.as_ref(),
            User::new("bob".into(), String::new(), "x".into()),
        )
        .await
        .unwrap();
        let cats = GroupRepository::create(
            repo.as_ref(),
            Group::new("Cats".into(), "cats".into(), String::new()),
        )
        .await
        .unwrap();
        let dogs = GroupRepository::create(
            repo.as_ref(),
            Group::new("Dogs".into(), "dogs".into(), String::new()),
        )
        .await
        .unwrap();
        let service = PostService::new(repo.clone(), repo.clone(), repo);
        Fixture {
            service,
            alice,
            bob,
            cats,
            dogs,
        }
    }

    fn draft(text: &str, group_id: Option<i64>) -> PostDraft {
        PostDraft {
            text: text.to_string(),
            group_id,
        }
    }

    #[tokio::test]
    async fn create_adds_exactly_one_post() {
        let f = fixture().await;
        let before = f.service.feed(None).await.unwrap().page.total;
        let post = f
            .service
            .create_post(f.alice.id, draft("Test text", None))
            .await
            .unwrap();
        let listing = f.service.feed(None).await.unwrap();
        assert_eq!(listing.page.total, before + 1);
        assert_eq!(listing.entries[0].post.id, post.id);
        assert_eq!(listing.entries[0].post.text, "Test text");
        assert_eq!(listing.entries[0].author, "alice");
    }

    #[tokio::test]
    async fn author_edit_changes_only_text_and_group() {
        let f = fixture().await;
        let original = f
            .service
            .create_post(f.alice.id, draft("before", None))
            .await
            .unwrap();

        let edited = f
            .service
            .edit_post(f.alice.id, "alice", original.id, draft("after", Some(f.cats.id)))
            .await
            .unwrap();

        assert_eq!(edited.text, "after");
        assert_eq!(edited.group_id, Some(f.cats.id));
        assert_eq!(edited.pub_date, original.pub_date);
        assert_eq!(edited.author_id, original.author_id);
    }

    #[tokio::test]
    async fn non_author_edit_is_forbidden_and_changes_nothing() {
        let f = fixture().await;
        let original = f
            .service
            .create_post(f.alice.id, draft("mine", None))
            .await
            .unwrap();

        let err = f
            .service
            .edit_post(f.bob.id, "alice", original.id, draft("hijacked", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        let detail = f.service.post_detail("alice", original.id).await.unwrap();
        assert_eq!(detail.entry.post, original);
    }

    #[tokio::test]
    async fn group_listings_are_disjoint() {
        let f = fixture().await;
        f.service
            .create_post(f.alice.id, draft("cat post", Some(f.cats.id)))
            .await
            .unwrap();
        f.service
            .create_post(f.bob.id, draft("dog post", Some(f.dogs.id)))
            .await
            .unwrap();

        let (_, cats) = f.service.group_feed("cats", None).await.unwrap();
        let (_, dogs) = f.service.group_feed("dogs", None).await.unwrap();
        assert_eq!(cats.entries.len(), 1);
        assert_eq!(cats.entries[0].post.text, "cat post");
        assert_eq!(dogs.entries.len(), 1);
        assert_eq!(dogs.entries[0].post.text, "dog post");
    }

    #[tokio::test]
    async fn pages_hold_at_most_ten_posts() {
        let f = fixture().await;
        for i in 0..23 {
            f.service
                .create_post(f.alice.id, draft(&format!("post {i}"), None))
                .await
                .unwrap();
        }
        let first = f.service.feed(None).await.unwrap();
        assert_eq!(first.entries.len(), 10);
        assert_eq!(first.page.num_pages, 3);
        let last = f.service.feed(Some("3")).await.unwrap();
        assert_eq!(last.entries.len(), 3);

        let profile = f.service.profile("alice", Some("2")).await.unwrap();
        assert_eq!(profile.post_count, 23);
        assert_eq!(profile.listing.entries.len(), 10);
    }

    #[tokio::test]
    async fn missing_resources_are_not_found() {
        let f = fixture().await;
        assert!(f.service.group_feed("nope", None).await.unwrap_err().is_not_found());
        assert!(f.service.profile("nobody", None).await.unwrap_err().is_not_found());
        assert!(f.service.post_detail("alice", 999).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn post_under_wrong_username_is_not_found() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(f.alice.id, draft("hello", None))
            .await
            .unwrap();
        let err = f.service.post_detail("bob", post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(id) if id == post.id));
    }

    #[tokio::test]
    async fn detail_counts_author_posts() {
        let f = fixture().await;
        let post = f
            .service
            .create_post(f.alice.id, draft("one", None))
            .await
            .unwrap();
        f.service
            .create_post(f.alice.id, draft("two", None))
            .await
            .unwrap();
        let detail = f.service.post_detail("alice", post.id).await.unwrap();
        assert_eq!(detail.author_post_count, 2);
        assert_eq!(detail.author.username, "alice");
    }
}
