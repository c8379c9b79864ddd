//! Record management behind the administrative console.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use slug::slugify;
use tracing::{info, instrument};

use crate::application::forms::validate_username;
use crate::data::group_repository::{GroupRepository, GroupSearch};
use crate::data::post_repository::{PostRepository, PostSearch};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::group::{Group, TITLE_MAX_LEN, is_valid_slug};
use crate::domain::post::{PostEntry, PostScope};
use crate::domain::user::User;
use crate::infrastructure::security::hash_password;

/// Shown in listings where a value is missing.
pub const EMPTY_VALUE: &str = "-empty-";

/// Filter on a post's publication date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishedFilter {
    #[default]
    Any,
    Today,
    PastWeek,
    ThisMonth,
    ThisYear,
}

impl PublishedFilter {
    /// Lower bound of `pub_date` relative to `now`, at midnight UTC.
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let start = match self {
            PublishedFilter::Any => return None,
            PublishedFilter::Today => today,
            PublishedFilter::PastWeek => today - Duration::days(7),
            PublishedFilter::ThisMonth => today.with_day(1)?,
            PublishedFilter::ThisYear => today.with_ordinal(1)?,
        };
        Some(start.and_time(NaiveTime::MIN).and_utc())
    }
}

impl FromStr for PublishedFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(PublishedFilter::Any),
            "today" => Ok(PublishedFilter::Today),
            "week" => Ok(PublishedFilter::PastWeek),
            "month" => Ok(PublishedFilter::ThisMonth),
            "year" => Ok(PublishedFilter::ThisYear),
            other => Err(format!(
                "unknown date filter `{other}` (expected any, today, week, month or year)"
            )),
        }
    }
}

impl fmt::Display for PublishedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishedFilter::Any => "any",
            PublishedFilter::Today => "today",
            PublishedFilter::PastWeek => "week",
            PublishedFilter::ThisMonth => "month",
            PublishedFilter::ThisYear => "year",
        };
        f.write_str(name)
    }
}

/// Fields of a group to change; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct GroupChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct AdminService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
}

fn check_group(group: &Group) -> Result<(), DomainError> {
    if group.title.trim().is_empty() {
        return Err(DomainError::Validation("title must not be empty".into()));
    }
    if group.title.chars().count() > TITLE_MAX_LEN {
        return Err(DomainError::Validation(format!(
            "title must be at most {TITLE_MAX_LEN} characters"
        )));
    }
    if !is_valid_slug(&group.slug) {
        return Err(DomainError::Validation(format!(
            "invalid slug `{}`: use letters, digits, hyphens or underscores",
            group.slug
        )));
    }
    Ok(())
}

impl AdminService {
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

    async fn group_by_slug(&self, slug: &str) -> Result<Group, DomainError> {
        self.groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))
    }

    /// Creates a group. Without an explicit slug one is derived from the title.
    #[instrument(skip(self, description))]
    pub async fn create_group(
        &self,
        title: String,
        slug: Option<String>,
        description: String,
    ) -> Result<Group, DomainError> {
        let slug = slug.unwrap_or_else(|| slugify(&title));
        let group = Group::new(title.trim().to_string(), slug, description);
        check_group(&group)?;
        self.groups.create(group).await
    }

    #[instrument(skip(self, changes))]
    pub async fn edit_group(&self, slug: &str, changes: GroupChanges) -> Result<Group, DomainError> {
        let mut group = self.group_by_slug(slug).await?;
        if let Some(title) = changes.title {
            group.title = title.trim().to_string();
        }
        if let Some(new_slug) = changes.slug {
            group.slug = new_slug;
        }
        if let Some(description) = changes.description {
            group.description = description;
        }
        check_group(&group)?;
        self.groups
            .update(group)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))
    }

    /// Deletes a group; its posts remain without a group. Returns the group
    /// and how many posts lost it.
    #[instrument(skip(self))]
    pub async fn delete_group(&self, slug: &str) -> Result<(Group, u64), DomainError> {
        let group = self.group_by_slug(slug).await?;
        let orphaned = self.posts.count(PostScope::Group(group.id)).await?;
        if !self.groups.delete(group.id).await? {
            return Err(DomainError::GroupNotFound(slug.to_string()));
        }
        info!(slug = %group.slug, orphaned, "group removed from console");
        Ok((group, orphaned))
    }

    pub async fn list_groups(&self, query: &GroupSearch) -> Result<Vec<Group>, DomainError> {
        self.groups.search(query).await
    }

    pub async fn list_posts(
        &self,
        term: Option<String>,
        published: PublishedFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<PostEntry>, DomainError> {
        let query = PostSearch {
            term: term.filter(|t| !t.trim().is_empty()),
            published_since: published.since(now),
        };
        self.posts.search(&query).await
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: i64) -> Result<(), DomainError> {
        if self.posts.delete_post(id).await? {
            Ok(())
        } else {
            Err(DomainError::PostNotFound(id))
        }
    }

    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User, DomainError> {
        validate_username(&username).map_err(DomainError::Validation)?;
        if password.is_empty() {
            return Err(DomainError::Validation("password must not be empty".into()));
        }
        let hash =
            hash_password(&password).map_err(|err| DomainError::Internal(err.to_string()))?;
        self.users
            .create(User::new(username, email.to_lowercase(), hash))
            .await
    }

    /// Deletes a user together with their posts. Returns how many posts went
    /// with them.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, username: &str) -> Result<u64, DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UsernameNotFound(username.to_string()))?;
        let posts = self.posts.count(PostScope::Author(user.id)).await?;
        if !self.users.delete(user.id).await? {
            return Err(DomainError::UsernameNotFound(username.to_string()));
        }
        Ok(posts)
    }
}

/// Renders an optional value for console output.
pub fn display_or_empty(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => EMPTY_VALUE,
    }
}
