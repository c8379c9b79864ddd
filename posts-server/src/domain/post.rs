use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters of a post's text shown in its short representation.
pub const SHORT_TEXT_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
}

impl Post {
    /// Builds a post that has not been stored yet. The id is assigned by the
    /// repository; `pub_date` is fixed here and never changes afterwards.
    pub fn new(author_id: Uuid, text: String, group_id: Option<i64>) -> Self {
        Self {
            id: 0,
            text,
            pub_date: Utc::now(),
            author_id,
            group_id,
        }
    }
}

/// The mutable part of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub slug: String,
    pub title: String,
}

/// A post together with what listings need to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostEntry {
    pub post: Post,
    pub author: String,
    pub group: Option<GroupSummary>,
}

impl PostEntry {
    pub fn short_text(&self) -> String {
        self.post.text.chars().take(SHORT_TEXT_LEN).collect()
    }

    pub fn pub_date_display(&self) -> String {
        self.post.pub_date.format("%d %b %Y").to_string()
    }
}

impl fmt::Display for PostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = self
            .group
            .as_ref()
            .map(|g| g.title.as_str())
            .unwrap_or("None");
        write!(
            f,
            "{} {} {} {}",
            self.post.pub_date,
            self.author,
            group,
            self.short_text()
        )
    }
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, group: Option<GroupSummary>) -> PostEntry {
        PostEntry {
            post: Post::new(Uuid::new_v4(), text.to_string(), None),
            author: "testuser".to_string(),
            group,
        }
    }

    #[test]
    fn display_truncates_text_to_fifty_chars() {
        let text = "я".repeat(80);
        let e = entry(&text, None);
        let rendered = e.to_string();
        let expected = format!("{} testuser None {}", e.post.pub_date, "я".repeat(50));
        assert_eq!(rendered, expected);
    }

    #[test]
    fn display_includes_group_title() {
        let e = entry(
            "hello",
            Some(GroupSummary {
                slug: "cats".into(),
                title: "Cats".into(),
            }),
        );
        assert!(e.to_string().ends_with("testuser Cats hello"));
    }

    #[test]
    fn new_post_has_no_id_yet() {
        let post = Post::new(Uuid::new_v4(), "text".into(), Some(3));
        assert_eq!(post.id, 0);
        assert_eq!(post.group_id, Some(3));
    }
}
