use std::fmt;

use serde::{Deserialize, Serialize};

pub const TITLE_MAX_LEN: usize = 200;
pub const SLUG_MAX_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub fn new(title: String, slug: String, description: String) -> Self {
        Self {
            id: 0,
            title,
            slug,
            description,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Returns true when `slug` only holds ASCII letters, digits, hyphens and
/// underscores.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= SLUG_MAX_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_title() {
        let group = Group::new(
            "Test group title".into(),
            "testgroup".into(),
            "Description".into(),
        );
        assert_eq!(group.to_string(), "Test group title");
    }

    #[test]
    fn slug_validation() {
        assert!(is_valid_slug("test-slug_2"));
        assert!(!is_valid_slug(""));
        assert!(is_valid_slug("Test-Group"));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("café"));
        assert!(!is_valid_slug(&"a".repeat(SLUG_MAX_LEN + 1)));
    }
}
