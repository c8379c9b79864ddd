//! Form binding and validation for the HTML pages.

use serde::Deserialize;

use crate::domain::group::Group;
use crate::domain::post::{Post, PostDraft};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

pub const TEXT_LABEL: &str = "Post text";
pub const TEXT_HELP: &str = "Enter text";
pub const GROUP_LABEL: &str = "Group";
pub const GROUP_HELP: &str = "Choose a group";

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Raw urlencoded body of the post form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFormInput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupChoice {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFormErrors {
    pub text: Vec<String>,
    pub group: Vec<String>,
}

impl PostFormErrors {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.group.is_empty()
    }
}

/// The post form as rendered: bound values, group choices and field errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
    pub text: String,
    pub group: Option<i64>,
    pub choices: Vec<GroupChoice>,
    pub errors: PostFormErrors,
}

impl PostForm {
    pub fn blank(groups: &[Group]) -> Self {
        Self::with_values(String::new(), None, groups)
    }

    pub fn for_post(post: &Post, groups: &[Group]) -> Self {
        Self::with_values(post.text.clone(), post.group_id, groups)
    }

    fn with_values(text: String, group: Option<i64>, groups: &[Group]) -> Self {
        let choices = groups
            .iter()
            .map(|g| GroupChoice {
                id: g.id,
                title: g.title.clone(),
                selected: Some(g.id) == group,
            })
            .collect();
        Self {
            text,
            group,
            choices,
            errors: PostFormErrors::default(),
        }
    }

    /// Validates a submission. On failure the returned form keeps the
    /// submitted text so it can be shown again with its errors.
    pub fn bind(input: PostFormInput, groups: &[Group]) -> Result<PostDraft, PostForm> {
        let mut errors = PostFormErrors::default();

        if input.text.trim().is_empty() {
            errors.text.push(REQUIRED.to_string());
        }

        let raw_group = input.group.trim();
        let group_id = if raw_group.is_empty() {
            None
        } else {
            match raw_group.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.group.push(INVALID_CHOICE.to_string());
                    None
                }
            }
        };

        if errors.is_empty() {
            return Ok(PostDraft {
                text: input.text.trim().to_string(),
                group_id,
            });
        }

        let mut form = Self::with_values(input.text, group_id, groups);
        form.errors = errors;
        Err(form)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupErrors {
    pub username: Vec<String>,
    pub email: Vec<String>,
    pub password: Vec<String>,
}

impl SignupErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.email.is_empty() && self.password.is_empty()
    }
}

/// Checks the username rules shared by signup and the admin console:
/// letters, digits and `@ . + - _`, at most 150 characters.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err(REQUIRED.to_string());
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(format!(
            "Ensure this value has at most {} characters.",
            USERNAME_MAX_LEN
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupInput {
    pub fn validate(&self) -> Result<ValidSignup, SignupErrors> {
        let mut errors = SignupErrors::default();
        let username = self.username.trim();
        let email = self.email.trim();

        if let Err(message) = validate_username(username) {
            errors.username.push(message);
        }
        if !email.is_empty() && !email.contains('@') {
            errors.email.push("Enter a valid email address.".to_string());
        }
        if self.password1.is_empty() {
            errors.password.push(REQUIRED.to_string());
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.password.push(format!(
                "This password is too short. It must contain at least {} characters.",
                PASSWORD_MIN_LEN
            ));
        }
        if self.password1 != self.password2 {
            errors
                .password
                .push("The two password fields didn't match.".to_string());
        }

        if errors.is_empty() {
            Ok(ValidSignup {
                username: username.to_string(),
                email: email.to_string(),
                password: self.password1.clone(),
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Only same-site absolute paths are accepted as redirect targets.
pub fn safe_next(next: &str) -> Option<&str> {
    let next = next.trim();
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        Some(next)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![
            Group {
                id: 1,
                title: "Cats".into(),
                slug: "cats".into(),
                description: String::new(),
            },
            Group {
                id: 2,
                title: "Dogs".into(),
                slug: "dogs".into(),
                description: String::new(),
            },
        ]
    }

    #[test]
    fn valid_post_without_group() {
        let draft = PostForm::bind(
            PostFormInput {
                text: "Test text".into(),
                group: String::new(),
            },
            &groups(),
        )
        .unwrap();
        assert_eq!(draft.text, "Test text");
        assert_eq!(draft.group_id, None);
    }

    #[test]
    fn surrounding_whitespace_is_stripped() {
        let draft = PostForm::bind(
            PostFormInput {
                text: "  hello\n".into(),
                group: " 1 ".into(),
            },
            &groups(),
        )
        .unwrap();
        assert_eq!(draft.text, "hello");
        assert_eq!(draft.group_id, Some(1));
    }

    #[test]
    fn valid_post_with_group() {
        let draft = PostForm::bind(
            PostFormInput {
                text: "Test text".into(),
                group: "2".into(),
            },
            &groups(),
        )
        .unwrap();
        assert_eq!(draft.group_id, Some(2));
    }

    #[test]
    fn blank_text_is_rejected() {
        let form = PostForm::bind(
            PostFormInput {
                text: "   \n".into(),
                group: "1".into(),
            },
            &groups(),
        )
        .unwrap_err();
        assert_eq!(form.errors.text, vec![REQUIRED.to_string()]);
        assert!(form.errors.group.is_empty());
        assert_eq!(form.group, Some(1));
        assert!(form.choices[0].selected);
    }

    #[test]
    fn unknown_or_malformed_group_is_rejected() {
        for raw in ["42", "cats"] {
            let form = PostForm::bind(
                PostFormInput {
                    text: "hello".into(),
                    group: raw.into(),
                },
                &groups(),
            )
            .unwrap_err();
            assert_eq!(form.errors.group, vec![INVALID_CHOICE.to_string()]);
            assert_eq!(form.text, "hello");
        }
    }

    #[test]
    fn signup_rules() {
        let ok = SignupInput {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password1: "correct horse".into(),
            password2: "correct horse".into(),
        };
        assert_eq!(ok.validate().unwrap().username, "alice");

        let bad = SignupInput {
            username: "al ice".into(),
            email: "nope".into(),
            password1: "short".into(),
            password2: "other".into(),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.username.len(), 1);
        assert_eq!(errors.email.len(), 1);
        assert_eq!(errors.password.len(), 2);
    }

    #[test]
    fn next_must_be_local_path() {
        assert_eq!(safe_next("/new/"), Some("/new/"));
        assert_eq!(safe_next("//evil.example"), None);
        assert_eq!(safe_next("https://evil.example"), None);
        assert_eq!(safe_next(""), None);
    }
}
