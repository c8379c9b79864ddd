//! Page templates. Every page carries the current user for the header.

use actix_web::HttpResponse;
use askama::Template;
use tracing::error;

use crate::application::forms::{
    GROUP_HELP, GROUP_LABEL, PostForm, SignupErrors, TEXT_HELP, TEXT_LABEL,
};
use crate::application::pagination::Page;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::post::PostEntry;
use crate::domain::user::User;
use crate::presentation::utils::AuthenticatedUser;

/// Labels of the post form fields.
pub struct FieldLabels {
    pub text: &'static str,
    pub text_help: &'static str,
    pub group: &'static str,
    pub group_help: &'static str,
}

pub const POST_FORM_LABELS: FieldLabels = FieldLabels {
    text: TEXT_LABEL,
    text_help: TEXT_HELP,
    group: GROUP_LABEL,
    group_help: GROUP_HELP,
};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user: Option<AuthenticatedUser>,
    pub entries: Vec<PostEntry>,
    pub page: Page,
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub user: Option<AuthenticatedUser>,
    pub group: Group,
    pub entries: Vec<PostEntry>,
    pub page: Page,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub user: Option<AuthenticatedUser>,
    pub author: User,
    pub post_count: u64,
    pub entries: Vec<PostEntry>,
    pub page: Page,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub user: Option<AuthenticatedUser>,
    pub entry: PostEntry,
    pub author: User,
    pub count_posts: u64,
    pub form: PostForm,
    pub labels: FieldLabels,
    pub edit_url: String,
}

#[derive(Template)]
#[template(path = "new_post.html")]
pub struct PostFormTemplate {
    pub user: Option<AuthenticatedUser>,
    pub form: PostForm,
    pub labels: FieldLabels,
    pub is_edit: bool,
    pub action: String,
}

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AboutAuthorTemplate {
    pub user: Option<AuthenticatedUser>,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct AboutTechTemplate {
    pub user: Option<AuthenticatedUser>,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub user: Option<AuthenticatedUser>,
    pub username: String,
    pub email: String,
    pub errors: SignupErrors,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<AuthenticatedUser>,
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
    pub user: Option<AuthenticatedUser>,
}

pub fn render_html<T: Template>(template: &T) -> Result<String, DomainError> {
    template.render().map_err(|err| {
        error!("template rendering failed: {}", err);
        DomainError::Internal(format!("template error: {}", err))
    })
}

/// Renders a page with status 200.
pub fn html_page<T: Template>(template: &T) -> Result<HttpResponse, DomainError> {
    let body = render_html(template)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}
