use crate::application::forms::{PostForm, PostFormInput};
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::presentation::utils::{AuthenticatedUser, MaybeUser, request_id};
use crate::presentation::views::{
    GroupTemplate, IndexTemplate, POST_FORM_LABELS, PostFormTemplate, PostTemplate,
    ProfileTemplate, html_page,
};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn post_url(username: &str, post_id: i64) -> String {
    format!("/{}/{}/", username, post_id)
}

fn edit_url(username: &str, post_id: i64) -> String {
    format!("/{}/{}/edit/", username, post_id)
}

#[get("/")]
pub async fn index(
    user: MaybeUser,
    posts: web::Data<PostService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let listing = posts.feed(query.page.as_deref()).await?;
    html_page(&IndexTemplate {
        user: user.into_inner(),
        entries: listing.entries,
        page: listing.page,
    })
}

#[get("/group/{slug}/")]
pub async fn group_posts(
    user: MaybeUser,
    posts: web::Data<PostService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let slug = path.into_inner();
    let (group, listing) = posts.group_feed(&slug, query.page.as_deref()).await?;
    html_page(&GroupTemplate {
        user: user.into_inner(),
        group,
        entries: listing.entries,
        page: listing.page,
    })
}

#[get("/new/")]
pub async fn new_post_form(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let groups = posts.groups().await?;
    html_page(&PostFormTemplate {
        user: Some(user),
        form: PostForm::blank(&groups),
        labels: POST_FORM_LABELS,
        is_edit: false,
        action: "/new/".to_string(),
    })
}

#[post("/new/")]
pub async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    payload: web::Form<PostFormInput>,
) -> Result<HttpResponse, DomainError> {
    let groups = posts.groups().await?;
    let draft = match PostForm::bind(payload.into_inner(), &groups) {
        Ok(draft) => draft,
        Err(form) => {
            return html_page(&PostFormTemplate {
                user: Some(user),
                form,
                labels: POST_FORM_LABELS,
                is_edit: false,
                action: "/new/".to_string(),
            });
        }
    };

    let post = posts.create_post(user.id, draft).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = post.id,
        "post created"
    );

    Ok(redirect("/"))
}

#[get("/{username}/{post_id}/edit/")]
pub async fn edit_post_form(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, DomainError> {
    let (username, post_id) = path.into_inner();
    let post = match posts.post_for_edit(user.id, &username, post_id).await {
        Ok(post) => post,
        Err(DomainError::Forbidden) => return Ok(redirect(&post_url(&username, post_id))),
        Err(e) => return Err(e),
    };
    let groups = posts.groups().await?;
    html_page(&PostFormTemplate {
        user: Some(user),
        form: PostForm::for_post(&post, &groups),
        labels: POST_FORM_LABELS,
        is_edit: true,
        action: edit_url(&username, post_id),
    })
}

#[post("/{username}/{post_id}/edit/")]
pub async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<(String, i64)>,
    payload: web::Form<PostFormInput>,
) -> Result<HttpResponse, DomainError> {
    let (username, post_id) = path.into_inner();
    let detail_url = post_url(&username, post_id);

    match posts.post_for_edit(user.id, &username, post_id).await {
        Ok(_) => {}
        Err(DomainError::Forbidden) => return Ok(redirect(&detail_url)),
        Err(e) => return Err(e),
    }

    let groups = posts.groups().await?;
    let draft = match PostForm::bind(payload.into_inner(), &groups) {
        Ok(draft) => draft,
        Err(form) => {
            return html_page(&PostFormTemplate {
                user: Some(user),
                form,
                labels: POST_FORM_LABELS,
                is_edit: true,
                action: edit_url(&username, post_id),
            });
        }
    };

    match posts.edit_post(user.id, &username, post_id, draft).await {
        Ok(_) => {}
        Err(DomainError::Forbidden) => return Ok(redirect(&detail_url)),
        Err(e) => return Err(e),
    }

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id,
        "post updated"
    );

    Ok(redirect(&detail_url))
}

#[get("/{username}/{post_id}/")]
pub async fn post_view(
    user: MaybeUser,
    posts: web::Data<PostService>,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse, DomainError> {
    let (username, post_id) = path.into_inner();
    let detail = posts.post_detail(&username, post_id).await?;
    let groups = posts.groups().await?;
    let form = PostForm::for_post(&detail.entry.post, &groups);
    html_page(&PostTemplate {
        user: user.into_inner(),
        edit_url: edit_url(&detail.author.username, post_id),
        entry: detail.entry,
        author: detail.author,
        count_posts: detail.author_post_count,
        form,
        labels: POST_FORM_LABELS,
    })
}

#[get("/{username}/")]
pub async fn profile(
    user: MaybeUser,
    posts: web::Data<PostService>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let username = path.into_inner();
    let profile = posts.profile(&username, query.page.as_deref()).await?;
    html_page(&ProfileTemplate {
        user: user.into_inner(),
        author: profile.author,
        post_count: profile.post_count,
        entries: profile.listing.entries,
        page: profile.listing.page,
    })
}
