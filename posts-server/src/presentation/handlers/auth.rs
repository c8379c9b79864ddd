use crate::application::auth_service::AuthService;
use crate::application::forms::{LoginInput, SignupErrors, SignupInput, safe_next};
use crate::domain::error::DomainError;
use crate::presentation::middleware::SESSION_COOKIE;
use crate::presentation::utils::{MaybeUser, request_id};
use crate::presentation::views::{LoginTemplate, SignupTemplate, html_page};
use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, Scope, get, post, web};
use serde::Deserialize;
use tracing::info;

/// How the session cookie is issued.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiePolicy {
    pub secure: bool,
}

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(signup_form)
        .service(signup)
        .service(login_form)
        .service(login)
        .service(logout)
        .service(logout_link)
}

fn session_cookie(token: String, auth: &AuthService, policy: &CookiePolicy) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(policy.secure)
        .max_age(CookieDuration::seconds(auth.keys().ttl().num_seconds()))
        .finish()
}

fn redirect_with_session(location: &str, cookie: Cookie<'static>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish()
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: String,
}

#[get("/signup/")]
pub async fn signup_form(user: MaybeUser) -> Result<HttpResponse, DomainError> {
    html_page(&SignupTemplate {
        user: user.into_inner(),
        username: String::new(),
        email: String::new(),
        errors: SignupErrors::default(),
    })
}

#[post("/signup/")]
pub async fn signup(
    req: HttpRequest,
    service: web::Data<AuthService>,
    policy: web::Data<CookiePolicy>,
    payload: web::Form<SignupInput>,
) -> Result<HttpResponse, DomainError> {
    let input = payload.into_inner();
    let valid = match input.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            return html_page(&SignupTemplate {
                user: None,
                username: input.username,
                email: input.email,
                errors,
            });
        }
    };

    let user = match service
        .register(valid.username, valid.email, valid.password)
        .await
    {
        Ok(user) => user,
        Err(DomainError::UserAlreadyExists(_)) => {
            let errors = SignupErrors {
                username: vec!["A user with that username already exists.".to_string()],
                ..Default::default()
            };
            return html_page(&SignupTemplate {
                user: None,
                username: input.username,
                email: input.email,
                errors,
            });
        }
        Err(e) => return Err(e),
    };

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        username = %user.username,
        "user registered"
    );

    let token = service.issue_token(&user)?;
    Ok(redirect_with_session(
        "/",
        session_cookie(token, &service, &policy),
    ))
}

#[get("/login/")]
pub async fn login_form(
    user: MaybeUser,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, DomainError> {
    html_page(&LoginTemplate {
        user: user.into_inner(),
        username: String::new(),
        next: safe_next(&query.next).unwrap_or_default().to_string(),
        error: None,
    })
}

#[post("/login/")]
pub async fn login(
    req: HttpRequest,
    service: web::Data<AuthService>,
    policy: web::Data<CookiePolicy>,
    payload: web::Form<LoginInput>,
) -> Result<HttpResponse, DomainError> {
    let input = payload.into_inner();
    let token = match service.login(input.username.trim(), &input.password).await {
        Ok(token) => token,
        Err(DomainError::Unauthorized) => {
            return html_page(&LoginTemplate {
                user: None,
                username: input.username,
                next: safe_next(&input.next).unwrap_or_default().to_string(),
                error: Some(
                    "Please enter a correct username and password. Note that both fields may be case-sensitive."
                        .to_string(),
                ),
            });
        }
        Err(e) => return Err(e),
    };

    info!(
        request_id = %request_id(&req),
        username = %input.username.trim(),
        "user logged in"
    );

    let location = safe_next(&input.next).unwrap_or("/");
    Ok(redirect_with_session(
        location,
        session_cookie(token, &service, &policy),
    ))
}

fn logout_response() -> HttpResponse {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookie)
        .finish()
}

#[post("/logout/")]
pub async fn logout() -> HttpResponse {
    logout_response()
}

#[get("/logout/")]
pub async fn logout_link() -> HttpResponse {
    logout_response()
}
