use crate::domain::error::DomainError;
use crate::presentation::utils::MaybeUser;
use crate::presentation::views::{AboutAuthorTemplate, AboutTechTemplate, html_page};
use actix_web::{HttpResponse, Responder, get};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[get("/about/author/")]
pub async fn about_author(user: MaybeUser) -> Result<HttpResponse, DomainError> {
    html_page(&AboutAuthorTemplate {
        user: user.into_inner(),
    })
}

#[get("/about/tech/")]
pub async fn about_tech(user: MaybeUser) -> Result<HttpResponse, DomainError> {
    html_page(&AboutTechTemplate {
        user: user.into_inner(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
