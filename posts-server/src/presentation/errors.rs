//! HTTP rendering of [`DomainError`].

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};

use crate::domain::error::DomainError;
use crate::presentation::views::{ErrorTemplate, render_html};

pub const LOGIN_URL: &str = "/auth/login/";

pub fn login_redirect_location(next: &str) -> String {
    format!("{}?next={}", LOGIN_URL, urlencoding::encode(next))
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            DomainError::LoginRequired { .. } => StatusCode::FOUND,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::UserAlreadyExists(_) | DomainError::GroupAlreadyExists(_) => {
                StatusCode::CONFLICT
            }
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let DomainError::LoginRequired { next } = self {
            return HttpResponse::Found()
                .insert_header((header::LOCATION, login_redirect_location(next)))
                .finish();
        }

        let status = self.status_code();
        // Internal details stay in the logs.
        let message = match self {
            DomainError::Internal(_) => "Something went wrong on our side.".to_string(),
            e if e.is_not_found() => "The page you requested does not exist.".to_string(),
            other => other.to_string(),
        };
        let page = ErrorTemplate {
            status: status.as_u16(),
            message,
            user: None,
        };
        match render_html(&page) {
            Ok(body) => HttpResponse::build(status)
                .content_type("text/html; charset=utf-8")
                .body(body),
            Err(_) => HttpResponse::build(status).body(status.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            DomainError::PostNotFound(1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::GroupNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::LoginRequired { next: "/new/".into() }.status_code(),
            StatusCode::FOUND
        );
        assert_eq!(
            DomainError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn login_redirect_keeps_next_path() {
        let response = DomainError::LoginRequired {
            next: "/alice/1/edit/".into(),
        }
        .error_response();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert_eq!(location, "/auth/login/?next=%2Falice%2F1%2Fedit%2F");
    }

    #[actix_web::test]
    async fn error_page_hides_internal_details() {
        let response = DomainError::Internal("connection refused".into()).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("Something went wrong"));
        assert!(!html.contains("connection refused"));
    }
}
