use std::sync::Arc;

use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};
use chrono::Duration;
use sqlx::PgPool;
use tracing::info;

use crate::application::admin_service::AdminService;
use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::data::group_repository::{GroupRepository, PostgresGroupRepository};
use crate::data::memory::InMemoryRepository;
use crate::data::post_repository::{PostRepository, PostgresPostRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::handlers::auth::CookiePolicy;
use crate::presentation::middleware::{RequestIdMiddleware, SessionMiddleware, TimingMiddleware};

/// Everything the HTTP layer and the admin console share.
#[derive(Clone)]
pub struct AppServices {
    pub post_service: PostService,
    pub auth_service: AuthService,
    pub admin_service: AdminService,
    pub cookie_policy: CookiePolicy,
}

impl AppServices {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
        keys: JwtKeys,
        cookie_policy: CookiePolicy,
    ) -> Self {
        Self {
            post_service: PostService::new(posts.clone(), groups.clone(), users.clone()),
            auth_service: AuthService::new(users.clone(), keys),
            admin_service: AdminService::new(posts, groups, users),
            cookie_policy,
        }
    }

    pub fn postgres(pool: PgPool, config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PostgresPostRepository::new(pool.clone())),
            Arc::new(PostgresGroupRepository::new(pool.clone())),
            Arc::new(PostgresUserRepository::new(pool)),
            JwtKeys::new(
                config.jwt_secret.clone(),
                Duration::hours(config.session_ttl_hours),
            ),
            CookiePolicy {
                secure: config.secure_cookies,
            },
        )
    }

    /// Services over a fresh in-memory store.
    pub fn in_memory(keys: JwtKeys) -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        Self::new(
            repo.clone(),
            repo.clone(),
            repo,
            keys,
            CookiePolicy::default(),
        )
    }

    /// Registers shared state and routes on an app.
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.post_service.clone()))
            .app_data(web::Data::new(self.auth_service.clone()))
            .app_data(web::Data::new(self.cookie_policy));
        handlers::configure(cfg);
    }
}

pub async fn run(config: &AppConfig, services: AppServices) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);

    info!(
        host = %bind_address.0,
        port = bind_address.1,
        "HTTP server starting"
    );

    HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(SessionMiddleware)
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("Referrer-Policy", "same-origin"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .configure(|cfg| services.register(cfg))
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}
