pub mod auth;
pub mod pages;
pub mod post;

use actix_web::web;

/// Registers every route. Fixed paths come before the `/{username}/...`
/// patterns that would otherwise swallow them.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(pages::health)
        .service(pages::about_author)
        .service(pages::about_tech)
        .service(auth::scope())
        .service(post::index)
        .service(post::new_post_form)
        .service(post::create_post)
        .service(post::group_posts)
        .service(post::edit_post_form)
        .service(post::update_post)
        .service(post::post_view)
        .service(post::profile);
}
