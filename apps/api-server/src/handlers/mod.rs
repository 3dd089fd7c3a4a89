//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod posts;
mod reactions;


use actix_web::web;

/// Configure all application routes.
///
/// Note: `/posts/me` must be registered before `/posts/{id}` so the
/// literal segment is matched ahead of the id pattern.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Public routes
        .route("/health", web::get().to(health::health_check))
        // Auth routes
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .route("/logout", web::post().to(auth::logout))
                .route("/me", web::get().to(auth::me)),
        )
        // Posts, comments and reactions
        .service(
            web::scope("/posts")
                .route("", web::get().to(posts::list))
                .route("", web::post().to(posts::create))
                .route("/me", web::get().to(posts::list_me))
                .route("/{id}", web::get().to(posts::get_by_id))
                .route("/{id}", web::patch().to(posts::update))
                .route("/{id}", web::delete().to(posts::remove))
                .route("/{post_id}/comments", web::get().to(comments::list))
                .route("/{post_id}/comments", web::post().to(comments::create))
                .route("/{post_id}/reactions", web::post().to(reactions::set))
                .route("/{post_id}/reactions", web::delete().to(reactions::remove)),
        );
}
