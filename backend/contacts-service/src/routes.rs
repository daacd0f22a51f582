//! Route configuration
//!
//! Centralized route setup; each domain manages its own routes.

use crate::handlers;
use crate::middleware::AuthMiddleware;
use actix_web::{web, HttpResponse};

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health::health))
        .route("/health/ready", web::get().to(handlers::health::health_ready))
        .route("/health/live", web::get().to(handlers::health::health_live))
        .configure(routes::users::configure)
        .configure(routes::contacts::configure)
        .default_service(web::route().to(not_found));
}

/// Catch-all for unknown paths.
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "message": "Not found"
    }))
}

// Sub-modules for each domain
mod routes {
    use super::*;

    pub mod users {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/users")
                    // Public endpoints
                    .route("/signup", web::post().to(handlers::users::signup))
                    .route("/login", web::post().to(handlers::users::login))
                    .route(
                        "/verify/{verification_token}",
                        web::get().to(handlers::users::verify_email),
                    )
                    .route("/verify", web::post().to(handlers::users::resend_verification))
                    // Session endpoints (bearer token required)
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware)
                            .route("/logout", web::get().to(handlers::users::logout))
                            .route("/current", web::get().to(handlers::users::current_user))
                            .route("", web::patch().to(handlers::users::update_subscription))
                            .route("/avatars", web::patch().to(handlers::users::update_avatar)),
                    ),
            );
        }
    }

    pub mod contacts {
        use super::*;
        pub fn configure(cfg: &mut web::ServiceConfig) {
            cfg.service(
                web::scope("/contacts")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(handlers::contacts::list_contacts))
                    .route("", web::post().to(handlers::contacts::create_contact))
                    .route("/{contact_id}", web::get().to(handlers::contacts::get_contact))
                    .route("/{contact_id}", web::put().to(handlers::contacts::update_contact))
                    .route(
                        "/{contact_id}",
                        web::delete().to(handlers::contacts::remove_contact),
                    )
                    .route(
                        "/{contact_id}/favorite",
                        web::patch().to(handlers::contacts::update_favorite),
                    ),
            );
        }
    }
}
