pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};

use sqlx::PgPool;

use crate::security::jwt::TokenIssuer;
use crate::services::avatar::AvatarStore;
use crate::services::email::EmailService;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub token_issuer: TokenIssuer,
    pub email: EmailService,
    pub avatars: AvatarStore,
}
