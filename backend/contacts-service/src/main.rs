use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contacts_service::{
    db::{create_pool, run_migrations},
    routes,
    security::jwt::TokenIssuer,
    services::{avatar::AvatarStore, email::EmailService},
    AppError, AppState, Config,
};

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting contacts-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // Create database connection pool
    let db_pool = create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        "Database pool created with {} max connections",
        config.database.max_connections
    );

    tracing::info!("Running database migrations...");
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations completed");

    let token_issuer = TokenIssuer::new(&config.jwt.secret, config.jwt.access_token_ttl);

    let email = EmailService::new(&config).context("Failed to initialize email service")?;
    if email.is_enabled() {
        tracing::info!("SMTP transport configured for {}", config.email.smtp_host);
    } else {
        tracing::warn!("SMTP host not set, verification emails disabled");
    }

    let avatars = AvatarStore::new(&config.storage.public_dir)
        .await
        .context("Failed to prepare avatar storage")?;

    let state = AppState {
        db: db_pool,
        token_issuer,
        email,
        avatars,
    };

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
            )
            .app_data(
                web::QueryConfig::default()
                    .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
            )
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure_routes)
            .service(actix_files::Files::new(
                "/avatars",
                state.avatars.avatars_dir(),
            ))
    })
    .bind(&bind_address)
    .context("Failed to bind HTTP server")?
    .workers(4)
    .run()
    .await?;

    Ok(())
}
