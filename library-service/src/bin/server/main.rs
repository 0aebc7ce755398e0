use std::sync::Arc;

use auth::Authenticator;
use library_service::config::Config;
use library_service::domain::borrow_request::service::BorrowService;
use library_service::domain::user::service::AccountService;
use library_service::inbound::http::router::create_router;
use library_service::outbound::mail::SmtpMailer;
use library_service::outbound::repositories::PostgresBorrowRequestRepository;
use library_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "library-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        smtp_host = %config.mail.smtp_host,
        smtp_port = config.mail.smtp_port,
        reset_expiry_minutes = config.accounts.reset_expiry_minutes,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::with_cost(
        config.jwt.secret.as_bytes(),
        config.accounts.hash_cost(),
    )?);

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let borrow_request_repository = Arc::new(PostgresBorrowRequestRepository::new(pg_pool));
    let mailer = Arc::new(SmtpMailer::new(
        config.mail.clone(),
        config.accounts.policy().reset_expiry,
    ));

    let account_service = Arc::new(AccountService::new(
        user_repository,
        mailer,
        Arc::clone(&authenticator),
        config.accounts.policy(),
    ));
    let borrow_service = Arc::new(BorrowService::new(borrow_request_repository));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        account_service,
        borrow_service,
        authenticator,
        config.jwt.expiration_hours,
    );

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}
