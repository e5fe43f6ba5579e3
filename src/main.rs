use anyhow::Context;
use library_server::{
    adapters::{memory::InMemoryBookRepository, postgres::PostgresBookRepository},
    api::{
        auth::JwtVerifier,
        handlers::AppState,
        links::LinkBuilder,
        router::create_router,
    },
    application::book::{ServiceDependencies, seed_catalog},
    config::Settings,
    ports::BookRepository,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize repository
    let book_repository: Arc<dyn BookRepository> = match &settings.database.url {
        Some(database_url) => {
            tracing::info!("Using PostgreSQL book repository");

            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.database.max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to database")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;

            Arc::new(PostgresBookRepository::new(pool))
        }
        None => {
            tracing::info!("No database configured, using in-memory book repository");
            Arc::new(InMemoryBookRepository::new())
        }
    };

    let service_deps = ServiceDependencies { book_repository };

    if settings.catalog.seed {
        seed_catalog(&service_deps)
            .await
            .context("failed to seed catalog")?;
    }

    // Create application state
    let app_state = Arc::new(AppState {
        service_deps,
        token_verifier: Arc::new(JwtVerifier::new(&settings.auth)),
        links: LinkBuilder::new(&settings.server.public_url, &settings.server.context_path),
        context_path: settings.server.context_path.clone(),
    });

    // Create router
    let app = create_router(app_state);

    let addr = settings.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!(
        "Server listening on {}{}",
        addr,
        settings.server.context_path
    );

    // Start server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
