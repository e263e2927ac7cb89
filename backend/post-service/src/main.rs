use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use crypto_core::JwtKeys;
use db_pool::{create_pool, DbConfig};
use post_service::config::{Config, StorageBackend};
use post_service::db::{InMemoryPostRepository, PgPostRepository, PostRepository};
use post_service::middleware::{JwtAuthMiddleware, MetricsMiddleware};
use post_service::services::PostService;
use post_service::{handlers, metrics};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn build_repository(config: &Config) -> io::Result<Arc<dyn PostRepository>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; posts are lost on restart");
            Ok(Arc::new(InMemoryPostRepository::new()))
        }
        StorageBackend::Postgres => {
            let db_cfg = DbConfig::from_env("post-service");
            if db_cfg.database_url.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "DATABASE_URL must be set when STORAGE_BACKEND=postgres",
                ));
            }

            db_cfg.log_config();
            let pool = create_pool(db_cfg).await.map_err(|e| {
                io::Error::new(io::ErrorKind::Other, format!("Database pool creation failed: {e}"))
            })?;

            let repo = PgPostRepository::new(pool);
            repo.migrate().await.map_err(|e| {
                io::Error::new(io::ErrorKind::Other, format!("Migrations failed: {e}"))
            })?;

            tracing::info!("Connected to database via db-pool crate");
            Ok(Arc::new(repo))
        }
    }
}

/// Post Service
///
/// Serves `/api/posts` (posts, likes, comments) for DevConnector, plus
/// `/api/health*` probes and `/metrics`. Listens on port 5050 unless
/// `POST_SERVICE_PORT` says otherwise.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let keys = JwtKeys::from_env().map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to initialize JWT keys: {e:#}"),
        )
    })?;
    let auth = JwtAuthMiddleware::new(Arc::new(keys));

    let repo = build_repository(&config).await?;
    let service = web::Data::new(
        PostService::new(repo).with_max_text_length(config.posts.max_text_length),
    );

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    let mut server = HttpServer::new(move || {
        let mut cors = Cors::default();
        match cors_config.origins() {
            None => cors = cors.allow_any_origin(),
            Some(origins) => {
                for origin in origins {
                    cors = cors.allowed_origin(origin);
                }
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let auth = auth.clone();
        App::new()
            .app_data(service.clone())
            .wrap(MetricsMiddleware)
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::configure_health)
            .configure(move |cfg| handlers::configure(cfg, auth))
    })
    .bind(&bind_address)?;

    if let Some(workers) = config.app.workers {
        server = server.workers(workers);
    }

    let server = server.run();
    let server_handle = server.handle();

    tokio::select! {
        result = server => {
            if let Err(e) = &result {
                tracing::error!("HTTP server error: {}", e);
            }
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("Post-service shutting down");
    Ok(())
}
