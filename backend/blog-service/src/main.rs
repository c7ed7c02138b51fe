use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use crypto_core::{jwt, JwtKeys};
use db_pool::{create_pool, DbConfig};
use std::io;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_service::config::{Config, StoreKind};
use blog_service::db::{MemoryStore, PgStore, Store};
use blog_service::identity::{IdentityProvider, JwtIdentityProvider};
use blog_service::middleware::{IdentityMiddleware, MetricsMiddleware};
use blog_service::{handlers, metrics};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_store(config: &Config) -> io::Result<Arc<dyn Store>> {
    match config.store {
        StoreKind::Postgres => {
            let db_cfg = DbConfig::for_service(
                "blog-service",
                &config.database.url,
                config.database.max_connections,
            );
            db_cfg.log_config();

            let pool = create_pool(db_cfg).await.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to create database pool: {e}"),
                )
            })?;

            if config.database.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| {
                        io::Error::new(io::ErrorKind::Other, format!("Migration failed: {e}"))
                    })?;
                tracing::info!("Database migrations applied");
            }

            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreKind::Memory => {
            tracing::warn!("Using in-process store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn build_identity(config: &Config) -> io::Result<Arc<dyn IdentityProvider>> {
    let keys = jwt::load_validation_key().and_then(|pem| JwtKeys::validation_only(&pem));
    match keys {
        Ok(keys) => Ok(Arc::new(JwtIdentityProvider::new(keys))),
        Err(err) if config.app.is_production() => Err(io::Error::new(
            io::ErrorKind::Other,
            format!("JWT public key is required in production: {err}"),
        )),
        Err(err) => {
            tracing::warn!(
                "JWT public key not configured ({err}); authenticated requests will be rejected"
            );
            Ok(Arc::new(JwtIdentityProvider::disabled()))
        }
    }
}

/// Blog Service
///
/// Serves posts, groups, comments and follows under `/api/v1`, plus
/// Prometheus metrics on `/metrics`.
#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store = build_store(&config).await?;
    let provider = build_identity(&config)?;
    let store_data: web::Data<dyn Store> = web::Data::from(store);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let allowed_origins = config.cors.allowed_origins.clone();
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',').map(str::trim) {
            if origin.is_empty() {
                continue;
            }
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(store_data.clone())
            .wrap(IdentityMiddleware::new(provider.clone()))
            .wrap(MetricsMiddleware)
            .wrap(cors)
            .wrap(TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run();

    let result = server.await;
    tracing::info!("blog-service shutting down");
    result
}
