//! LifeMonitor server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_web::{App, HttpServer, web};
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use lifemonitor::api;
use lifemonitor::config::Config;
use lifemonitor::db::DbPool;
use lifemonitor::error::AppError;
use lifemonitor::middleware::RequestLogger;
use lifemonitor::services::LifeMonitor;

/// Largest accepted JSON body (test definitions, registrations).
const MAX_JSON_BODY: usize = 2 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL must be set and differ from the development default");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  LifeMonitor");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        error!("{}", e);
        std::process::exit(1);
    }

    let monitor = match LifeMonitor::new(pool.clone(), &config) {
        Ok(monitor) => monitor,
        Err(e) => {
            error!("Failed to initialize LifeMonitor: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        testing_services = %monitor.testing_services().supported_types().join(", "),
        build_cache_ttl_secs = config.build_cache_ttl.as_secs(),
        "Testing service adapters ready"
    );

    let bind_address = config.bind_address();
    let worker_count = if config.is_development() {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!("Starting server at http://{} ({} workers)", bind_address, cpus);
        cpus
    };

    let pool = web::Data::new(pool);
    let monitor = web::Data::new(monitor);

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(pool.clone())
            .app_data(monitor.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(MAX_JSON_BODY)
                    .error_handler(|err, _req| {
                        AppError::InvalidInput(format!("Invalid JSON body: {}", err)).into()
                    }),
            )
            .service(web::scope("/api/v1").configure(api::configure_api))
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
