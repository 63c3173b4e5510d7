use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use sessionkeeper::auth::{AuthService, TokenIssuer};
use sessionkeeper::configuration::get_configuration;
use sessionkeeper::media::HttpMediaUploader;
use sessionkeeper::startup::run;
use sessionkeeper::store::PgUserStore;
use sessionkeeper::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
    })?;
    tracing::info!("Database ready");

    let uploader = HttpMediaUploader::new(&configuration.media).map_err(|e| {
        tracing::error!("Failed to build media uploader: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Media client error")
    })?;

    let auth = AuthService::new(
        Arc::new(PgUserStore::new(pool)),
        Arc::new(uploader),
        TokenIssuer::new(&configuration.jwt),
        configuration.security.bcrypt_cost,
    );

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, auth)?.await
}
