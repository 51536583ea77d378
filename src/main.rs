use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

use sitegate::configuration::get_configuration;
use sitegate::email_client::{EmailClient, SenderAddress};
use sitegate::startup::{run, AppState};
use sitegate::store::PgSiteStore;
use sitegate::telemetry::init_telemetry;

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

    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
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

    let sender = SenderAddress::parse(configuration.email.sender.clone()).map_err(|e| {
        tracing::error!("Invalid sender address: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Email configuration error")
    })?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(configuration.email.timeout_seconds))
        .build()
        .map_err(|e| {
            tracing::error!("Failed to build HTTP client: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "HTTP client error")
        })?;

    let mailer = EmailClient::new(configuration.email.base_url.clone(), sender, http_client);

    let state = AppState {
        store: Arc::new(PgSiteStore::new(pool)),
        mailer: Arc::new(mailer),
        jwt: configuration.jwt.clone(),
        otp: configuration.otp.clone(),
        base_url: configuration.application.base_url.clone(),
    };

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, state)?;
    server.await
}
