use anyhow::Result;
use authserver_core::{
    application::{
        ports::{
            database::Database, security::JwtCodec, session::SessionStore, time::Clock,
            token_endpoint::TokenEndpointClient,
        },
        services::AuthServices,
    },
    config::AppConfig,
    infrastructure::{
        http_client::ReqwestTokenEndpointClient,
        persistence::{
            InMemoryDatabase,
            seed::{SeedOptions, seed_defaults},
        },
        security::{InMemorySessionStore, JoseJwtCodec},
        time::SystemClock,
    },
    presentation::http::{
        routes::build_router,
        state::{HttpState, WebConfig},
    },
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(err) = bootstrap().await {
        tracing::error!(error = %err, "fatal error");
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn bootstrap() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let memory = InMemoryDatabase::new();
    seed_defaults(
        &memory,
        SeedOptions {
            settings: config.settings_seed().clone(),
            admin_console_client_id: config.admin_console_client_id(),
            admin_console_redirect_uri: format!("{}/auth/callback", config.base_url()),
        },
        clock.now(),
    )?;

    let database: Arc<dyn Database> = Arc::new(memory);
    let jwt_codec: Arc<dyn JwtCodec> = Arc::new(JoseJwtCodec::new());
    let services = Arc::new(AuthServices::new(
        Arc::clone(&database),
        Arc::clone(&jwt_codec),
        Arc::clone(&clock),
    ));

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let token_client: Arc<dyn TokenEndpointClient> =
        Arc::new(ReqwestTokenEndpointClient::new(config.base_url())?);

    let state = HttpState {
        services,
        sessions,
        token_client,
        web: Arc::new(WebConfig {
            base_url: config.base_url().to_string(),
            issuer: config.issuer().to_string(),
            admin_console_client_id: config.admin_console_client_id().to_string(),
            admin_console_client_secret: config.admin_console_client_secret().to_string(),
        }),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    let address: SocketAddr = listener.local_addr()?;
    tracing::info!(issuer = %config.issuer(), "listening on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .unwrap_or_else(|| "info,tower_http=info".to_string());

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer());

    if subscriber.try_init().is_err() {
        tracing::warn!("tracing subscriber already initialised");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
