use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::Redirect,
    routing::get,
    Router,
};
use medical_dashboard::config::DEFAULT_SECRETS_PATH;
use medical_dashboard::{ConnectionManager, DashboardLayer, MySqlProvider, Secrets};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct ApplicationState {
    provider: Arc<MySqlProvider>,
    base_path: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let (secrets, provider) = startup(Path::new(DEFAULT_SECRETS_PATH)).await?;

    let application_state = ApplicationState {
        provider: Arc::clone(&provider),
        base_path: secrets.server.base_path.clone(),
    };

    // DashboardLayer returns a stateless Router, so merge it after with_state()
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(application_state)
        .merge(DashboardLayer::from_secrets(&secrets, provider).into_router())
        .layer(TraceLayer::new_for_http());

    let address = &secrets.server.address;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind to {address}"))?;

    info!("dashboard available at http://{}{}", address, secrets.server.base_path);
    info!("health check at http://{}/health", address);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Load the secrets file, then open the database connection
///
/// Nothing touches the database until the secrets file has loaded cleanly.
async fn startup(secrets_path: &Path) -> anyhow::Result<(Secrets, Arc<MySqlProvider>)> {
    let secrets = Secrets::load(secrets_path).with_context(|| {
        format!("could not load secrets, check {}", secrets_path.display())
    })?;
    info!(path = %secrets_path.display(), "secrets loaded");

    if secrets.has_api_key() {
        info!("GROQ API key loaded");
    } else {
        warn!("GROQ API key not found in secrets");
    }

    info!(
        host = %secrets.medical_db.host,
        database = %secrets.medical_db.database,
        user = %secrets.medical_db.user,
        "database info"
    );

    let provider = Arc::new(MySqlProvider::new(ConnectionManager::mysql(
        &secrets.medical_db,
    )));
    provider
        .connections()
        .get_connection()
        .await
        .with_context(|| {
            format!("cannot connect to database, check {}", secrets_path.display())
        })?;

    Ok((secrets, provider))
}

async fn root_handler(State(state): State<ApplicationState>) -> Redirect {
    Redirect::to(&state.base_path)
}

async fn health_handler(
    State(state): State<ApplicationState>,
) -> Result<(StatusCode, &'static str), StatusCode> {
    state.provider.ping().await.map_err(|error| {
        warn!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok((StatusCode::OK, "Server is healthy"))
}
