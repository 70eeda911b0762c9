// Tabnotes API server
// Decision: Keys are parsed at startup so a misconfigured deployment never starts
// Decision: No DATABASE_URL runs in dev mode with in-memory storage

use std::sync::Arc;

use anyhow::{Context, Result};
use tabnotes_api::{build_router, spawn_purge_task, AppStateBuilder, AuthConfig, ServerConfig};
use tabnotes_core::{EcdsaKeyPair, LogNotifier, SessionConfig};
use tabnotes_storage::StorageBackend;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tabnotes_api=debug,tabnotes_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("tabnotes-api starting...");

    let server_config = ServerConfig::from_env();
    let auth_config = AuthConfig::from_env()?;
    let session_config = SessionConfig::from_env();

    let keys = EcdsaKeyPair::from_files(&auth_config.private_key_path, &auth_config.public_key_path)
        .context("Failed to read ECDSA key files")?;
    keys.validate().context("Invalid ECDSA key material")?;
    tracing::info!("Signing keys loaded");

    let backend = match &server_config.database_url {
        Some(url) => StorageBackend::postgres(url).await?,
        None => {
            tracing::warn!("DATABASE_URL not set, running in dev mode");
            StorageBackend::in_memory()
        }
    };

    for (name, email) in &server_config.seed_users {
        let user = backend
            .seed_user(name, email)
            .await
            .with_context(|| format!("Failed to seed user {email}"))?;
        tracing::info!(user_id = %user.id, %email, "User seeded");
    }

    tracing::info!(
        magic_link_ttl_secs = session_config.magic_link_ttl.num_seconds(),
        auth_token_ttl_secs = session_config.auth_token_ttl.num_seconds(),
        "Session windows configured"
    );

    let state = AppStateBuilder {
        backend,
        keys: Arc::new(keys),
        notifier: Arc::new(LogNotifier),
        session_config,
        cookie_name: auth_config.cookie_name.clone(),
        cookie_secure: auth_config.cookie_secure,
        api_url: server_config.api_url.clone(),
        redirect_url: server_config.redirect_url.clone(),
    }
    .build();

    match server_config.purge_interval {
        Some(every) => {
            spawn_purge_task(state.sessions.clone(), every);
            tracing::info!(interval_secs = every.as_secs(), "Expired-session purge scheduled");
        }
        None => tracing::info!("Expired-session purge disabled"),
    }

    if server_config.allowed_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?server_config.allowed_origins, "CORS origins configured");
    }

    let app = build_router(state, &server_config);

    let addr = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
