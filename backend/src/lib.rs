//! # School Van Tracker Backend
//!
//! Fee and notification tracking for school van services. Admins manage a
//! roster per school, record fee payments and post notices; parents log in
//! with their name and contact number to see their own children.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (axum REST API)
//!     ↓
//! Domain Layer (services, sessions, credential matching)
//!     ↓
//! Storage Layer (CSV + git + GitHub mirror, or a remote JSON tree)
//! ```
//!
//! Services are generic over the storage `Connection`, so the same router
//! runs on either backend.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{http::Method, Router};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{StorageConfig, TrackerConfig};
use crate::domain::{
    CredentialService, LedgerService, NotificationService, ParentService, RosterService, SchoolDirectory,
    SessionStore,
};
use crate::storage::csv::CsvConnection;
use crate::storage::remote::RemoteTreeConnection;
use crate::storage::sync::{GithubContentsSync, GithubSyncSettings};
use crate::storage::{Connection, GitManager};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState<C: Connection> {
    pub roster_service: RosterService<C>,
    pub ledger_service: LedgerService<C>,
    pub notification_service: NotificationService<C>,
    pub credential_service: CredentialService<C>,
    pub parent_service: ParentService<C>,
    pub sessions: SessionStore,
}

impl<C: Connection> AppState<C> {
    pub fn new(connection: Arc<C>, schools: SchoolDirectory, admins: HashMap<String, String>) -> Self {
        let ledger_service = LedgerService::new(connection.clone(), schools.clone());
        let notification_service = NotificationService::new(connection.clone(), schools.clone());
        let parent_service = ParentService::new(
            connection.clone(),
            schools.clone(),
            ledger_service.clone(),
            notification_service.clone(),
        );

        Self {
            roster_service: RosterService::new(connection.clone(), schools.clone()),
            credential_service: CredentialService::new(connection, schools, admins),
            ledger_service,
            notification_service,
            parent_service,
            sessions: SessionStore::new(),
        }
    }
}

/// Flat-file backend with optional git versioning and GitHub mirror.
/// School files missing locally are restored from the mirror first.
pub async fn initialize_csv_backend(config: &TrackerConfig) -> Result<AppState<CsvConnection>> {
    info!("Setting up CSV storage in {}", config.data_directory.display());
    let mut connection = CsvConnection::new(&config.data_directory)
        .with_context(|| format!("cannot use data directory {}", config.data_directory.display()))?;

    if config.git_versioning {
        connection = connection.with_git_versioning(GitManager::new());
    }

    if let Some(sync) = &config.github_sync {
        match sync.token.clone() {
            Some(token) => {
                let settings = GithubSyncSettings {
                    repo: sync.repo.clone(),
                    branch: sync.branch.clone(),
                    token,
                    path_prefix: sync.path_prefix.clone(),
                };
                connection = connection.with_blob_sync(Arc::new(GithubContentsSync::new(settings)?));
                let restored = connection.restore_missing_files(&config.schools).await;
                info!("GitHub mirror {} enabled, restored {} files", sync.repo, restored);
            }
            None => tracing::warn!("github_sync configured without a token, mirror disabled"),
        }
    }

    Ok(build_state(connection, config))
}

pub fn initialize_remote_backend(config: &TrackerConfig) -> Result<AppState<RemoteTreeConnection>> {
    let StorageConfig::RemoteTree { url, auth_token } = &config.storage else {
        anyhow::bail!("storage is not configured as remote_tree");
    };
    info!("Setting up remote tree storage at {}", url);
    let connection = RemoteTreeConnection::new(url, auth_token.clone())?;
    Ok(build_state(connection, config))
}

fn build_state<C: Connection>(connection: C, config: &TrackerConfig) -> AppState<C> {
    let schools = SchoolDirectory::new(config.schools.clone());
    let admins = config.admins.clone().into_iter().collect();
    AppState::new(Arc::new(connection), schools, admins)
}

/// Create the Axum router with all routes configured
pub fn create_router<C: Connection>(app_state: AppState<C>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .nest("/api", io::rest::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Bind and serve until the process is stopped
pub async fn serve<C: Connection>(app_state: AppState<C>, bind_address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("cannot bind {}", bind_address))?;
    info!("Starting server on {}", listener.local_addr()?);
    axum::serve(listener, create_router(app_state)).await?;
    Ok(())
}
