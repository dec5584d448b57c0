//! Reusable OCPI node runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! database init, migrations, party store load, REST API, metrics, and
//! graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{
    AuthorizationGate, CredentialsService, LocalParty, PartyAdministration, PartyStore,
    RegistrationClient,
};
use crate::config::AppConfig;
use crate::domain::PartyRepository;
use crate::infrastructure::{
    init_database, run_migrations, DatabaseConfig, HttpOcpiClient, InMemoryPartyRepository,
    SeaOrmPartyRepository,
};
use crate::interfaces::http::modules::admin::AdminKey;
use crate::interfaces::http::{create_api_router, ApiContext};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the OCPI node.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Keep parties in memory only and skip the database entirely.
    pub in_memory: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            in_memory: false,
        }
    }
}

impl ServerOptions {
    /// In-memory node on an ephemeral localhost port.
    pub fn ephemeral(mut config: AppConfig) -> Self {
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        Self {
            config,
            auto_migrate: false,
            in_memory: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running OCPI node.
///
/// # Examples
///
/// ```rust,no_run
/// use texnouz_ocpi::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Token-indexed registry of counter-parties.
    pub store: Arc<PartyStore>,
    /// Outbound registration, rotation and de-registration.
    pub registration: Arc<RegistrationClient>,
    /// Operator-side party management.
    pub admin: Arc<PartyAdministration>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the API is bound to.
    pub local_addr: SocketAddr,
    /// Public base URL used in our versions documents.
    pub base_url: String,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the OCPI node with the given options.
    ///
    /// This will:
    /// 1. Install Prometheus metrics recorder
    /// 2. Connect to database and run migrations
    /// 3. Load the party store
    /// 4. Bind and start the REST API (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!(
            party = %app_cfg.party.identity(),
            "Starting Texnouz OCPI node..."
        );

        let prometheus_handle = prometheus_handle();

        // ── Storage ────────────────────────────────────────────
        let (db, repository): (Option<DatabaseConnection>, Arc<dyn PartyRepository>) =
            if opts.in_memory {
                info!("Using in-memory party repository");
                (None, Arc::new(InMemoryPartyRepository::new()))
            } else {
                let db_config = DatabaseConfig {
                    url: app_cfg.database.url.clone(),
                };
                info!("Database: {}", db_config.url);
                let db = init_database(&db_config).await?;
                if opts.auto_migrate {
                    info!("Running database migrations...");
                    run_migrations(&db).await?;
                    info!("Migrations completed");
                }
                let repository = Arc::new(SeaOrmPartyRepository::new(db.clone()));
                (Some(db), repository)
            };
        let store = Arc::new(PartyStore::open(repository).await?);

        // Bind first so an ephemeral port is known before any URL is built.
        let api_addr = format!("{}:{}", app_cfg.server.host, app_cfg.server.port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        let base_url = base_url(&app_cfg, local_addr);

        // ── Services ───────────────────────────────────────────
        let timeout = Duration::from_secs(app_cfg.registration.timeout_secs);
        let http_client = Arc::new(HttpOcpiClient::new(timeout)?);
        let local = LocalParty {
            identity: app_cfg.party.identity(),
            business_details: app_cfg.party.business_details(),
            versions_url: format!("{}/ocpi/versions", base_url),
        };

        let credentials = Arc::new(CredentialsService::new(
            store.clone(),
            http_client.clone(),
            local.clone(),
            timeout,
        ));
        let registration = Arc::new(RegistrationClient::new(
            store.clone(),
            http_client.clone(),
            http_client,
            local,
            timeout,
        ));
        let admin = Arc::new(PartyAdministration::new(store.clone()));
        let gate = Arc::new(AuthorizationGate::new(
            store.clone(),
            app_cfg.registration.anonymous_discovery,
        ));

        if app_cfg.admin.api_key.is_none() {
            warn!("admin.api_key is not set, the admin API rejects every call");
        }

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(ApiContext {
            store: store.clone(),
            gate,
            credentials,
            registration: registration.clone(),
            admin: admin.clone(),
            admin_key: AdminKey::new(app_cfg.admin.api_key.as_deref()),
            base_url: base_url.clone(),
            prometheus: prometheus_handle,
        });

        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let api_shutdown = shutdown.signal();
        let api_server = axum::serve(
            listener,
            api_router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        info!("REST API server listening on http://{}", local_addr);
        info!("OCPI versions at {}/ocpi/versions", base_url);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            store,
            registration,
            admin,
            config: app_cfg,
            local_addr,
            base_url,
            db,
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    pub async fn wait(self) {
        info!("⏳ Waiting for the API server to drain...");

        if !self.shutdown.drain(self.api_task).await {
            warn!(
                timeout_secs = self.shutdown.timeout().as_secs(),
                "API server did not stop within the shutdown timeout"
            );
        }

        if let Some(db) = self.db {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("✅ Database connection closed");
            }
        }

        info!("👋 Texnouz OCPI node shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down OCPI node...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global metrics recorder can only be installed once per process, so
/// later starts within the same process reuse it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("📊 Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Prometheus recorder unavailable, /metrics disabled: {}", e);
                None
            }
        })
        .clone()
}

/// Configured public URL, or one derived from the bound address.
fn base_url(config: &AppConfig, local_addr: SocketAddr) -> String {
    if config.server.public_url.is_some() {
        return config.public_url();
    }
    let host = if local_addr.ip().is_unspecified() {
        "127.0.0.1".to_string()
    } else {
        local_addr.ip().to_string()
    };
    format!("http://{}:{}", host, local_addr.port())
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
