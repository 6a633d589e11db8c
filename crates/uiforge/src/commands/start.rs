//! Start command - wire the backends and run the server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::{info, warn};

use uiforge_config::{CacheBackend, StoreBackend, UiforgeConfig};
use uiforge_llm::{GeminiBackend, GeminiConfig, Generator};
use uiforge_server::{AppState, Server, ServerConfig};
use uiforge_session::{
    CacheConfig, DurableStore, FastCache, MemoryCache, MemoryStore, SessionManager, SessionPolicy,
};
use uiforge_store::{RedisCache, SqliteStore};

use super::Context;

/// Arguments for the start command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Redis URL; switches the cache to Redis (overrides config)
    #[arg(long, env = "UIFORGE_REDIS_URL")]
    pub redis_url: Option<String>,

    /// SQLite database path (overrides config)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Disable the generation endpoint
    #[arg(long)]
    pub no_generation: bool,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let config = &ctx.loaded.config;

    if ctx.verbose {
        let sources = ctx.loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    // ── Backends ────────────────────────────────────────────────────────

    let (cache, cleanup_task) = build_cache(config, args.redis_url.as_deref()).await?;
    let store = build_store(config, args.db.clone())?;
    let policy = session_policy(config);

    info!(
        cache = cache.name(),
        store = store.name(),
        draft_ttl_secs = policy.draft_ttl.as_secs(),
        persisted_ttl_secs = policy.persisted_ttl.as_secs(),
        key_prefix = %policy.key_prefix,
        "Session backends ready"
    );

    let sessions = SessionManager::new(cache, store, policy);

    // ── Server ──────────────────────────────────────────────────────────

    let server_config = server_config(config, &args)?;
    let mut state = AppState::new(sessions, server_config);
    if let Some(generator) = build_generator(config, args.no_generation)? {
        state = state.with_generator(generator);
    }

    let server = Server::new(state);
    println!("uiforge listening on http://{}", server.bind_address());

    let result = server.run_until(shutdown_signal()).await;

    if let Some(handle) = cleanup_task {
        handle.abort();
    }

    result.map_err(Into::into)
}

// ─────────────────────────────────────────────────────────────────────────────
// Wiring
// ─────────────────────────────────────────────────────────────────────────────

async fn build_cache(
    config: &UiforgeConfig,
    redis_override: Option<&str>,
) -> Result<(Arc<dyn FastCache>, Option<tokio::task::JoinHandle<()>>)> {
    let cache_cfg = config.cache();

    let redis_url = match (redis_override, cache_cfg.backend) {
        (Some(url), _) => Some(url.to_string()),
        (None, CacheBackend::Redis) => cache_cfg.redis_url.clone(),
        (None, CacheBackend::Memory) => None,
    };

    if let Some(url) = redis_url {
        let cache = RedisCache::new(&url, Duration::from_millis(cache_cfg.timeout_ms))
            .context("invalid Redis URL")?;
        if let Err(e) = cache.ping().await {
            warn!(error = %e, "Redis is not reachable yet; requests will fail until it is");
        }
        return Ok((Arc::new(cache), None));
    }

    let cache = MemoryCache::new(
        CacheConfig::new()
            .with_max_entries(cache_cfg.max_entries)
            .with_cleanup_interval(Duration::from_secs(cache_cfg.cleanup_interval_secs)),
    );
    let cleanup_task = cache.start_cleanup_task();
    Ok((Arc::new(cache), cleanup_task))
}

fn build_store(config: &UiforgeConfig, db_override: Option<PathBuf>) -> Result<Arc<dyn DurableStore>> {
    let store_cfg = config.store();

    if db_override.is_none() && store_cfg.backend == StoreBackend::Memory {
        warn!("Using in-memory durable store; saved sessions are lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = db_override
        .or(store_cfg.path)
        .or_else(uiforge_config::default_db_path)
        .unwrap_or_else(|| PathBuf::from("sessions.db"));

    let store = SqliteStore::open(&path)
        .with_context(|| format!("failed to open session database {}", path.display()))?;
    info!(path = %path.display(), "Opened session database");
    Ok(Arc::new(store))
}

fn session_policy(config: &UiforgeConfig) -> SessionPolicy {
    let session = config.session();
    SessionPolicy::new()
        .with_draft_ttl(Duration::from_secs(session.draft_ttl_secs))
        .with_persisted_ttl(Duration::from_secs(session.persisted_ttl_secs))
        .with_key_prefix(session.key_prefix)
}

fn server_config(config: &UiforgeConfig, args: &StartArgs) -> Result<ServerConfig> {
    let server = config.server();
    let auth = config.auth();

    let port = args.port.unwrap_or(server.port);
    let bind = args.bind.clone().unwrap_or(server.bind);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", bind, port))?;

    let mut server_config = ServerConfig::new()
        .with_bind_address(addr)
        .with_request_logging(server.request_logging)
        .with_cors_origins(server.cors_origins)
        .with_max_body_size(server.max_body_bytes)
        .with_allowed_users(auth.allowed_users)
        .with_local_user(auth.local_user);

    for (user_id, token) in auth.tokens {
        server_config = server_config.with_token(user_id, token);
    }
    if let Some(header) = auth.proxy_header {
        server_config = server_config.with_proxy_header(header);
    }

    if server_config.is_local_mode() && !addr.ip().is_loopback() {
        warn!(
            %addr,
            user = %server_config.local_user,
            "No authentication configured on a non-loopback address; every request acts as the local user"
        );
    }

    Ok(server_config)
}

fn build_generator(
    config: &UiforgeConfig,
    disabled: bool,
) -> Result<Option<Arc<dyn Generator>>> {
    let generation = config.generation();
    if disabled || !generation.enabled {
        info!("Generation disabled");
        return Ok(None);
    }

    let Some(secret) = uiforge_config::resolve_api_key(generation.api_key.as_deref()) else {
        warn!(
            "No {} found; the generate endpoint will answer 503",
            uiforge_config::API_KEY_ENV
        );
        return Ok(None);
    };

    let mut gemini = GeminiConfig::new(secret.value)
        .with_timeout(Duration::from_secs(generation.timeout_secs));
    if let Some(model) = generation.model {
        gemini = gemini.with_model(model);
    }
    if let Some(base_url) = generation.base_url {
        gemini = gemini.with_base_url(base_url);
    }

    let backend = GeminiBackend::new(gemini)?;
    info!(model = backend.model(), key_source = %secret.source, "Generation enabled");
    Ok(Some(Arc::new(backend)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
