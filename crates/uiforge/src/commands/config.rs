//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use uiforge_config::{CacheBackend, StoreBackend};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./uiforge.toml) instead of user config
        #[arg(long)]
        local: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local } => cmd_init(local),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let config = &loaded.config;

    println!("# uiforge Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let server = config.server();
    println!("Server:");
    println!("  bind: {}:{}", server.bind, server.port);
    println!("  request logging: {}", server.request_logging);
    if !server.cors_origins.is_empty() {
        println!("  cors: {}", server.cors_origins.join(", "));
    }
    println!();

    let auth = config.auth();
    println!("Auth:");
    if auth.is_local() {
        println!("  local mode as '{}'", auth.local_user);
    } else {
        let mut users: Vec<&str> = auth.tokens.keys().map(String::as_str).collect();
        users.sort_unstable();
        if !users.is_empty() {
            println!("  token users: {}", users.join(", "));
        }
        if let Some(ref header) = auth.proxy_header {
            println!("  proxy header: {}", header);
        }
    }
    println!();

    let cache = config.cache();
    let store = config.store();
    let session = config.session();
    println!("Sessions:");
    match cache.backend {
        CacheBackend::Memory => println!("  cache: memory ({} entries)", cache.max_entries),
        CacheBackend::Redis => println!(
            "  cache: redis {}",
            cache.redis_url.as_deref().unwrap_or("(no url)")
        ),
    }
    match store.backend {
        StoreBackend::Sqlite => {
            let path = store
                .path
                .or_else(uiforge_config::default_db_path)
                .unwrap_or_else(|| PathBuf::from("sessions.db"));
            println!("  store: sqlite {}", path.display());
        }
        StoreBackend::Memory => println!("  store: memory"),
    }
    println!(
        "  ttl: drafts {}s, saved {}s, prefix '{}'",
        session.draft_ttl_secs, session.persisted_ttl_secs, session.key_prefix
    );
    println!();

    let generation = config.generation();
    println!("Generation:");
    if generation.enabled {
        let key_status = match uiforge_config::resolve_api_key(generation.api_key.as_deref()) {
            Some(secret) => format!("key from {}", secret.source),
            None => "no key".to_string(),
        };
        println!(
            "  model: {}  ({})",
            generation
                .model
                .as_deref()
                .unwrap_or(uiforge_llm::DEFAULT_GEMINI_MODEL),
            key_status
        );
    } else {
        println!("  disabled");
    }
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        println!("{}", config.to_toml()?);
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    println!("Config file search order (later overrides earlier):\n");

    for source in &ctx.loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }

    println!();
    let loaded_count = ctx.loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found. Run 'uiforge config init' to create one.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# uiforge configuration

[server]
port = 8080
bind = "127.0.0.1"
# cors_origins = ["http://localhost:5173"]

# Without tokens or a proxy header every request acts as local_user.
[auth]
local_user = "local"
# proxy_header = "X-Forwarded-User"

# [auth.tokens]
# alice = "change-me"

[cache]
backend = "memory"
# backend = "redis"
# redis_url = "redis://127.0.0.1:6379"

[store]
backend = "sqlite"

[session]
draft_ttl_secs = 3600
persisted_ttl_secs = 86400

# The API key is read from GEMINI_API_KEY.
[generation]
enabled = true
"#;

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("uiforge.toml")
    } else {
        let dir = uiforge_config::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        std::fs::create_dir_all(&dir)?;
        dir.join("config.toml")
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    std::fs::write(&path, CONFIG_TEMPLATE)?;
    println!("Created {}", path.display());
    Ok(())
}

fn cmd_path() -> Result<()> {
    match uiforge_config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("Could not determine config directory"),
    }
    Ok(())
}
