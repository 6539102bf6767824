use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use notebook_api::auth::{TokenService, hash_password};
use notebook_api::config::ServerConfig;
use notebook_api::server::validation::normalize_email;
use notebook_api::server::{AppState, create_router};
use notebook_api::store::{SqliteStore, Store};
use notebook_api::types::{Role, User};

#[derive(Parser)]
#[command(name = "notebook-api")]
#[command(about = "Notebook and user administration API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory holding the database
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Database name; the file is <data-dir>/<name>.db
        #[arg(long)]
        database_name: Option<String>,

        /// Secret used to sign and verify session tokens
        #[arg(long, env = "NOTEBOOK_JWT_SECRET", hide_env_values = true)]
        jwt_secret: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the database and create the first admin user
    Init {
        #[command(flatten)]
        store: StoreArgs,

        /// Admin email address
        #[arg(long)]
        email: String,

        /// Admin display name
        #[arg(long, default_value = "Administrator")]
        name: String,

        /// Admin password
        #[arg(long, env = "NOTEBOOK_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print a session token for an existing user
    Token {
        #[command(flatten)]
        store: StoreArgs,

        /// User to issue the token for
        #[arg(long)]
        user_id: String,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// Data directory holding the database
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Database name; the file is <data-dir>/<name>.db
    #[arg(long, default_value = "notebooks")]
    database_name: String,

    /// Secret used to sign session tokens
    #[arg(long, env = "NOTEBOOK_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Lifetime of issued tokens in hours
    #[arg(long, default_value_t = 24)]
    token_ttl_hours: u64,
}

impl StoreArgs {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let config = ServerConfig {
            data_dir: self.data_dir,
            database_name: self.database_name,
            jwt_secret: self.jwt_secret,
            token_ttl_hours: self.token_ttl_hours,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(unix)]
fn set_restrictive_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    fs::create_dir_all(&config.data_dir)?;
    let db_path = config.db_path();
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    #[cfg(unix)]
    set_restrictive_permissions(&db_path);

    Ok(store)
}

fn run_init(config: ServerConfig, email: String, name: String, password: String) -> anyhow::Result<()> {
    let store = open_store(&config)?;

    if store.count_admins()? > 0 {
        bail!(
            "Server already initialized. An admin user exists in {}",
            config.db_path().display()
        );
    }

    let email = normalize_email(&email).map_err(|e| anyhow!(e.message))?;
    if password.is_empty() {
        bail!("Admin password cannot be empty");
    }

    let now = Utc::now();
    let admin = User {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        email,
        role: Role::Admin,
        is_verified: true,
        status: "active".to_string(),
        password: hash_password(&password)?,
        created_at: now,
        updated_at: now,
    };
    store.create_user(&admin)?;

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours)?;
    let raw_token = tokens.issue(&admin.id)?;

    println!();
    println!("========================================");
    println!("Created admin '{}' ({})", admin.email, admin.id);
    println!();
    println!("Session token (valid {}h):", config.token_ttl_hours);
    println!();
    println!("  {raw_token}");
    println!("========================================");
    println!();

    Ok(())
}

fn run_token(config: ServerConfig, user_id: String) -> anyhow::Result<()> {
    let store = open_store(&config)?;

    let Some(user) = store.get_user(&user_id)? else {
        bail!("User '{user_id}' not found");
    };

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours)?;
    println!("{}", tokens.issue(&user.id)?);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("notebook_api=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                store,
                email,
                name,
                password,
            } => {
                run_init(store.into_config()?, email, name, password)?;
            }
            AdminCommands::Token { store, user_id } => {
                run_token(store.into_config()?, user_id)?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            database_name,
            jwt_secret,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::from_file(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            if let Some(database_name) = database_name {
                config.database_name = database_name;
            }
            if let Some(jwt_secret) = jwt_secret {
                config.jwt_secret = jwt_secret;
            }
            config.validate()?;

            let store = Arc::new(open_store(&config)?);
            if store.count_admins()? == 0 {
                bail!(
                    "Server not initialized. Run 'notebook-api admin init' first to create an admin user."
                );
            }

            let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours)?;
            let state = Arc::new(AppState::new(store.clone(), store, tokens));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Using database {}", config.db_path().display());
            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
