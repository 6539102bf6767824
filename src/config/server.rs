use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Name of the database inside `data_dir`; the file is `<name>.db`.
    pub database_name: String,
    /// HMAC secret for session tokens. Must be set before serving.
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
}

impl ServerConfig {
    /// Reads a TOML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address: {e}")))
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.db", self.database_name))
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            return Err(Error::Config(
                "jwt secret is required (set NOTEBOOK_JWT_SECRET or --jwt-secret)".to_string(),
            ));
        }
        if self.database_name.is_empty() || self.database_name.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "invalid database name '{}'",
                self.database_name
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            database_name: "notebooks".to_string(),
            jwt_secret: String::new(),
            token_ttl_hours: 24,
        }
    }
}
