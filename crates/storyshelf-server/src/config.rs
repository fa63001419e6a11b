use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Runtime settings, read from `STORYSHELF_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub public_dir: PathBuf,
    pub cookie_secure: bool,
    pub session_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("STORYSHELF_PORT", "3000")
            .parse()
            .context("STORYSHELF_PORT must be a port number")?;
        let cookie_secure = var("STORYSHELF_COOKIE_SECURE", "false")
            .parse()
            .context("STORYSHELF_COOKIE_SECURE must be true or false")?;
        let session_sweep_secs: u64 = var("STORYSHELF_SESSION_SWEEP_SECS", "3600")
            .parse()
            .context("STORYSHELF_SESSION_SWEEP_SECS must be a number of seconds")?;
        if session_sweep_secs == 0 {
            anyhow::bail!("STORYSHELF_SESSION_SWEEP_SECS must be greater than zero");
        }

        Ok(Self {
            host: var("STORYSHELF_HOST", "0.0.0.0"),
            port,
            db_path: var("STORYSHELF_DB_PATH", "database.sqlite").into(),
            public_dir: var("STORYSHELF_PUBLIC_DIR", "public").into(),
            cookie_secure,
            session_sweep_secs,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
