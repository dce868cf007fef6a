//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. Built-in defaults
//! 2. User config: `~/.config/missionindex/config.toml` (XDG) or platform config dir
//! 3. Project config: `.missionindex.toml`
//! 4. Environment variables: `MISSIONINDEX_<SECTION>_<KEY>` (e.g. `MISSIONINDEX_NEO4J_URI`,
//!    `MISSIONINDEX_SESSION_REUSE_CONNECTION`)
//! 5. Legacy environment variables: `GRAPH_DB_URI`, `GRAPH_DB_PASS`
//!
//! # Example
//!
//! ```toml
//! [neo4j]
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//! password = "secret"
//!
//! [session]
//! reuse_connection = false
//!
//! [marker]
//! path = "/home/me/.local/share/missionindex/voted.json"
//! ```
//!
//! Connection parameters are read when a session is opened; the rest of the
//! crate treats them as opaque strings.

use std::ops::Deref;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub marker: MarkerConfig,
}

/// Neo4j connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Bolt URI, e.g. `bolt://localhost:7687` or `neo4j+s://host`.
    #[serde(default = "default_uri")]
    pub uri: String,
    /// Database user.
    #[serde(default = "default_user")]
    pub user: String,
    /// Database password.
    #[serde(default)]
    pub password: Option<String>,
    /// Database name. The server default database is used when unset.
    #[serde(default)]
    pub database: Option<String>,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: None,
            database: None,
        }
    }
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Share one driver across sessions instead of connecting per session.
    #[serde(default)]
    pub reuse_connection: bool,
    /// Upper bound on driver connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reuse_connection: false,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> usize {
    4
}

/// Local "has voted" marker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// When false the marker behaves as if there were no local profile.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Marker file location. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

fn default_true() -> bool {
    true
}

impl MarkerConfig {
    /// Resolves the marker file, or `None` when there is no profile to write to.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.path.clone().or_else(|| {
            dirs::data_local_dir().map(|p| p.join("missionindex").join("voted.json"))
        })
    }
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// The layered figment used by [`Config::load`].
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            // Layer 1: User config
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(".missionindex.toml"))
            // Layer 3: Environment variables
            .merge(
                Env::prefixed("MISSIONINDEX_")
                    .map(|key| key.as_str().to_ascii_lowercase().replacen('_', ".", 1).into()),
            )
            // Layer 4: Legacy deployment variables
            .merge(
                Env::raw()
                    .only(&["GRAPH_DB_URI", "GRAPH_DB_PASS"])
                    .map(|key| {
                        if key.as_str().eq_ignore_ascii_case("GRAPH_DB_URI") {
                            "neo4j.uri".into()
                        } else {
                            "neo4j.password".into()
                        }
                    }),
            )
    }

    /// User config path: ~/.config/missionindex/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("missionindex").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("missionindex").join("config.toml"))
            .unwrap_or_default()
    }
}
