// Server configuration
// Defaults, then an optional TOML file, then GQL_ADAPTER_* environment variables

use std::path::Path;

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::Result;

/// Prefix of the environment variables read by [`ServerConfig::load`]
pub const ENV_PREFIX: &str = "GQL_ADAPTER";

/// Config file read when no explicit path is given, if it exists
pub const DEFAULT_CONFIG_FILE: &str = "gql-adapter";

/// GraphQL server configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Route the adapter is mounted on
    pub path: String,
    pub cors_enabled: bool,
    pub graphiql_enabled: bool,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            path: "/graphql".to_string(),
            cors_enabled: true,
            graphiql_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration
    ///
    /// An explicit `file` must exist; without one, `gql-adapter.{toml,..}` in
    /// the working directory is used when present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("path", defaults.path)?
            .set_default("cors_enabled", defaults.cors_enabled)?
            .set_default("graphiql_enabled", defaults.graphiql_enabled)?
            .set_default("log_level", defaults.log_level)?;

        builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
