//! Command-line and environment configuration for the relay
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it, which is how the server is configured when deployed.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;
use thiserror::Error;

use crate::puzzle::ValidationProfile;
use crate::source::{
    SourceConfig, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_SOURCE_URL, DEFAULT_USER_AGENT,
};

/// Origins allowed by default: the local dev server and the hosted front end
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,https://tommylam.github.io";

/// Error types for configuration parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// An allowed origin is not a valid header value
    #[error("Invalid allowed origin: '{0}'")]
    InvalidOrigin(String),
}

/// Letterbox Relay - serve the daily Letter Boxed puzzle data
#[derive(Parser, Debug)]
#[command(name = "letterbox-relay")]
#[command(about = "Serve the daily Letter Boxed puzzle data, refreshed once per New York day")]
#[command(version)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Page that embeds the puzzle data
    #[arg(long, env = "SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// User-Agent sent when fetching the page
    #[arg(long, env = "USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Origins allowed to call the API from a browser (comma-separated)
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = DEFAULT_ALLOWED_ORIGINS
    )]
    pub allowed_origins: Vec<String>,

    /// Timeout for fetching the page, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Which payload fields are required
    #[arg(long, env = "VALIDATION", value_enum, default_value_t = ValidationProfile::Strict)]
    pub validation: ValidationProfile,
}

/// Server configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub source: SourceConfig,
    pub allowed_origins: Vec<HeaderValue>,
    pub validation: ValidationProfile,
}

impl ServerConfig {
    /// Creates a ServerConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ServerConfig)` with the listen address and source settings
    /// * `Err(CliError::InvalidOrigin)` if an origin cannot be sent as a header
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let allowed_origins = cli
            .allowed_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| CliError::InvalidOrigin(origin.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ServerConfig {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, cli.port)),
            source: SourceConfig {
                url: cli.source_url.clone(),
                user_agent: cli.user_agent.clone(),
                timeout: Duration::from_secs(cli.fetch_timeout_secs),
            },
            allowed_origins,
            validation: cli.validation,
        })
    }
}
