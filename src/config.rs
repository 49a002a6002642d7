use anyhow::{Context, Result};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::info;

use crate::reputation::{ReputationThresholds, FP_SCALE};

/// Configuration for the trust engine host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Governance configuration
    pub governance: GovernanceConfig,
    /// Block clock and persistence
    pub chain: ChainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Enable request/response logging
    pub log_requests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Accounts allowed to resolve proposals and change edge status
    pub admins: Vec<String>,
    /// Fixed-point score below which a proposal opens
    pub proposal_threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Unix time of block 0
    pub genesis_time: i64,
    /// Seconds between blocks
    pub block_interval_secs: u64,
    /// JSON state file loaded at start and written on shutdown
    pub state_path: Option<PathBuf>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            admins: Vec::new(), // Must be set via environment
            proposal_threshold: ReputationThresholds::default().proposal_threshold,
        }
    }
}

impl GovernanceConfig {
    /// Convert to ReputationThresholds for use by ReputationManager
    pub fn to_thresholds(&self) -> ReputationThresholds {
        ReputationThresholds {
            proposal_threshold: self.proposal_threshold,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_time: 1_704_067_200, // 2024-01-01T00:00:00Z
            block_interval_secs: 5,
            state_path: None,
        }
    }
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8787,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                log_requests: false,
            },
            governance: GovernanceConfig::default(),
            chain: ChainConfig::default(),
        }
    }
}

impl TrustConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TrustConfig::from_env`] over an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Server configuration
        if let Some(host) = lookup("TRUST_HOST") {
            config.server.host = host;
        }

        if let Some(port) = lookup("TRUST_PORT") {
            config.server.port = port.parse().context("Invalid TRUST_PORT value")?;
        }

        // Logging configuration
        if let Some(level) = lookup("TRUST_LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }

        if let Some(log_requests) = lookup("TRUST_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("Invalid TRUST_LOG_REQUESTS value")?;
        }

        // Governance configuration
        let admins = lookup("TRUST_ADMINS")
            .context("TRUST_ADMINS environment variable is required")?;
        config.governance.admins = admins
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        if let Some(threshold) = lookup("TRUST_PROPOSAL_THRESHOLD") {
            config.governance.proposal_threshold = threshold
                .parse()
                .context("Invalid TRUST_PROPOSAL_THRESHOLD value")?;
        }

        // Chain configuration
        if let Some(genesis) = lookup("TRUST_GENESIS_TIME") {
            config.chain.genesis_time = DateTime::parse_from_rfc3339(&genesis)
                .context("Invalid TRUST_GENESIS_TIME value (expected RFC 3339)")?
                .timestamp();
        }

        if let Some(interval) = lookup("TRUST_BLOCK_INTERVAL_SECS") {
            config.chain.block_interval_secs = interval
                .parse()
                .context("Invalid TRUST_BLOCK_INTERVAL_SECS value")?;
        }

        if let Some(path) = lookup("TRUST_STATE_PATH").filter(|p| !p.trim().is_empty()) {
            config.chain.state_path = Some(PathBuf::from(path));
        }

        config.validate()?;

        info!(
            "Configuration loaded: {} admin(s), proposal threshold {}",
            config.governance.admins.len(),
            config.governance.proposal_threshold
        );

        Ok(config)
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if !matches!(
            self.logging.level.as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            return Err(anyhow::anyhow!(
                "Unknown log level: {}",
                self.logging.level
            ));
        }

        if self.governance.admins.is_empty() {
            return Err(anyhow::anyhow!("At least one admin must be configured"));
        }

        if self.governance.proposal_threshold > FP_SCALE {
            return Err(anyhow::anyhow!(
                "Proposal threshold {} exceeds the fixed-point scale {}",
                self.governance.proposal_threshold,
                FP_SCALE
            ));
        }

        if self.chain.block_interval_secs == 0 {
            return Err(anyhow::anyhow!("Block interval must be non-zero"));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
