//! Application state shared across API handlers

use std::sync::Arc;

use quoter_core::{AppConfig, Pubkey};
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RwLock<AppConfig>,
    program_id: RwLock<Pubkey>,
}

impl AppState {
    /// Create a new application state with default config
    pub fn new() -> Result<Self, quoter_core::Error> {
        Self::with_config(AppConfig::default())
    }

    /// Create with a specific config. Fails when the program id does not parse.
    pub fn with_config(config: AppConfig) -> Result<Self, quoter_core::Error> {
        let program_id = config.program_id()?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config: RwLock::new(config),
                program_id: RwLock::new(program_id),
            }),
        })
    }

    /// Get current config
    pub async fn config(&self) -> AppConfig {
        self.inner.config.read().await.clone()
    }

    /// Program that owns pools, tick arrays and oracles
    pub async fn program_id(&self) -> Pubkey {
        *self.inner.program_id.read().await
    }

    /// Replace the configuration, keeping the old one if the program id is invalid
    pub async fn set_config(&self, config: AppConfig) -> Result<(), quoter_core::Error> {
        let program_id = config.program_id()?;
        tracing::info!(
            "Updating config: program {}, protocol {}, fallback {}",
            program_id,
            config.protocol_version,
            config.fallback_policy
        );

        let mut current = self.inner.config.write().await;
        let mut current_program = self.inner.program_id.write().await;
        *current = config;
        *current_program = program_id;
        Ok(())
    }
}
