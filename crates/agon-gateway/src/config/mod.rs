//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use agon_core::error::{AgonError, Result};

pub use schema::{GatewayConfig, LlmSection, ServerSection};

/// Env var naming the YAML config path.
pub const CONFIG_PATH_ENV: &str = "AGON_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "agon.yaml";

/// Load from `$AGON_CONFIG` (or `agon.yaml`). A missing file yields the
/// built-in defaults; any other read or parse failure is an error.
pub fn load() -> Result<GatewayConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    match fs::read_to_string(&path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found, using defaults");
            let cfg = GatewayConfig::default();
            cfg.validate()?;
            Ok(cfg)
        }
        Err(e) => Err(AgonError::Internal(format!("read config failed ({path}): {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| AgonError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
