use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{IngestError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| IngestError::Config(format!("Failed to read config file: {e}")))?;
    let cfg: Config = serde_norway::from_str(&txt)
        .map_err(|e| IngestError::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    if cfg.idle_seconds == 0 {
        return Err(IngestError::Config("idle_seconds must be non-zero".to_string()));
    }
    if cfg.tick_seconds == 0 {
        return Err(IngestError::Config("tick_seconds must be non-zero".to_string()));
    }
    if cfg.timeout_seconds == 0 {
        return Err(IngestError::Config("timeout_seconds must be non-zero".to_string()));
    }
    Ok(())
}
