use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BOOTSTRAP_SHARE_UNITS, DEFAULT_FLASH_FEE_BPS, MAX_FEE_BPS};
use crate::errors::{PoolError, PoolResult};
use crate::math::Fixed18;

/// Pool configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Flash-borrow fee in basis points (50 = 0.5%). Swaps carry no fee.
    pub flash_fee_bps: u16,
    
    /// Shares issued by a deposit into a pool with no outstanding shares
    pub bootstrap_shares: Fixed18,
}

impl PoolConfig {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> PoolResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PoolError::InvalidConfig(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        
        Self::from_toml_str(&content)
    }
    
    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> PoolResult<Self> {
        let config: PoolConfig = toml::from_str(content)
            .map_err(|e| PoolError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        
        config.validate()?;
        
        Ok(config)
    }
    
    /// Serialize configuration to a TOML string
    pub fn to_toml_string(&self) -> PoolResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PoolError::InvalidConfig(format!("Failed to serialize config: {}", e)))
    }
    
    /// Validate configuration
    pub fn validate(&self) -> PoolResult<()> {
        if self.flash_fee_bps > MAX_FEE_BPS {
            return Err(PoolError::invalid_config(
                "flash_fee_bps",
                &self.flash_fee_bps.to_string(),
                "at most 10000 (100%)",
            ));
        }
        
        if self.bootstrap_shares.is_zero() {
            return Err(PoolError::invalid_config("bootstrap_shares", "0", "greater than 0"));
        }
        
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            flash_fee_bps: DEFAULT_FLASH_FEE_BPS,
            bootstrap_shares: Fixed18::from_units(DEFAULT_BOOTSTRAP_SHARE_UNITS),
        }
    }
}
