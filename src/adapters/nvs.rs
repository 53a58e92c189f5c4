//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the TramRun controller.  The whole
//! [`TramConfig`] is stored as one postcard blob.
//!
//! - **`target_os = "espidf"`**: `EspNvs` on the default partition,
//!   namespace `tramrun`, key `cfg`.
//! - **all other targets**: an in-memory map (dev/test only).

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::TramConfig;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

const CONFIG_NAMESPACE: &str = "tramrun";
const CONFIG_KEY: &str = "cfg";

/// Upper bound on the serialized config.
const MAX_BLOB_SIZE: usize = 256;

pub struct NvsConfigStore {
    #[cfg(target_os = "espidf")]
    nvs: EspNvs<NvsDefault>,
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsConfigStore {
    /// Open the config namespace on the default NVS partition.
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, ConfigError> {
        let nvs = EspNvs::new(partition, CONFIG_NAMESPACE, true).map_err(|e| {
            warn!("NVS: cannot open namespace '{}': {}", CONFIG_NAMESPACE, e);
            ConfigError::IoError
        })?;
        info!("NVS: namespace '{}' open", CONFIG_NAMESPACE);
        Ok(Self { nvs })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        info!("NVS: simulation backend");
        Self {
            store: HashMap::new(),
        }
    }

    /// Stored config if present and valid, defaults otherwise.
    pub fn load_or_default(&self) -> TramConfig {
        match self.load() {
            Ok(cfg) => cfg,
            Err(ConfigError::NotFound) => {
                info!("NVS: no stored config, using defaults");
                TramConfig::default()
            }
            Err(e) => {
                warn!("NVS: {}, using defaults", e);
                TramConfig::default()
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match self.nvs.get_blob(CONFIG_KEY, &mut buf) {
            Ok(Some(bytes)) => Ok(bytes.to_vec()),
            Ok(None) => Err(ConfigError::NotFound),
            Err(e) => {
                warn!("NVS: read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        self.store
            .get(CONFIG_KEY)
            .cloned()
            .ok_or(ConfigError::NotFound)
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.nvs.set_blob(CONFIG_KEY, bytes).map_err(|e| {
            warn!("NVS: write error {}", e);
            ConfigError::IoError
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.store.insert(CONFIG_KEY.into(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for NvsConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for NvsConfigStore {
    fn load(&self) -> Result<TramConfig, ConfigError> {
        let bytes = self.read_blob()?;
        let cfg: TramConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("NVS: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&mut self, config: &TramConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::IoError);
        }
        self.write_blob(&bytes)?;
        info!("NVS: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
