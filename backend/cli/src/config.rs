use std::collections::HashMap;
use std::path::PathBuf;

use labelscan_config::{config_dir, config_file_path, LabelScanConfig};

/// Runtime settings taken from the environment. Anything set here wins over
/// the YAML file; CLI flags win over both.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path of the YAML config file
    pub config_path: PathBuf,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let get = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();
        Self {
            config_path: get("LABELSCAN_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|| config_file_path(&config_dir())),
            bind_address: get("LABELSCAN_BIND"),
            port: get("LABELSCAN_PORT").and_then(|p| p.parse().ok()),
            log_level: get("LABELSCAN_LOG"),
            log_dir: get("LABELSCAN_LOG_DIR").map(PathBuf::from),
            upload_dir: get("LABELSCAN_UPLOAD_DIR").map(PathBuf::from),
        }
    }

    /// Overlay the environment settings onto a loaded file config.
    pub fn apply(&self, config: &mut LabelScanConfig) {
        if let Some(host) = &self.bind_address {
            config.gateway.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            config.gateway.port = Some(port);
        }
        if let Some(level) = &self.log_level {
            config.logging.level = Some(level.clone());
        }
        if let Some(dir) = &self.log_dir {
            config.logging.dir = Some(dir.clone());
        }
        if let Some(dir) = &self.upload_dir {
            config.gateway.upload_dir = Some(dir.clone());
        }
    }
}
