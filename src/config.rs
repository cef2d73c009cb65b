use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use crate::dispatch::DispatchConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub catalog: CatalogConfig,
    pub packer: PackerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            catalog: CatalogConfig::from_env(),
            packer: PackerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value = env_string("CRATE_DISPATCH_API_HOST")
            .unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse CRATE_DISPATCH_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    Self::DEFAULT_HOST
                        .parse::<IpAddr>()
                        .expect("Default host must be valid"),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("CRATE_DISPATCH_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    eprintln!(
                        "⚠️ CRATE_DISPATCH_API_PORT must not be 0. Using {}.",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    eprintln!(
                        "⚠️ Could not parse CRATE_DISPATCH_API_PORT ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for the product catalog.
#[derive(Clone, Debug)]
pub struct CatalogConfig {
    store_path: PathBuf,
}

impl CatalogConfig {
    const DEFAULT_STORE_PATH: &'static str = "store.json";

    fn from_env() -> Self {
        Self {
            store_path: env_string("CRATE_DISPATCH_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_STORE_PATH)),
        }
    }

    /// Path of the JSON product store file.
    pub fn store_path(&self) -> &PathBuf {
        &self.store_path
    }
}

/// Configuration for the crate packer.
#[derive(Clone, Debug)]
pub struct PackerConfig {
    dispatch: DispatchConfig,
}

impl PackerConfig {
    const CORRECTED_SPARE_VAR: &'static str = "CRATE_DISPATCH_CORRECTED_SECONDARY_SPARE";

    fn from_env() -> Self {
        let corrected_secondary_spare = env_string(Self::CORRECTED_SPARE_VAR)
            .and_then(|raw| parse_bool(&raw, Self::CORRECTED_SPARE_VAR))
            .unwrap_or(DispatchConfig::DEFAULT_CORRECTED_SECONDARY_SPARE);
        if corrected_secondary_spare {
            println!(
                "⚠️ Corrected overflow-crate spare accounting enabled ({}). \
                 Results diverge from the legacy packer on boundary inputs.",
                Self::CORRECTED_SPARE_VAR
            );
        }

        Self {
            dispatch: DispatchConfig {
                corrected_secondary_spare,
            },
        }
    }

    /// Returns the configured DispatchConfig.
    pub fn dispatch_config(&self) -> DispatchConfig {
        self.dispatch
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            eprintln!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}
