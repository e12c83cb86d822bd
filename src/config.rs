//! Configuration management for the PHP webserver launcher
//!
//! Separates startup configuration (requires restart) from the server
//! settings (can be updated via console commands before each start).

use config::{Config, Environment, File};
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::SettingsError;
use crate::launcher::{ElevationCandidate, ServerConfig};
use crate::utils::validation::{is_valid_input, parse_port};

/// Paths tried, in order, when no explicit config file is given
const CONFIG_PATHS: [&str; 2] = ["php-webserver-launcher/config", "config"];

/// Prefix for environment overrides, e.g. `PHP_LAUNCHER_SERVER__PORT=8080`
const ENV_PREFIX: &str = "PHP_LAUNCHER";

/// Complete launcher configuration with startup/runtime separation
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LauncherConfig {
    pub startup: StartupConfig,
    pub server: ServerSettings,
}

/// Configuration that requires a restart to take effect
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StartupConfig {
    /// Shell command line used for terminal sessions; `$SHELL` when unset
    pub shell: Option<String>,

    /// Forces an elevation template and skips probing
    pub elevation_template: Option<String>,

    /// Elevation tools probed at startup, highest priority first
    pub elevation_candidates: Vec<ElevationCandidate>,

    /// How long a stopped session may linger before it is killed
    pub stop_grace_ms: u64,

    /// Maximum console command length
    pub max_command_length: usize,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            shell: None,
            elevation_template: None,
            elevation_candidates: ElevationCandidate::defaults(),
            stop_grace_ms: 3000,
            max_command_length: 4096,
        }
    }
}

/// Server settings edited from the console and read fresh at each start
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub executable_path: String,
    pub bind_address: String,
    /// Kept as text, the way it was typed
    pub port: String,
    pub document_root: String,
    pub ini_path: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            executable_path: "/usr/bin/php".to_string(),
            bind_address: "localhost".to_string(),
            port: "8000".to_string(),
            document_root: home.to_string_lossy().to_string(),
            ini_path: None,
        }
    }
}

/// Editable server setting names, as typed after `SET`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    Executable,
    Address,
    Port,
    DocumentRoot,
    Ini,
}

impl SettingField {
    pub fn parse(name: &str) -> Result<Self, SettingsError> {
        match name.to_ascii_lowercase().as_str() {
            "php" | "executable" => Ok(SettingField::Executable),
            "address" | "host" => Ok(SettingField::Address),
            "port" => Ok(SettingField::Port),
            "root" | "docroot" => Ok(SettingField::DocumentRoot),
            "ini" => Ok(SettingField::Ini),
            _ => Err(SettingsError::UnknownField(name.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SettingField::Executable => "PHP executable",
            SettingField::Address => "Address",
            SettingField::Port => "Port",
            SettingField::DocumentRoot => "Root directory",
            SettingField::Ini => "INI file",
        }
    }
}

impl LauncherConfig {
    /// Load configuration from the first config.toml found, with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let found = CONFIG_PATHS
            .iter()
            .find(|path| Path::new(&format!("{path}.toml")).exists());

        match found {
            Some(path) => {
                info!("Loading configuration from {}.toml", path);
                Self::build(Some(path))
            }
            None => {
                debug!("No config.toml found in {:?}, using defaults", CONFIG_PATHS);
                Self::build(None)
            }
        }
    }

    /// Load configuration from an explicit file path
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        info!("Loading configuration from {}", path);
        Self::build(Some(path))
    }

    fn build(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: LauncherConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if let Some(template) = &self.startup.elevation_template {
            validate_template(template)?;
        }

        for candidate in &self.startup.elevation_candidates {
            validate_template(&candidate.template)?;
        }

        if self.startup.stop_grace_ms == 0 {
            return Err(config::ConfigError::Message(
                "stop_grace_ms must be greater than 0".into(),
            ));
        }

        if self.startup.max_command_length == 0 {
            return Err(config::ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        self.server.server_config()?;
        Ok(())
    }

    /// Split into startup (immutable) and server (editable) parts
    pub fn split(self) -> (StartupConfig, ServerSettings) {
        (self.startup, self.server)
    }
}

impl StartupConfig {
    /// Get the stop grace period as Duration
    pub fn stop_grace(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.stop_grace_ms)
    }
}

impl ServerSettings {
    /// Snapshot the settings as a `ServerConfig`, rejecting an unusable port
    pub fn server_config(&self) -> Result<ServerConfig, SettingsError> {
        if self.executable_path.trim().is_empty() {
            return Err(SettingsError::EmptyValue("PHP executable"));
        }
        if self.bind_address.trim().is_empty() {
            return Err(SettingsError::EmptyValue("Address"));
        }

        Ok(ServerConfig {
            executable_path: self.executable_path.clone(),
            bind_address: self.bind_address.clone(),
            port: parse_port(&self.port)?,
            document_root: self.document_root.clone(),
            ini_path: self.ini_path.clone(),
        })
    }

    /// Update one field from console input
    ///
    /// Paths must point at something that exists, the way a file chooser
    /// only offers existing entries. Relative paths are made absolute.
    pub fn set(&mut self, field: SettingField, value: &str) -> Result<(), SettingsError> {
        let value = value.trim();
        if !is_valid_input(value) {
            return Err(SettingsError::EmptyValue(field.label()));
        }

        match field {
            SettingField::Executable => {
                self.executable_path = existing_file(value)?;
            }
            SettingField::Address => {
                if value.contains(char::is_whitespace) {
                    return Err(SettingsError::MalformedInput(value.to_string()));
                }
                self.bind_address = value.to_string();
            }
            SettingField::Port => {
                parse_port(value)?;
                self.port = value.to_string();
            }
            SettingField::DocumentRoot => {
                let path = absolute(value);
                if !path.is_dir() {
                    return Err(SettingsError::DirectoryNotFound(value.to_string()));
                }
                self.document_root = path.to_string_lossy().to_string();
            }
            SettingField::Ini => {
                self.ini_path = Some(existing_file(value)?);
            }
        }
        Ok(())
    }

    pub fn clear_ini(&mut self) {
        self.ini_path = None;
    }
}

fn validate_template(template: &str) -> Result<(), SettingsError> {
    if template.matches("%s").count() == 1 {
        Ok(())
    } else {
        Err(SettingsError::InvalidTemplate(template.to_string()))
    }
}

fn existing_file(value: &str) -> Result<String, SettingsError> {
    let path = absolute(value);
    if path.is_file() {
        Ok(path.to_string_lossy().to_string())
    } else {
        Err(SettingsError::FileNotFound(value.to_string()))
    }
}

fn absolute(value: &str) -> PathBuf {
    std::path::absolute(value).unwrap_or_else(|_| PathBuf::from(value))
}
