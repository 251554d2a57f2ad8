use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Secret used when nothing is configured. Startup warns when it is in effect.
pub const DEFAULT_JWT_SECRET: &str = "not-so-secret-now-is-it?";

/// Server configuration loaded from YAML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub storage: StorageSettings,
    pub registry: RegistrySettings,
    pub log: LogSettings,
    pub seed: SeedSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub issuer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    pub database: String,
}

/// Partner hospital registry consulted for identifier lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub enabled: bool,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    pub demo_data: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8002,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration_secs: 7 * 24 * 3600,
            issuer: "hospital-api".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database: "hospital.sqlite".to_string(),
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: Some("https://hospital-a.api.co.th".to_string()),
            timeout_secs: 10,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl RegistrySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Base URL without trailing slash, if the registry should be consulted at all.
    pub fn active_base_url(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}

impl AuthSettings {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = if let Some(path) = config_path {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("HOSPITAL_API_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("PORT")
            && let Ok(port_num) = port.parse()
        {
            self.server.port = port_num;
        }

        if let Some(data_dir) = lookup("HOSPITAL_API_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Some(secret) = lookup("JWT_SECRET")
            && !secret.is_empty()
        {
            self.auth.jwt_secret = secret;
        }

        if let Some(secs) = lookup("JWT_EXPIRATION_IN_SECONDS")
            && let Ok(secs) = secs.parse()
        {
            self.auth.jwt_expiration_secs = secs;
        }

        if let Some(url) = lookup("HOSPITAL_A_API_URL") {
            self.registry.base_url = (!url.trim().is_empty()).then_some(url);
        }

        if let Some(secs) = lookup("HOSPITAL_A_API_TIMEOUT")
            && let Ok(secs) = secs.parse()
        {
            self.registry.timeout_secs = secs;
        }

        if let Some(seed) = lookup("HOSPITAL_API_SEED") {
            self.seed.demo_data = matches!(seed.as_str(), "1" | "true" | "yes");
        }
    }

    /// Get the full path to the database
    pub fn database_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 8002);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.registry.timeout(), Duration::from_secs(10));
        assert_eq!(config.auth.token_ttl(), Duration::from_secs(604_800));
        assert!(config.auth.uses_default_secret());
        assert!(!config.seed.demo_data);
    }

    #[test]
    fn test_db_path() {
        let config = ServerConfig::default();
        assert_eq!(config.database_path(), PathBuf::from("data/hospital.sqlite"));
    }

    #[test]
    fn test_yaml_partial_sections_use_defaults() {
        let yaml = r#"
server:
  port: 9000
registry:
  base_url: "http://partner.local/"
  timeout_secs: 3
log:
  format: json
"#;
        let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.registry.active_base_url(), Some("http://partner.local"));
        assert_eq!(config.registry.timeout(), Duration::from_secs(3));
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.auth.issuer, "hospital-api");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9100"),
            ("JWT_SECRET", "from-env"),
            ("JWT_EXPIRATION_IN_SECONDS", "60"),
            ("HOSPITAL_A_API_URL", "http://127.0.0.1:7000"),
            ("HOSPITAL_A_API_TIMEOUT", "2"),
            ("HOSPITAL_API_SEED", "true"),
        ]);

        let mut config = ServerConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert!(!config.auth.uses_default_secret());
        assert_eq!(config.auth.jwt_expiration_secs, 60);
        assert_eq!(config.registry.active_base_url(), Some("http://127.0.0.1:7000"));
        assert_eq!(config.registry.timeout_secs, 2);
        assert!(config.seed.demo_data);
    }

    #[test]
    fn test_env_ignores_unparsable_numbers() {
        let mut config = ServerConfig::default();
        config.apply_env(|key| match key {
            "PORT" => Some("not-a-port".to_string()),
            "HOSPITAL_A_API_TIMEOUT" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.server.port, 8002);
        assert_eq!(config.registry.timeout_secs, 10);
    }

    #[test]
    fn test_registry_disabled() {
        let settings = RegistrySettings {
            enabled: false,
            ..RegistrySettings::default()
        };
        assert_eq!(settings.active_base_url(), None);

        let settings = RegistrySettings {
            enabled: true,
            base_url: Some("  ".to_string()),
            timeout_secs: 10,
        };
        assert_eq!(settings.active_base_url(), None);
    }
}
