use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default remote endpoint
pub const DEFAULT_API_URL: &str = "https://mcp.programintegrity.org/";

/// Environment variable overriding `remote.api_url`
pub const ENV_API_URL: &str = "PIA_API_URL";

/// Environment variable overriding `remote.timeout_secs`
pub const ENV_REQUEST_TIMEOUT: &str = "PIA_REQUEST_TIMEOUT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub remote: RemoteConfig,
    pub limits: LimitsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub api_key_header: String,
    pub api_key_env: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 60,
            api_key_header: "x-api-key".to_string(),
            api_key_env: "PIA_API_KEY".to_string(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_results: u32,
    pub summary_results: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_results: 50,
            summary_results: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "pia-mcp-server".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            remote: RemoteConfig::default(),
            limits: LimitsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Command-line overrides, applied last
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Check if any overrides are set
    pub fn is_empty(&self) -> bool {
        self.api_url.is_none() && self.timeout_secs.is_none()
    }
}

/// Result of [`Config::load`]
#[derive(Debug)]
pub struct LoadReport {
    pub config: Config,
    /// File the config came from; `None` means defaults
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl LoadReport {
    pub fn log(&self) {
        for warning in &self.warnings {
            log::warn!("{}", warning);
        }
        match &self.source {
            Some(path) => log::info!("Loaded config from: {}", path.display()),
            None => log::info!("No config file found, using defaults"),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Nothing is logged here since logging is configured from the result;
    /// call [`LoadReport::log`] once the logger is up.
    pub fn load(config_path: Option<&PathBuf>) -> Result<LoadReport> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            let config =
                Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?;
            return Ok(LoadReport {
                config,
                source: Some(path.clone()),
                warnings: Vec::new(),
            });
        }

        let project_name = env!("CARGO_PKG_NAME");
        let file_name = format!("{}.yml", project_name);

        // ./<project>.yml, then ~/.config/<project>/<project>.yml
        let mut candidates = vec![PathBuf::from(&file_name)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(&file_name));
        }

        Ok(Self::load_from_candidates(&candidates))
    }

    /// First candidate that parses wins; broken files become warnings
    fn load_from_candidates(candidates: &[PathBuf]) -> LoadReport {
        let mut warnings = Vec::new();
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => {
                    return LoadReport {
                        config,
                        source: Some(path.clone()),
                        warnings,
                    };
                }
                Err(e) => warnings.push(format!("Failed to load config from {}: {:#}", path.display(), e)),
            }
        }

        LoadReport {
            config: Self::default(),
            source: None,
            warnings,
        }
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Apply `PIA_API_URL` / `PIA_REQUEST_TIMEOUT` from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            log::debug!("{} overrides remote.api_url", ENV_API_URL);
            self.remote.api_url = url;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT).filter(|v| !v.trim().is_empty()) {
            self.remote.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds, got '{}'", ENV_REQUEST_TIMEOUT, raw))?;
        }
        Ok(())
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.api_url {
            self.remote.api_url = url.clone();
        }
        if let Some(secs) = overrides.timeout_secs {
            self.remote.timeout_secs = secs;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.remote.api_url.trim().is_empty() {
            eyre::bail!("remote.api_url must not be empty");
        }
        if self.remote.timeout_secs == 0 {
            eyre::bail!("remote.timeout_secs must be > 0");
        }
        if self.remote.api_key_header.trim().is_empty() {
            eyre::bail!("remote.api_key_header must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert_eq!(config.remote.api_url, "https://mcp.programintegrity.org/");
        assert_eq!(config.remote.timeout_secs, 60);
        assert_eq!(config.remote.timeout(), Duration::from_secs(60));
        assert_eq!(config.remote.api_key_header, "x-api-key");
        assert_eq!(config.remote.api_key_env, "PIA_API_KEY");
        assert_eq!(config.limits.max_results, 50);
        assert_eq!(config.limits.summary_results, 20);
        assert_eq!(config.server.name, "pia-mcp-server");
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.yml");
        fs::write(
            &path,
            "remote:\n  api_url: http://127.0.0.1:9000/\n  timeout_secs: 5\nlimits:\n  summary_results: 7\n",
        )
        .unwrap();

        let report = Config::load(Some(&path)).unwrap();
        assert_eq!(report.source.as_ref(), Some(&path));
        assert!(report.warnings.is_empty());
        let config = report.config;
        assert_eq!(config.remote.api_url, "http://127.0.0.1:9000/");
        assert_eq!(config.remote.timeout_secs, 5);
        // Unspecified keys keep their defaults
        assert_eq!(config.remote.api_key_header, "x-api-key");
        assert_eq!(config.limits.summary_results, 7);
        assert_eq!(config.limits.max_results, 50);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_explicit_invalid_yaml_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "remote: [unclosed").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_malformed_implicit_file_is_a_warning() {
        let temp = TempDir::new().unwrap();
        let broken = temp.path().join("broken.yml");
        fs::write(&broken, "remote: [unclosed").unwrap();
        let good = temp.path().join("good.yml");
        fs::write(&good, "limits:\n  max_results: 9\n").unwrap();
        let absent = temp.path().join("absent.yml");

        let report = Config::load_from_candidates(&[absent.clone(), broken.clone(), good.clone()]);
        assert_eq!(report.source.as_ref(), Some(&good));
        assert_eq!(report.config.limits.max_results, 9);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with(&format!("Failed to load config from {}", broken.display())));
        assert!(report.warnings[0].contains("Failed to parse config file"));

        let report = Config::load_from_candidates(&[broken, absent]);
        assert!(report.source.is_none());
        assert_eq!(report.config.limits.max_results, 50);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_API_URL, "http://localhost:8080/"), (ENV_REQUEST_TIMEOUT, " 15 ")]);
        let mut config = Config::default();
        config
            .apply_env_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.remote.api_url, "http://localhost:8080/");
        assert_eq!(config.remote.timeout_secs, 15);
    }

    #[test]
    fn test_env_overrides_ignore_blank_values() {
        let mut config = Config::default();
        config.apply_env_from(|_| Some("   ".to_string())).unwrap();
        assert_eq!(config.remote.api_url, DEFAULT_API_URL);
        assert_eq!(config.remote.timeout_secs, 60);
    }

    #[test]
    fn test_env_override_bad_timeout() {
        let mut config = Config::default();
        let result = config.apply_env_from(|key| (key == ENV_REQUEST_TIMEOUT).then(|| "soon".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = Config::default();
        let overrides = ConfigOverrides {
            api_url: Some("http://override/".to_string()),
            timeout_secs: Some(3),
        };
        assert!(!overrides.is_empty());
        config.apply_overrides(&overrides);
        assert_eq!(config.remote.api_url, "http://override/");
        assert_eq!(config.remote.timeout_secs, 3);
    }

    #[test]
    fn test_empty_overrides() {
        let overrides = ConfigOverrides::default();
        assert!(overrides.is_empty());
        let mut config = Config::default();
        config.apply_overrides(&overrides);
        assert_eq!(config.remote.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.remote.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.remote.api_url = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.remote.api_key_header = String::new();
        assert!(config.validate().is_err());
    }
}
