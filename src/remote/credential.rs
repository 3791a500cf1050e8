//! API key resolution
//!
//! The key is looked up on every call so a key exported after startup is
//! picked up without a restart. Absence is an ordinary `None`.

use std::fmt;

/// Where the API key comes from
#[derive(Clone)]
pub struct ApiKeySource {
    explicit: Option<String>,
    env_var: String,
}

impl ApiKeySource {
    /// Key given on the command line, falling back to `env_var`
    pub fn new(explicit: Option<String>, env_var: impl Into<String>) -> Self {
        Self {
            explicit: explicit.filter(|k| !k.trim().is_empty()),
            env_var: env_var.into(),
        }
    }

    /// Resolve against the process environment
    pub fn resolve(&self) -> Option<String> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve using the given environment lookup
    pub fn resolve_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = &self.explicit {
            return Some(key.clone());
        }
        lookup(&self.env_var).filter(|k| !k.trim().is_empty())
    }

    /// Name of the environment variable consulted
    pub fn env_var(&self) -> &str {
        &self.env_var
    }
}

impl fmt::Debug for ApiKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeySource")
            .field("explicit", &self.explicit.as_ref().map(|_| "<redacted>"))
            .field("env_var", &self.env_var)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_key_wins() {
        let source = ApiKeySource::new(Some("cli-key".into()), "PIA_API_KEY");
        assert_eq!(source.resolve_with(|_| Some("env-key".into())), Some("cli-key".into()));
    }

    #[test]
    fn test_env_fallback() {
        let source = ApiKeySource::new(None, "PIA_API_KEY");
        let key = source.resolve_with(|name| (name == "PIA_API_KEY").then(|| "env-key".to_string()));
        assert_eq!(key, Some("env-key".into()));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let source = ApiKeySource::new(Some("  ".into()), "PIA_API_KEY");
        assert_eq!(source.resolve_with(|_| Some(String::new())), None);
        assert_eq!(source.resolve_with(|_| None), None);
    }

    #[test]
    fn test_debug_redacts_key() {
        let source = ApiKeySource::new(Some("super-secret".into()), "PIA_API_KEY");
        let debug = format!("{:?}", source);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("PIA_API_KEY"));
    }
}
