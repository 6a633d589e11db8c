//! Provider API key resolution.
//!
//! Resolution order:
//! 1. `GEMINI_API_KEY` environment variable
//! 2. Config file (with warning at load time)

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Result of API key resolution with provenance.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

impl std::fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve the provider API key from the environment, then the config value.
pub fn resolve_api_key(config_value: Option<&str>) -> Option<ResolvedSecret> {
    resolve_with(std::env::var(API_KEY_ENV).ok(), config_value)
}

fn resolve_with(env_value: Option<String>, config_value: Option<&str>) -> Option<ResolvedSecret> {
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(API_KEY_ENV.to_string()),
        });
    }

    config_value
        .filter(|v| !v.trim().is_empty())
        .map(|value| ResolvedSecret {
            value: value.to_string(),
            source: SecretSource::ConfigFile,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_wins_over_config() {
        let secret = resolve_with(Some("from-env".to_string()), Some("from-file")).unwrap();
        assert_eq!(secret.value, "from-env");
        assert_eq!(secret.source, SecretSource::EnvVar(API_KEY_ENV.to_string()));
    }

    #[test]
    fn test_falls_back_to_config() {
        let secret = resolve_with(Some(String::new()), Some("from-file")).unwrap();
        assert_eq!(secret.value, "from-file");
        assert_eq!(secret.source, SecretSource::ConfigFile);
    }

    #[test]
    fn test_none_when_nothing_available() {
        assert!(resolve_with(None, None).is_none());
        assert!(resolve_with(None, Some("  ")).is_none());
    }

    #[test]
    fn test_debug_redacts_value() {
        let secret = resolve_with(None, Some("hunter2")).unwrap();
        assert!(!format!("{secret:?}").contains("hunter2"));
        assert_eq!(secret.source.to_string(), "config file (plaintext)");
    }
}
