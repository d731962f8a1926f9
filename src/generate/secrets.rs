//! Credential lookup for external APIs. Keys are resolved by name at
//! construction time and never stored in configuration or source.

use crate::error::{PropevalError, Result};
use std::collections::HashMap;

/// Resolves a named secret (e.g. `GEMINI_API_KEY`) to its value.
pub trait SecretProvider {
    fn secret(&self, name: &str) -> Result<String>;
}

/// Reads secrets from the process environment, after loading `.env` if present.
#[derive(Debug, Default)]
pub struct EnvSecretProvider;

impl EnvSecretProvider {
    pub fn new() -> Self {
        let _ = dotenv::dotenv();
        Self
    }
}

impl SecretProvider for EnvSecretProvider {
    fn secret(&self, name: &str) -> Result<String> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            Ok(_) => Err(PropevalError::Secret(format!(
                "Environment variable {} is empty",
                name
            ))),
            Err(_) => Err(PropevalError::Secret(format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                name
            ))),
        }
    }
}

/// Fixed in-memory secrets, for embedding callers and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticSecretProvider {
    secrets: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl SecretProvider for StaticSecretProvider {
    fn secret(&self, name: &str) -> Result<String> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| PropevalError::Secret(format!("No secret named {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_provider_returns_value() {
        let provider = StaticSecretProvider::new().with("GEMINI_API_KEY", "k-123");
        assert_eq!(provider.secret("GEMINI_API_KEY").unwrap(), "k-123");
    }

    #[test]
    fn static_provider_missing_name() {
        let provider = StaticSecretProvider::new();
        let err = provider.secret("GEMINI_API_KEY").unwrap_err();
        assert!(matches!(err, PropevalError::Secret(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn env_provider_reads_variable() {
        let name = "PROPEVAL_TEST_SECRET_PRESENT";
        std::env::set_var(name, "value-1");
        assert_eq!(EnvSecretProvider::new().secret(name).unwrap(), "value-1");
        std::env::remove_var(name);
    }

    #[test]
    fn env_provider_missing_variable_does_not_leak() {
        let name = "PROPEVAL_TEST_SECRET_ABSENT";
        std::env::remove_var(name);
        let err = EnvSecretProvider::new().secret(name).unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn env_provider_rejects_blank_value() {
        let name = "PROPEVAL_TEST_SECRET_BLANK";
        std::env::set_var(name, "  ");
        assert!(EnvSecretProvider::new().secret(name).is_err());
        std::env::remove_var(name);
    }
}
