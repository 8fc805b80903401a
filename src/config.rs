//! Service configuration, read from the environment.

use crate::pipeline::classifier::ClassificationMode;

/// HTTP service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Path to the local policy database file.
    pub db_path: String,
    /// How the classification stage treats the generator's output.
    pub classifier_mode: ClassificationMode,
}

impl ServiceConfig {
    /// Build the service configuration from environment variables.
    ///
    /// All fields have defaults — only LLM credentials (read separately by
    /// `LlmConfig::from_env`) are required.
    pub fn from_env() -> Self {
        let port = std::env::var("CARE_ASSIST_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let db_path = std::env::var("CARE_ASSIST_DB_PATH")
            .unwrap_or_else(|_| "./data/care-assist.db".to_string());

        Self {
            port,
            db_path,
            classifier_mode: ClassificationMode::from_env(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            db_path: "./data/care-assist.db".to_string(),
            classifier_mode: ClassificationMode::Fixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.classifier_mode, ClassificationMode::Fixed);
    }
}
