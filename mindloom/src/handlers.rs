use mindloom_gen::Generator;
use std::path::PathBuf;

pub const DATABASE_FILE: &str = "mindloom.db";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

// Helper functions shared by the command handlers

/// Expands a user-supplied config directory and resolves the database
/// file inside it.
pub fn resolve_database_path(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    PathBuf::from(expanded.as_ref()).join(DATABASE_FILE)
}

/// Provider connection settings, sourced from the environment.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl ProviderConfig {
    /// Reads `MINDLOOM_ENDPOINT`, `MINDLOOM_API_KEY` and
    /// `MINDLOOM_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            endpoint: lookup("MINDLOOM_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key: lookup("MINDLOOM_API_KEY"),
            model: lookup("MINDLOOM_MODEL"),
        }
    }

    pub fn build(&self) -> Generator {
        let mut generator = Generator::new(&self.endpoint);
        if let Some(key) = &self.api_key {
            generator = generator.with_api_key(key);
        }
        if let Some(model) = &self.model {
            generator = generator.with_model(model);
        }
        generator
    }
}

/// Human-readable form of a directory timestamp.
pub fn format_updated(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
