use crate::error::PropevalError;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "PROPEVAL_CONFIG";

/// Main configuration structure. Every table is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub listings: ListingsConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

/// Input files for the ranking evaluator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub precision_path: PathBuf,
    pub mrr_path: PathBuf,
    pub ndcg_path: PathBuf,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            precision_path: PathBuf::from("k_precision_result.json"),
            mrr_path: PathBuf::from("mrr_result.json"),
            ndcg_path: PathBuf::from("ndcg_result.json"),
        }
    }
}

/// Generative text API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: String,
    pub model: String,
    /// Name of the secret holding the API key (never the key itself).
    pub api_key_env: String,
    pub api_base: String,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub max_retries: usize,
    /// Prompt sent per address; `{address}` is substituted.
    pub prompt_template: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash-lite".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_delay_ms: 500,
            timeout_secs: 30,
            max_retries: 3,
            prompt_template:
                "Write a professional real estate property description for this address: {address}"
                    .to_string(),
        }
    }
}

impl GenerationConfig {
    /// Render the prompt for one address.
    pub fn prompt_for(&self, address: &str) -> String {
        self.prompt_template.replace("{address}", address)
    }

    /// Validate the generation settings. Checked when a client is built, so
    /// steps that never call the API are unaffected by this table.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !SUPPORTED_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(PropevalError::Config(format!(
                "generation.provider '{}' is not supported (expected one of: {})",
                self.provider,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }

        if self.model.trim().is_empty() {
            return Err(PropevalError::Config(
                "generation.model must not be empty".to_string(),
            ));
        }

        if self.api_key_env.trim().is_empty() {
            return Err(PropevalError::Config(
                "generation.api_key_env must name the secret holding the API key".to_string(),
            ));
        }

        if !self.prompt_template.contains("{address}") {
            return Err(PropevalError::Config(
                "generation.prompt_template must contain the {address} placeholder".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(PropevalError::Config(
                "generation.timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// File locations for the listing and school data steps
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingsConfig {
    pub properties_path: PathBuf,
    pub rent_path: PathBuf,
    pub sale_path: PathBuf,
    pub merged_path: PathBuf,
    pub addresses_path: PathBuf,
    pub descriptions_path: PathBuf,
    pub full_property_path: PathBuf,
    pub schools_path: PathBuf,
    pub school_counts_path: PathBuf,
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            properties_path: PathBuf::from("properties.json"),
            rent_path: PathBuf::from("rent.json"),
            sale_path: PathBuf::from("sale.json"),
            merged_path: PathBuf::from("mergedProperties.json"),
            addresses_path: PathBuf::from("extracted_addresses.json"),
            descriptions_path: PathBuf::from("descriptions.jsonl"),
            full_property_path: PathBuf::from("full_property.json"),
            schools_path: PathBuf::from("schools.json"),
            school_counts_path: PathBuf::from("school_counts_by_zip.csv"),
        }
    }
}

/// Neighborhood data and case-study files for the property ranker
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub properties_path: PathBuf,
    pub crime_path: PathBuf,
    pub hospital_path: PathBuf,
    pub school_counts_path: PathBuf,
    pub ranked_path: PathBuf,
    pub case_studies_path: PathBuf,
    pub results_path: PathBuf,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            properties_path: PathBuf::from("properties.json"),
            crime_path: PathBuf::from("crimeData.json"),
            hospital_path: PathBuf::from("hospitalData.json"),
            school_counts_path: PathBuf::from("school_counts_by_zip.csv"),
            ranked_path: PathBuf::from("ranked_results.json"),
            case_studies_path: PathBuf::from("case_studies.json"),
            results_path: PathBuf::from("case_study_results.json"),
        }
    }
}

const SUPPORTED_PROVIDERS: &[&str] = &["gemini"];

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in PROPEVAL_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();
        let (config_path, _) = Self::config_path();
        Self::load_from(&config_path)
    }

    /// Like [`Config::load`], but a missing ./config.toml yields the defaults.
    /// A path named explicitly through PROPEVAL_CONFIG must still exist.
    pub fn load_or_default() -> Result<Self> {
        let _ = dotenv::dotenv();
        let (config_path, explicit) = Self::config_path();
        if !explicit && !config_path.exists() {
            log::debug!("No {} found, using default configuration", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// Load a specific config file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = read_config(config_path)?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        Ok(config)
    }

    /// Load a single table, e.g. `[evaluation]`, ignoring every other table.
    ///
    /// A missing ./config.toml or a missing table yields the table's defaults.
    /// A path named explicitly through PROPEVAL_CONFIG must still exist.
    pub fn load_table<T: DeserializeOwned + Default>(name: &str) -> Result<T> {
        let _ = dotenv::dotenv();
        let (config_path, explicit) = Self::config_path();
        if !explicit && !config_path.exists() {
            log::debug!("No {} found, using default [{}] settings", config_path.display(), name);
            return Ok(T::default());
        }
        Self::load_table_from(&config_path, name)
    }

    /// Like [`Config::load_table`], for a specific config file.
    pub fn load_table_from<T: DeserializeOwned + Default>(
        config_path: &Path,
        name: &str,
    ) -> Result<T> {
        let config_str = read_config(config_path)?;
        let mut tables: toml::Table = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        match tables.remove(name) {
            Some(table) => table
                .try_into::<T>()
                .with_context(|| format!("Invalid [{}] table in {}", name, config_path.display())),
            None => Ok(T::default()),
        }
    }

    fn config_path() -> (PathBuf, bool) {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from("config.toml"), false),
        }
    }
}

impl EvaluationConfig {
    /// The `[evaluation]` table alone; other tables are never parsed.
    pub fn load_or_default() -> Result<Self> {
        Config::load_table("evaluation")
    }
}

impl ListingsConfig {
    pub fn load_or_default() -> Result<Self> {
        Config::load_table("listings")
    }
}

impl RankingConfig {
    pub fn load_or_default() -> Result<Self> {
        Config::load_table("ranking")
    }
}

fn read_config(config_path: &Path) -> Result<String> {
    std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize tests that mutate process-wide env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn write_config(temp_dir: &TempDir, content: &str) -> PathBuf {
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn with_config_env(value: Option<&Path>, f: impl FnOnce()) {
        let original = std::env::var(CONFIG_ENV).ok();
        match value {
            Some(path) => std::env::set_var(CONFIG_ENV, path),
            None => std::env::remove_var(CONFIG_ENV),
        }
        f();
        std::env::remove_var(CONFIG_ENV);
        if let Some(val) = original {
            std::env::set_var(CONFIG_ENV, val);
        }
    }

    #[test]
    fn test_config_load_full() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            r#"
[evaluation]
precision_path = "labels/p.json"
mrr_path = "labels/mrr.json"
ndcg_path = "labels/ndcg.json"

[generation]
model = "gemini-2.0-flash"
api_key_env = "MY_KEY"
request_delay_ms = 0
max_retries = 1
prompt_template = "Describe {address} briefly."

[listings]
descriptions_path = "out/descriptions.jsonl"
"#,
        );

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.evaluation.precision_path, PathBuf::from("labels/p.json"));
        assert_eq!(config.evaluation.ndcg_path, PathBuf::from("labels/ndcg.json"));
        assert_eq!(config.generation.provider, "gemini");
        assert_eq!(config.generation.model, "gemini-2.0-flash");
        assert_eq!(config.generation.api_key_env, "MY_KEY");
        assert_eq!(config.generation.request_delay_ms, 0);
        assert_eq!(config.generation.timeout_secs, 30);
        assert_eq!(
            config.listings.descriptions_path,
            PathBuf::from("out/descriptions.jsonl")
        );
        assert_eq!(config.listings.sale_path, PathBuf::from("sale.json"));
    }

    #[test]
    fn test_config_empty_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(
            config.evaluation.mrr_path,
            PathBuf::from("mrr_result.json")
        );
        assert_eq!(config.generation.model, "gemini-2.0-flash-lite");
        assert_eq!(config.generation.request_delay_ms, 500);
    }

    #[test]
    fn test_generation_rejects_template_without_placeholder() {
        let generation = GenerationConfig {
            prompt_template: "Describe a house".to_string(),
            ..Default::default()
        };
        let err = generation.validate().unwrap_err();
        assert!(matches!(err, PropevalError::Config(_)));
        assert!(err.to_string().contains("{address}"));
    }

    #[test]
    fn test_generation_rejects_unknown_provider() {
        let generation = GenerationConfig {
            provider: "other".to_string(),
            ..Default::default()
        };
        let err = generation.validate().unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_generation_rejects_zero_timeout() {
        let generation = GenerationConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(generation.validate().is_err());
    }

    #[test]
    fn test_generation_defaults_are_valid() {
        assert!(GenerationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_load_does_not_validate_generation() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[generation]\nprovider = \"openai\"\n");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.generation.provider, "openai");
        assert!(config.generation.validate().is_err());
    }

    #[test]
    fn test_evaluation_table_ignores_broken_generation_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            r#"
[evaluation]
ndcg_path = "labels/ndcg.json"

[generation]
provider = "openai"
timeout_secs = "thirty"
"#,
        );
        assert!(Config::load_from(&path).is_err());

        let evaluation: EvaluationConfig = Config::load_table_from(&path, "evaluation").unwrap();
        assert_eq!(evaluation.ndcg_path, PathBuf::from("labels/ndcg.json"));
        assert_eq!(evaluation.precision_path, PathBuf::from("k_precision_result.json"));
    }

    #[test]
    fn test_missing_table_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[generation]\nmodel = \"m\"\n");
        let ranking: RankingConfig = Config::load_table_from(&path, "ranking").unwrap();
        assert_eq!(ranking.crime_path, PathBuf::from("crimeData.json"));
        assert_eq!(ranking.results_path, PathBuf::from("case_study_results.json"));
    }

    #[test]
    fn test_invalid_table_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[evaluation]\nmrr_path = 3\n");
        let err = Config::load_table_from::<EvaluationConfig>(&path, "evaluation").unwrap_err();
        assert!(err.to_string().contains("Invalid [evaluation] table"));
    }

    #[test]
    fn test_config_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[generation\nmodel = ");
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_prompt_for_substitutes_address() {
        let generation = GenerationConfig::default();
        let prompt = generation.prompt_for("1 Main St, Austin, TX 78701");
        assert!(prompt.ends_with("for this address: 1 Main St, Austin, TX 78701"));
    }

    #[test]
    fn test_config_load_from_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[generation]\nmax_retries = 7\n");
        with_config_env(Some(&path), || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            assert_eq!(config.unwrap().generation.max_retries, 7);
        });
    }

    #[test]
    fn test_config_explicit_missing_path_is_error() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nonexistent.toml");
        with_config_env(Some(&missing), || {
            assert!(Config::load().is_err());
            assert!(Config::load_or_default().is_err());
            assert!(EvaluationConfig::load_or_default().is_err());
        });
    }
}
