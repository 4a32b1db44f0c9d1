use service_core::config as core_config;
use std::env;
use std::fmt;

/// Placeholder project identifier used when `GCP_PROJECT_ID` is not set.
/// The Gemini provider refuses to start with it.
pub const PROJECT_NOT_CONFIGURED: &str = "not-configured";

const DEFAULT_LOCATION: &str = "us-central1";
const DEFAULT_MODEL_ID: &str = "gemini-1.5-flash";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MONGODB_DATABASE: &str = "skillbridge";
const DEFAULT_MONGODB_COLLECTION: &str = "history";
const DEFAULT_MONGODB_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct SkillbridgeConfig {
    pub common: core_config::Config,
    pub gcp: GcpConfig,
    pub model: ModelConfig,
    pub history_store: HistoryStoreConfig,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GcpConfig {
    pub project_id: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProviderKind {
    Gemini,
    Mock,
}

#[derive(Clone)]
pub struct ModelConfig {
    pub provider: ModelProviderKind,
    /// Generative model identifier (e.g., gemini-1.5-flash)
    pub model_id: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    /// Overrides the regional Vertex AI host
    pub api_base: Option<String>,
    pub timeout_secs: u64,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("model_id", &self.model_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("access_token", &self.access_token.as_ref().map(|_| "[redacted]"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDb,
    Memory,
}

#[derive(Debug, Clone)]
pub struct HistoryStoreConfig {
    pub enabled: bool,
    pub backend: StoreBackend,
    pub mongodb_uri: Option<String>,
    pub database: String,
    pub collection: String,
    pub connect_timeout_secs: u64,
}

impl SkillbridgeConfig {
    /// Read the process environment. Never fails: bad values fall back.
    pub fn load() -> Self {
        let common = core_config::Config::load();
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup. Every setting has a
    /// default, so this never fails.
    pub fn from_lookup<F>(mut common: core_config::Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            common.port = parse_or_default("PORT", &port, common.port);
        }

        let provider = match get("MODEL_PROVIDER").as_deref().map(str::to_ascii_lowercase) {
            None => ModelProviderKind::Gemini,
            Some(value) if value == "gemini" => ModelProviderKind::Gemini,
            Some(value) if value == "mock" => ModelProviderKind::Mock,
            Some(value) => {
                tracing::warn!(value = %value, "Unknown MODEL_PROVIDER, using gemini");
                ModelProviderKind::Gemini
            }
        };

        let backend = match get("HISTORY_STORE_BACKEND").as_deref().map(str::to_ascii_lowercase) {
            None => StoreBackend::MongoDb,
            Some(value) if value == "mongodb" || value == "mongo" => StoreBackend::MongoDb,
            Some(value) if value == "memory" => StoreBackend::Memory,
            Some(value) => {
                tracing::warn!(value = %value, "Unknown HISTORY_STORE_BACKEND, using mongodb");
                StoreBackend::MongoDb
            }
        };

        let enabled = match get("HISTORY_STORE_ENABLED") {
            None => true,
            Some(value) => parse_flag(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unparseable HISTORY_STORE_ENABLED, using true");
                true
            }),
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        SkillbridgeConfig {
            common,
            gcp: GcpConfig {
                project_id: get("GCP_PROJECT_ID")
                    .unwrap_or_else(|| PROJECT_NOT_CONFIGURED.to_string()),
                location: get("GCP_LOCATION").unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            },
            model: ModelConfig {
                provider,
                model_id: get("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
                api_key: get("GOOGLE_API_KEY"),
                access_token: get("GOOGLE_ACCESS_TOKEN"),
                api_base: get("GENAI_API_BASE"),
                timeout_secs: get("GENAI_TIMEOUT_SECS")
                    .map(|v| parse_or_default("GENAI_TIMEOUT_SECS", &v, DEFAULT_MODEL_TIMEOUT_SECS))
                    .unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS),
            },
            history_store: HistoryStoreConfig {
                enabled,
                backend,
                mongodb_uri: get("MONGODB_URI"),
                database: get("MONGODB_DATABASE")
                    .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.to_string()),
                collection: get("MONGODB_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_MONGODB_COLLECTION.to_string()),
                connect_timeout_secs: get("MONGODB_CONNECT_TIMEOUT_SECS")
                    .map(|v| {
                        parse_or_default(
                            "MONGODB_CONNECT_TIMEOUT_SECS",
                            &v,
                            DEFAULT_MONGODB_CONNECT_TIMEOUT_SECS,
                        )
                    })
                    .unwrap_or(DEFAULT_MONGODB_CONNECT_TIMEOUT_SECS),
            },
            cors_allowed_origins,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or_default<T>(key: &str, value: &str, default: T) -> T
where
    T: std::str::FromStr + fmt::Display + Copy,
{
    value.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key = %key, value = %value, default = %default, "Unparseable setting, using default");
        default
    })
}
