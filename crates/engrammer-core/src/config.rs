//! Core configuration loaded from the environment.
//!
//! Everything is a plain env var so deployments change behavior without code
//! edits. [`CoreConfig::from_env`] loads a `.env` file first when one is
//! present.

use std::path::PathBuf;

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// Runtime configuration for the Engrammer core.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | ENGRAMMER_DATA_DIR | ./data | Root for tenant DB volumes and the tenant SQLite file. |
/// | ENGRAMMER_DOCKER_NETWORK | engrammer-net | Private bridge network for tenant containers. |
/// | ENGRAMMER_NEO4J_IMAGE | neo4j | Image used for provisioned tenant databases. |
/// | ENGRAMMER_NEO4J_WITH_APOC | true | Install the APOC plugin in provisioned containers. |
/// | ENGRAMMER_AUTO_PROVISION | true | Provision a container when a tenant registers with blank credentials. |
/// | ENGRAMMER_LLM_BASE_URL | https://api.openai.com/v1 | OpenAI-compatible chat endpoint. |
/// | ENGRAMMER_LLM_MODEL | gpt-4o-mini | Chat/classification model. |
/// | ENGRAMMER_LLM_API_KEY | — | Bearer token for the chat endpoint. |
/// | ENGRAMMER_VISION_HOST | — | Ollama-style host for image description; unset disables enrichment. |
/// | ENGRAMMER_VISION_MODEL | gemma3:4b | Vision model name. |
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// ENGRAMMER_DATA_DIR: root directory for per-tenant volumes and the tenant store.
    pub data_dir: PathBuf,
    /// ENGRAMMER_DOCKER_NETWORK: bridge network name for provisioned containers.
    pub docker_network: String,
    /// ENGRAMMER_NEO4J_IMAGE: image for provisioned tenant databases.
    pub neo4j_image: String,
    /// ENGRAMMER_NEO4J_WITH_APOC: whether provisioned containers get the APOC plugin.
    pub neo4j_with_apoc: bool,
    /// ENGRAMMER_AUTO_PROVISION: provision on blank-credential registration.
    pub auto_provision: bool,
    /// ENGRAMMER_LLM_BASE_URL: OpenAI-compatible API base.
    pub llm_base_url: String,
    /// ENGRAMMER_LLM_MODEL: model for completion and classification calls.
    pub llm_model: String,
    /// ENGRAMMER_LLM_API_KEY: bearer token; empty means unauthenticated endpoint.
    pub llm_api_key: Option<String>,
    /// ENGRAMMER_VISION_HOST: vision service host; None disables multimodal enrichment.
    pub vision_host: Option<String>,
    /// ENGRAMMER_VISION_MODEL: model used for image description.
    pub vision_model: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            docker_network: "engrammer-net".to_string(),
            neo4j_image: "neo4j".to_string(),
            neo4j_with_apoc: true,
            auto_provision: true,
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            llm_api_key: None,
            vision_host: None,
            vision_model: "gemma3:4b".to_string(),
        }
    }
}

impl CoreConfig {
    /// Load configuration from environment. Unset or invalid => defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        Self {
            data_dir: env_opt_string("ENGRAMMER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            docker_network: env_opt_string("ENGRAMMER_DOCKER_NETWORK")
                .unwrap_or(defaults.docker_network),
            neo4j_image: env_opt_string("ENGRAMMER_NEO4J_IMAGE").unwrap_or(defaults.neo4j_image),
            neo4j_with_apoc: env_bool("ENGRAMMER_NEO4J_WITH_APOC", true),
            auto_provision: env_bool("ENGRAMMER_AUTO_PROVISION", true),
            llm_base_url: env_opt_string("ENGRAMMER_LLM_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_model: env_opt_string("ENGRAMMER_LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_api_key: env_opt_string("ENGRAMMER_LLM_API_KEY"),
            vision_host: env_opt_string("ENGRAMMER_VISION_HOST"),
            vision_model: env_opt_string("ENGRAMMER_VISION_MODEL").unwrap_or(defaults.vision_model),
        }
    }

    /// Path of the tenant SQLite file under the data dir.
    pub fn tenant_db_path(&self) -> PathBuf {
        self.data_dir.join("engrammer_tenants.db")
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn env_opt_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.docker_network, "engrammer-net");
        assert!(cfg.auto_provision);
        assert!(cfg.vision_host.is_none());
        assert!(cfg.tenant_db_path().ends_with("engrammer_tenants.db"));
    }
}
