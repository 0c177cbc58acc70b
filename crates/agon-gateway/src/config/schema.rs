use serde::Deserialize;
use agon_core::error::{AgonError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub llm: LlmSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            llm: LlmSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AgonError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.llm.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// `["*"]` allows any origin.
    #[serde(default = "default_cors_allow_origins")]
    pub cors_allow_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            cors_allow_origins: default_cors_allow_origins(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(AgonError::BadRequest(format!(
                "server.listen must be a valid socket address: {}",
                self.listen
            )));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_cors_allow_origins() -> Vec<String> {
    vec!["*".into()]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the provider key. Read on every request.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Deadline for one provider round trip.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl LlmSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=600000).contains(&self.timeout_ms) {
            return Err(AgonError::BadRequest(
                "llm.timeout_ms must be between 1000 and 600000".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(AgonError::BadRequest("llm.model must not be empty".into()));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(AgonError::BadRequest("llm.api_key_env must not be empty".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AgonError::BadRequest(
                "llm.base_url must start with http:// or https://".into(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_timeout_ms() -> u64 {
    60000
}
