//! Agent settings read from configuration keys.
//!
//! Values come from a lookup function so callers decide the source: the process env
//! ([`AgentSettings::from_env`], after `config::load_and_apply`) or a read-only layer stack.

use std::time::Duration;

use crate::context::{DEFAULT_MAX_ITERATIONS, DEFAULT_MODEL_TIMEOUT, DEFAULT_TOOL_TIMEOUT};
use crate::llm::ChatOpenAI;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::tools::DEFAULT_USER_PROFILE;

pub const KEY_API_KEY: &str = "OPENAI_API_KEY";
pub const KEY_BASE_URL: &str = "OPENAI_BASE_URL";
pub const KEY_MODEL: &str = "RAGENT_MODEL";
pub const KEY_TEMPERATURE: &str = "RAGENT_TEMPERATURE";
pub const KEY_MAX_ITERATIONS: &str = "RAGENT_MAX_ITERATIONS";
pub const KEY_MODEL_TIMEOUT_SECS: &str = "RAGENT_MODEL_TIMEOUT_SECS";
pub const KEY_TOOL_TIMEOUT_SECS: &str = "RAGENT_TOOL_TIMEOUT_SECS";
pub const KEY_SYSTEM_PROMPT: &str = "RAGENT_SYSTEM_PROMPT";
pub const KEY_FEW_SHOT: &str = "RAGENT_FEW_SHOT";
pub const KEY_USER_PROFILE: &str = "RAGENT_USER_PROFILE";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_iterations: usize,
    pub model_timeout: Option<Duration>,
    pub tool_timeout: Option<Duration>,
    pub system_prompt: String,
    pub few_shot: bool,
    pub user_profile: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: crate::llm::openai::DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            model_timeout: Some(DEFAULT_MODEL_TIMEOUT),
            tool_timeout: Some(DEFAULT_TOOL_TIMEOUT),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            few_shot: false,
            user_profile: DEFAULT_USER_PROFILE.to_string(),
        }
    }
}

fn invalid(key: &str, value: &str) -> SettingsError {
    SettingsError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

/// Whole seconds; 0 disables the timeout.
fn parse_timeout(key: &str, value: &str) -> Result<Option<Duration>, SettingsError> {
    let secs: u64 = value.trim().parse().map_err(|_| invalid(key, value))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

impl AgentSettings {
    /// Reads every key through `lookup`; missing or blank keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut s = Self::default();

        s.api_key = get(KEY_API_KEY);
        if let Some(v) = get(KEY_BASE_URL) {
            s.base_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = get(KEY_MODEL) {
            s.model = v.trim().to_string();
        }
        if let Some(v) = get(KEY_TEMPERATURE) {
            s.temperature = v
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|t| (0.0..=2.0).contains(t))
                .ok_or_else(|| invalid(KEY_TEMPERATURE, &v))?;
        }
        if let Some(v) = get(KEY_MAX_ITERATIONS) {
            s.max_iterations = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid(KEY_MAX_ITERATIONS, &v))?;
        }
        if let Some(v) = get(KEY_MODEL_TIMEOUT_SECS) {
            s.model_timeout = parse_timeout(KEY_MODEL_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = get(KEY_TOOL_TIMEOUT_SECS) {
            s.tool_timeout = parse_timeout(KEY_TOOL_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = get(KEY_SYSTEM_PROMPT) {
            s.system_prompt = v;
        }
        if let Some(v) = get(KEY_FEW_SHOT) {
            s.few_shot = parse_bool(KEY_FEW_SHOT, &v)?;
        }
        if let Some(v) = get(KEY_USER_PROFILE) {
            s.user_profile = v;
        }
        Ok(s)
    }

    /// Reads from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// OpenAI-compatible model, when an API key is configured.
    pub fn chat_model(&self) -> Option<ChatOpenAI> {
        let key = self.api_key.as_ref()?;
        Some(
            ChatOpenAI::new(key.clone(), self.model.clone())
                .with_base_url(self.base_url.clone())
                .with_temperature(self.temperature),
        )
    }
}
