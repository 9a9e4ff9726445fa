//! `$XDG_CONFIG_HOME/<app>/config.toml`: an `[env]` table of raw keys plus an optional
//! `[agent]` table of typed settings mapped onto their `RAGENT_*` keys.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::LoadError;

/// Resolves the config file path. `XDG_CONFIG_HOME` wins when set and non-empty, otherwise
/// the platform config dir from `dirs`.
pub fn config_file_path(app_name: &str) -> Result<PathBuf, LoadError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into()))?;
    Ok(base.join(app_name).join("config.toml"))
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    agent: AgentTable,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AgentTable {
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f64>,
    max_iterations: Option<u64>,
    model_timeout_secs: Option<u64>,
    tool_timeout_secs: Option<u64>,
    system_prompt: Option<String>,
    few_shot: Option<bool>,
    user_profile: Option<String>,
}

impl AgentTable {
    fn into_env(self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(v) = value {
                out.push((key, v));
            }
        };
        push("RAGENT_MODEL", self.model);
        push("OPENAI_BASE_URL", self.base_url);
        push("RAGENT_TEMPERATURE", self.temperature.map(|t| t.to_string()));
        push("RAGENT_MAX_ITERATIONS", self.max_iterations.map(|n| n.to_string()));
        push("RAGENT_MODEL_TIMEOUT_SECS", self.model_timeout_secs.map(|n| n.to_string()));
        push("RAGENT_TOOL_TIMEOUT_SECS", self.tool_timeout_secs.map(|n| n.to_string()));
        push("RAGENT_SYSTEM_PROMPT", self.system_prompt);
        push("RAGENT_FEW_SHOT", self.few_shot.map(|b| b.to_string()));
        push("RAGENT_USER_PROFILE", self.user_profile);
        out
    }
}

/// Key-value pairs from `path`. `[agent]` entries override `[env]` entries for the same key.
/// A missing file yields an empty map.
pub fn load_env_map(path: &Path) -> Result<HashMap<String, String>, LoadError> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    let mut map = config.env;
    for (key, value) in config.agent.into_env() {
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let map = load_env_map(&dir.path().join("config.toml")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn env_table_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "[env]\nOPENAI_API_KEY = \"sk-test\"\nRAGENT_MODEL = \"gpt-4o\"\n",
        );
        let map = load_env_map(&path).unwrap();
        assert_eq!(map.get("OPENAI_API_KEY").map(String::as_str), Some("sk-test"));
        assert_eq!(map.get("RAGENT_MODEL").map(String::as_str), Some("gpt-4o"));
    }

    #[test]
    fn agent_table_maps_to_keys_and_wins_over_env_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
[env]
RAGENT_MODEL = "from-env-table"

[agent]
model = "from-agent-table"
temperature = 0.5
max_iterations = 8
few_shot = true
"#,
        );
        let map = load_env_map(&path).unwrap();
        assert_eq!(map["RAGENT_MODEL"], "from-agent-table");
        assert_eq!(map["RAGENT_TEMPERATURE"], "0.5");
        assert_eq!(map["RAGENT_MAX_ITERATIONS"], "8");
        assert_eq!(map["RAGENT_FEW_SHOT"], "true");
        assert!(!map.contains_key("RAGENT_SYSTEM_PROMPT"));
    }

    #[test]
    fn unknown_agent_key_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[agent]\nmodle = \"typo\"\n");
        assert!(matches!(load_env_map(&path), Err(LoadError::XdgParse(_))));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "not valid toml [[[\n");
        assert!(matches!(load_env_map(&path), Err(LoadError::XdgParse(_))));
    }

    #[test]
    fn config_path_ends_with_app_and_file_name() {
        let path = config_file_path("ragent").unwrap();
        assert!(path.ends_with("ragent/config.toml"));
    }
}
