//! Layered configuration for ragent.
//!
//! Keys resolve with priority **process env > project `.env` > XDG `config.toml`**. Use
//! [`Layers`] for a read-only lookup, or [`load_and_apply`] to copy missing keys into the
//! process environment before anything reads it.
//!
//! ```toml
//! # ~/.config/ragent/config.toml
//! [env]
//! OPENAI_API_KEY = "sk-..."
//!
//! [agent]
//! model = "gpt-4o-mini"
//! max_iterations = 12
//! ```

mod dotenv;
mod xdg_toml;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use xdg_toml::config_file_path;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Env,
    Dotenv,
    Xdg,
}

/// The `.env` and XDG layers, loaded once. The process env is consulted at lookup time.
#[derive(Debug, Clone, Default)]
pub struct Layers {
    dotenv: HashMap<String, String>,
    xdg: HashMap<String, String>,
    xdg_path: Option<PathBuf>,
}

impl Layers {
    /// Loads `.env` from `dotenv_dir` (current directory when `None`) and the app's XDG file.
    pub fn load(app_name: &str, dotenv_dir: Option<&Path>) -> Result<Self, LoadError> {
        let path = config_file_path(app_name)?;
        Self::load_from(Some(&path), dotenv_dir)
    }

    /// Like [`load`](Self::load) with an explicit config file (`None` skips the XDG layer).
    pub fn load_from(config_file: Option<&Path>, dotenv_dir: Option<&Path>) -> Result<Self, LoadError> {
        let xdg = match config_file {
            Some(p) => xdg_toml::load_env_map(p)?,
            None => HashMap::new(),
        };
        let dotenv = dotenv::load_env_map(dotenv_dir).map_err(LoadError::DotenvRead)?;
        Ok(Self {
            dotenv,
            xdg,
            xdg_path: config_file.filter(|p| p.is_file()).map(Path::to_path_buf),
        })
    }

    /// Config file that contributed values, if any.
    pub fn config_file(&self) -> Option<&Path> {
        self.xdg_path.as_deref()
    }

    /// Value and source of `key`, highest-priority layer first.
    pub fn resolve(&self, key: &str) -> Option<(String, Source)> {
        if let Ok(v) = std::env::var(key) {
            return Some((v, Source::Env));
        }
        self.file_value(key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.resolve(key).map(|(v, _)| v)
    }

    fn file_value(&self, key: &str) -> Option<(String, Source)> {
        self.dotenv
            .get(key)
            .map(|v| (v.clone(), Source::Dotenv))
            .or_else(|| self.xdg.get(key).map(|v| (v.clone(), Source::Xdg)))
    }

    /// Keys defined by the file layers, sorted.
    pub fn file_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .dotenv
            .keys()
            .chain(self.xdg.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Sets every file-layer key that is not already in the process env. Returns the keys set.
    pub fn apply(&self) -> Vec<String> {
        let mut applied = Vec::new();
        for key in self.file_keys() {
            if std::env::var_os(key).is_some() {
                continue;
            }
            if let Some((value, _)) = self.file_value(key) {
                std::env::set_var(key, value);
                applied.push(key.to_string());
            }
        }
        applied
    }
}

/// Loads the layers for `app_name` and applies them to the process env.
pub fn load_and_apply(app_name: &str, dotenv_dir: Option<&Path>) -> Result<Layers, LoadError> {
    let layers = Layers::load(app_name, dotenv_dir)?;
    layers.apply();
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    struct Fixture {
        _xdg: tempfile::TempDir,
        dotenv: tempfile::TempDir,
        config: PathBuf,
    }

    fn fixture(xdg: &str, dotenv: &str) -> Fixture {
        let xdg_dir = tempfile::tempdir().unwrap();
        let config = xdg_dir.path().join("config.toml");
        std::fs::write(&config, xdg).unwrap();
        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(dotenv_dir.path().join(".env"), dotenv).unwrap();
        Fixture {
            _xdg: xdg_dir,
            dotenv: dotenv_dir,
            config,
        }
    }

    #[test]
    fn dotenv_overrides_xdg() {
        let f = fixture(
            "[env]\nCONFIG_TEST_PRIORITY = \"from_xdg\"\nCONFIG_TEST_XDG_ONLY = \"x\"\n",
            "CONFIG_TEST_PRIORITY=from_dotenv\n",
        );
        let layers = Layers::load_from(Some(&f.config), Some(f.dotenv.path())).unwrap();
        assert_eq!(
            layers.resolve("CONFIG_TEST_PRIORITY"),
            Some(("from_dotenv".to_string(), Source::Dotenv))
        );
        assert_eq!(
            layers.resolve("CONFIG_TEST_XDG_ONLY"),
            Some(("x".to_string(), Source::Xdg))
        );
        assert_eq!(layers.config_file(), Some(f.config.as_path()));
        assert_eq!(
            layers.file_keys(),
            vec!["CONFIG_TEST_PRIORITY", "CONFIG_TEST_XDG_ONLY"]
        );
    }

    #[test]
    fn existing_env_wins() {
        let f = fixture("", "CONFIG_TEST_EXISTING=from_dotenv\n");
        env::set_var("CONFIG_TEST_EXISTING", "from_env");
        let layers = Layers::load_from(Some(&f.config), Some(f.dotenv.path())).unwrap();
        let resolved = layers.resolve("CONFIG_TEST_EXISTING");
        let applied = layers.apply();
        let after = env::var("CONFIG_TEST_EXISTING");
        env::remove_var("CONFIG_TEST_EXISTING");

        assert_eq!(resolved, Some(("from_env".to_string(), Source::Env)));
        assert!(applied.is_empty());
        assert_eq!(after.as_deref(), Ok("from_env"));
    }

    #[test]
    fn apply_sets_missing_keys() {
        let f = fixture("[agent]\nmodel = \"cfg-model\"\n", "CONFIG_TEST_APPLY=1\n");
        env::remove_var("CONFIG_TEST_APPLY");
        let layers = Layers::load_from(Some(&f.config), Some(f.dotenv.path())).unwrap();
        // RAGENT_MODEL may be set by the environment running the tests.
        let model_preset = env::var_os("RAGENT_MODEL").is_some();
        let applied = layers.apply();
        let val = env::var("CONFIG_TEST_APPLY");
        env::remove_var("CONFIG_TEST_APPLY");
        if !model_preset {
            env::remove_var("RAGENT_MODEL");
        }

        assert_eq!(val.as_deref(), Ok("1"));
        assert!(applied.contains(&"CONFIG_TEST_APPLY".to_string()));
        assert_eq!(applied.contains(&"RAGENT_MODEL".to_string()), !model_preset);
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let layers =
            Layers::load_from(Some(&dir.path().join("config.toml")), Some(dir.path())).unwrap();
        assert!(layers.file_keys().is_empty());
        assert!(layers.config_file().is_none());
        assert!(layers.get("CONFIG_TEST_SURELY_UNSET_KEY").is_none());
    }

    #[test]
    fn invalid_toml_fails_with_xdg_parse_error() {
        let f = fixture("invalid [[[\n", "");
        let result = Layers::load_from(Some(&f.config), Some(f.dotenv.path()));
        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }
}
