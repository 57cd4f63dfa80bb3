use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_paths")]
    pub paths: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            paths: default_search_paths(),
        }
    }
}

fn default_search_paths() -> Vec<String> {
    vec!["~/git".to_string()]
}

/// Loads the config from an explicit path, then the global location, then
/// compiled-in defaults. Only the search roots are configurable; layout and
/// scoring tunables are constants.
pub fn load(explicit_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit_path {
        return load_from_path(path);
    }

    let global_path = global_config_path()?;
    if global_path.exists() {
        return load_from_path(&global_path);
    }

    Ok(Config::default())
}

pub fn global_config_path() -> Result<PathBuf> {
    let config_root = dirs::config_dir().context("unable to resolve OS config directory")?;
    Ok(config_root.join("sessionizer").join("config.toml"))
}

/// Resolves the configured search paths, expanding a leading `~`.
pub fn search_roots(config: &Config) -> Vec<PathBuf> {
    config
        .search
        .paths
        .iter()
        .map(|raw| expand_tilde(raw))
        .collect()
}

fn expand_tilde(raw: &str) -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        if raw == "~" {
            return home;
        }
        if let Some(rest) = raw.strip_prefix("~/") {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

fn load_from_path(path: &Path) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.search.paths, vec!["~/git".to_string()]);
    }

    #[test]
    fn search_paths_are_configurable() {
        let raw = r#"
[search]
paths = ["~/git", "~/work", "/srv/projects"]
"#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.search.paths.len(), 3);
        assert_eq!(cfg.search.paths[2], "/srv/projects");
    }

    #[test]
    fn tilde_paths_expand_against_the_home_directory() {
        let Some(home) = dirs::home_dir() else {
            return;
        };

        let cfg: Config = toml::from_str("[search]\npaths = [\"~/git\"]\n").unwrap();
        let roots = search_roots(&cfg);
        assert_eq!(roots[0], home.join("git"));
    }

    #[test]
    fn load_reads_an_explicit_config_path() {
        let path = std::env::temp_dir().join(format!(
            "sessionizer-config-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[search]\npaths = [\"/srv/projects\"]\n").unwrap();

        let cfg = load(Some(&path)).unwrap();

        assert_eq!(cfg.search.paths, vec!["/srv/projects".to_string()]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let path = std::env::temp_dir().join(format!(
            "sessionizer-config-bad-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[search\npaths = oops").unwrap();

        let err = load(Some(&path)).unwrap_err().to_string();

        assert!(err.contains("invalid TOML"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn absolute_paths_are_left_alone() {
        let cfg: Config = toml::from_str("[search]\npaths = [\"/srv/projects\"]\n").unwrap();
        let roots = search_roots(&cfg);
        assert_eq!(roots[0], PathBuf::from("/srv/projects"));
    }
}
