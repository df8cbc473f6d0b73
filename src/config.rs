//! YAML configuration file (`~/.config/gh-ci/config.yml`) and git remote parsing.

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `owner/name` of every watched repository.
    pub repos: Vec<String>,
    pub default_branch: String,
    /// Seconds between background refreshes.
    pub refresh_interval: u64,
    /// Seconds a status message stays visible.
    #[serde(rename = "default_msg_timeout")]
    pub message_timeout: u64,
    /// Runs per repository on a full refresh.
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repos: Vec::new(),
            default_branch: "main".to_string(),
            refresh_interval: 2,
            message_timeout: 3,
            page_size: 10,
        }
    }
}

impl Config {
    pub fn parse(raw: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to a mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(raw)?;
        Ok(cfg.normalized())
    }

    /// Loads `path` if given (it must exist), otherwise the default location if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_path().filter(|p| p.is_file()) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        let raw = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        let cfg = Self::parse(&raw)
            .wrap_err_with(|| format!("failed to parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), repos = cfg.repos.len(), "config loaded");
        Ok(cfg)
    }

    fn normalized(mut self) -> Self {
        if self.default_branch.trim().is_empty() {
            self.default_branch = "main".to_string();
        }
        self.refresh_interval = self.refresh_interval.max(1);
        self.message_timeout = self.message_timeout.max(1);
        self.page_size = self.page_size.clamp(1, 100);
        self.repos.retain(|r| !r.trim().is_empty());
        self
    }
}

/// `$XDG_CONFIG_HOME/gh-ci/config.yml`, falling back to `~/.config/gh-ci/config.yml`.
pub fn default_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir).join("gh-ci").join("config.yml"));
    }
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("gh-ci")
            .join("config.yml")
    })
}

/// Extracts `owner/name` from an SSH or HTTPS remote URL.
pub fn parse_git_remote(url: &str) -> Option<String> {
    let url = url.trim();
    let path = if let Some(rest) = url.strip_prefix("git@") {
        rest.split_once(':')?.1
    } else if let Some(rest) = url.strip_prefix("ssh://") {
        rest.split_once('/')?.1
    } else if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        rest.split_once('/')?.1
    } else {
        return None;
    };
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, name) = path.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(format!("{owner}/{name}"))
}

/// Help text printed when no repository could be determined.
pub fn missing_repo_help() -> String {
    let path = default_path().map_or_else(
        || "~/.config/gh-ci/config.yml".to_string(),
        |p| p.display().to_string(),
    );
    format!(
        "no repositories configured.\n\n\
         Run gh-ci inside a GitHub checkout, pass --repo owner/name, or create {path}:\n\n\
         repos:\n  - owner/name\ndefault_branch: main\nrefresh_interval: 2\n"
    )
}

pub fn ensure_repos(cfg: &Config) -> Result<()> {
    if cfg.repos.is_empty() {
        return Err(eyre!(missing_repo_help()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // --- parse ---

    #[test]
    fn full_file() {
        let raw = "repos:\n  - acme/api\n  - acme/web\ndefault_branch: trunk\nrefresh_interval: 5\ndefault_msg_timeout: 4\npage_size: 20\n";
        assert_eq!(
            Config::parse(raw).unwrap(),
            Config {
                repos: vec!["acme/api".into(), "acme/web".into()],
                default_branch: "trunk".into(),
                refresh_interval: 5,
                message_timeout: 4,
                page_size: 20,
            }
        );
    }

    #[test]
    fn missing_keys_use_defaults() {
        let cfg = Config::parse("repos: [acme/api]\n").unwrap();
        assert_eq!(cfg.default_branch, "main");
        assert_eq!(cfg.refresh_interval, 2);
        assert_eq!(cfg.message_timeout, 3);
        assert_eq!(cfg.page_size, 10);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
        assert_eq!(Config::parse("  \n").unwrap(), Config::default());
    }

    #[test]
    fn values_are_normalized() {
        let cfg = Config::parse("default_branch: ''\nrefresh_interval: 0\npage_size: 1000\nrepos: ['', a/b]\n").unwrap();
        assert_eq!(cfg.default_branch, "main");
        assert_eq!(cfg.refresh_interval, 1);
        assert_eq!(cfg.page_size, 100);
        assert_eq!(cfg.repos, vec!["a/b".to_string()]);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(Config::parse("repos: [unclosed").is_err());
    }

    #[test]
    fn load_missing_explicit_path_fails() {
        let path = std::env::temp_dir().join("gh-ci-test-does-not-exist.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn load_explicit_path() {
        let path = std::env::temp_dir().join(format!("gh-ci-config-{}.yml", std::process::id()));
        std::fs::write(&path, "repos: [acme/api]\nrefresh_interval: 9\n").unwrap();
        let cfg = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.repos, vec!["acme/api".to_string()]);
        assert_eq!(cfg.refresh_interval, 9);
    }

    #[test]
    fn ensure_repos_requires_one() {
        assert!(ensure_repos(&Config::default()).is_err());
        let cfg = Config {
            repos: vec!["a/b".into()],
            ..Config::default()
        };
        assert!(ensure_repos(&cfg).is_ok());
    }

    // --- parse_git_remote ---

    #[test]
    fn remote_ssh() {
        assert_eq!(parse_git_remote("git@github.com:acme/api.git"), Some("acme/api".into()));
        assert_eq!(parse_git_remote("git@github.com:acme/api"), Some("acme/api".into()));
        assert_eq!(parse_git_remote("ssh://git@github.com/acme/api.git"), Some("acme/api".into()));
    }

    #[test]
    fn remote_https() {
        assert_eq!(parse_git_remote("https://github.com/acme/api.git"), Some("acme/api".into()));
        assert_eq!(parse_git_remote("https://github.com/acme/api\n"), Some("acme/api".into()));
        assert_eq!(parse_git_remote("https://github.com/acme/api/"), Some("acme/api".into()));
    }

    #[test]
    fn remote_unrecognized() {
        assert_eq!(parse_git_remote("/srv/git/api.git"), None);
        assert_eq!(parse_git_remote("https://github.com/acme"), None);
        assert_eq!(parse_git_remote(""), None);
    }
}
