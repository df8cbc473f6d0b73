use clap::Parser;
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "gh-ci", version = VERSION, about = "GitHub Actions pipeline dashboard TUI")]
pub struct Cli {
    /// Repository in owner/repo format; repeat to watch several (auto-detected from cwd)
    #[arg(short, long = "repo", value_parser = validate_repo_format)]
    pub repos: Vec<String>,

    /// Refresh interval in seconds (overrides the config file)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Branch selected at startup when the current checkout has none
    #[arg(short = 'b', long)]
    pub default_branch: Option<String>,

    /// Config file path (default: ~/.config/gh-ci/config.yml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write debug logs to the log file
    #[arg(short, long)]
    pub verbose: bool,
}

/// Accepts `owner/name` with no empty segment and no extra slashes.
pub fn validate_repo_format(s: &str) -> Result<String, String> {
    let s = s.trim();
    match s.split_once('/') {
        Some((owner, name))
            if !owner.is_empty()
                && !name.is_empty()
                && !name.contains('/')
                && !s.contains(char::is_whitespace) =>
        {
            Ok(s.to_string())
        }
        _ => Err(format!("invalid repository '{s}', expected owner/name")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repo_format_accepts_owner_name() {
        assert_eq!(validate_repo_format("acme/api"), Ok("acme/api".to_string()));
        assert_eq!(validate_repo_format(" acme/api "), Ok("acme/api".to_string()));
    }

    #[test]
    fn repo_format_rejects_malformed() {
        for bad in ["acme", "/api", "acme/", "a/b/c", "ac me/api", ""] {
            assert!(validate_repo_format(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn parses_repeated_repos() {
        let cli = Cli::try_parse_from(["gh-ci", "-r", "a/b", "--repo", "c/d", "-i", "5", "-v"]).unwrap();
        assert_eq!(cli.repos, vec!["a/b".to_string(), "c/d".to_string()]);
        assert_eq!(cli.interval, Some(5));
        assert!(cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn zero_interval_rejected() {
        assert!(Cli::try_parse_from(["gh-ci", "-i", "0"]).is_err());
    }

    #[test]
    fn invalid_repo_rejected() {
        assert!(Cli::try_parse_from(["gh-ci", "-r", "nope"]).is_err());
    }
}
