use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Env var holding the Slack bot token.
pub const TOKEN_VAR: &str = "TOKEN";
/// Env var holding the Wercker API token.
pub const CI_TOKEN_VAR: &str = "WERCKER_TOKEN";
/// Env var naming an optional JSON config file.
pub const CONFIG_PATH_VAR: &str = "MARIO_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither the env var nor the first argument supplied a token.
    #[error("no Slack token: set TOKEN or pass it as the first argument")]
    MissingToken,
    /// Failed to read the config file.
    #[error("failed to read config file '{}': {source}", .path.display())]
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    #[error("failed to parse config file '{}': {source}", .path.display())]
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// What the receive loop does when a reply cannot be sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendErrorPolicy {
    /// Log and stop the loop with the error.
    #[default]
    Exit,
    /// Log and keep receiving.
    Continue,
}

#[derive(Deserialize)]
#[serde(default)]
struct ConfigFile {
    /// Name users address the bot by in help texts (e.g. "@mario help").
    bot_name: String,
    api_base_url: String,
    ci_api_url: String,
    /// Wercker organisation whose applications `apps` lists.
    ci_org: String,
    on_send_error: SendErrorPolicy,
    /// Directory for log files.
    log_dir: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            bot_name: "mario".to_string(),
            api_base_url: "https://slack.com/api".to_string(),
            ci_api_url: "https://app.wercker.com/api/v3".to_string(),
            ci_org: "umbrellium".to_string(),
            on_send_error: SendErrorPolicy::default(),
            log_dir: "logs".to_string(),
        }
    }
}

/// Settings for the Wercker app listing.
#[derive(Debug, Clone)]
pub struct CiConfig {
    pub api_url: String,
    pub org: String,
    /// May be empty, in which case only public apps are listed.
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub bot_name: String,
    pub api_base_url: String,
    pub ci: CiConfig,
    pub on_send_error: SendErrorPolicy,
    pub log_dir: PathBuf,
}

impl Config {
    /// Resolve configuration from the process environment and arguments.
    pub fn from_env() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::resolve(|key| std::env::var(key).ok(), &args)
    }

    /// Resolve configuration from an env lookup and positional arguments.
    ///
    /// The Slack token comes from `TOKEN`, then `args[0]`. The Wercker token
    /// comes from `WERCKER_TOKEN`, then `args[1]`, and may be empty.
    pub fn resolve<F>(env: F, args: &[String]) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = env(TOKEN_VAR)
            .filter(|t| !t.is_empty())
            .or_else(|| args.first().cloned())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let ci_token = env(CI_TOKEN_VAR)
            .filter(|t| !t.is_empty())
            .or_else(|| args.get(1).cloned())
            .unwrap_or_default();

        let file = match env(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
            Some(path) => load_file(PathBuf::from(path))?,
            None => ConfigFile::default(),
        };

        if file.bot_name.trim().is_empty() {
            return Err(ConfigError::Validation("bot_name must not be empty".into()));
        }
        if file.api_base_url.trim().is_empty() {
            return Err(ConfigError::Validation("api_base_url must not be empty".into()));
        }

        Ok(Self {
            token,
            bot_name: file.bot_name,
            api_base_url: file.api_base_url,
            ci: CiConfig {
                api_url: file.ci_api_url,
                org: file.ci_org,
                token: ci_token,
            },
            on_send_error: file.on_send_error,
            log_dir: PathBuf::from(file.log_dir),
        })
    }
}

fn load_file(path: PathBuf) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(&path)
        .map_err(|e| ConfigError::ReadFile { path: path.clone(), source: e })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_token_from_env() {
        let config = Config::resolve(env_of(&[("TOKEN", "xoxb-env")]), &args(&["xoxb-arg"])).unwrap();
        assert_eq!(config.token, "xoxb-env");
    }

    #[test]
    fn test_token_falls_back_to_first_arg() {
        let config = Config::resolve(env_of(&[]), &args(&["xoxb-arg"])).unwrap();
        assert_eq!(config.token, "xoxb-arg");
    }

    #[test]
    fn test_empty_env_token_falls_back_to_arg() {
        let config = Config::resolve(env_of(&[("TOKEN", "")]), &args(&["xoxb-arg"])).unwrap();
        assert_eq!(config.token, "xoxb-arg");
    }

    #[test]
    fn test_missing_token() {
        let err = assert_err(Config::resolve(env_of(&[]), &[]));
        assert!(matches!(err, ConfigError::MissingToken));
        assert!(err.to_string().contains("TOKEN"));
    }

    #[test]
    fn test_empty_arg_token_is_missing() {
        let err = assert_err(Config::resolve(env_of(&[]), &args(&[""])));
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_defaults_without_config_file() {
        let config = Config::resolve(env_of(&[("TOKEN", "xoxb-1")]), &[]).unwrap();
        assert_eq!(config.bot_name, "mario");
        assert_eq!(config.api_base_url, "https://slack.com/api");
        assert_eq!(config.ci.org, "umbrellium");
        assert_eq!(config.ci.token, "");
        assert_eq!(config.on_send_error, SendErrorPolicy::Exit);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_ci_token_from_env_or_second_arg() {
        let from_env = Config::resolve(
            env_of(&[("TOKEN", "xoxb-1"), ("WERCKER_TOKEN", "w-env")]),
            &args(&["ignored", "w-arg"]),
        )
        .unwrap();
        assert_eq!(from_env.ci.token, "w-env");

        let from_arg = Config::resolve(env_of(&[]), &args(&["xoxb-1", "w-arg"])).unwrap();
        assert_eq!(from_arg.ci.token, "w-arg");
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let file = write_config(r#"{
            "bot_name": "luigi",
            "api_base_url": "http://localhost:9000/api",
            "ci_org": "acme",
            "on_send_error": "continue",
            "log_dir": "/tmp/luigi"
        }"#);
        let path = file.path().to_string_lossy().to_string();
        let config = Config::resolve(
            env_of(&[("TOKEN", "xoxb-1"), ("MARIO_CONFIG", path.as_str())]),
            &[],
        )
        .unwrap();
        assert_eq!(config.bot_name, "luigi");
        assert_eq!(config.api_base_url, "http://localhost:9000/api");
        assert_eq!(config.ci.org, "acme");
        assert_eq!(config.ci.api_url, "https://app.wercker.com/api/v3");
        assert_eq!(config.on_send_error, SendErrorPolicy::Continue);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/luigi"));
    }

    #[test]
    fn test_empty_bot_name() {
        let file = write_config(r#"{ "bot_name": "  " }"#);
        let path = file.path().to_string_lossy().to_string();
        let err = assert_err(Config::resolve(
            env_of(&[("TOKEN", "xoxb-1"), ("MARIO_CONFIG", path.as_str())]),
            &[],
        ));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("bot_name"));
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let file = write_config(r#"{ "on_send_error": "retry" }"#);
        let path = file.path().to_string_lossy().to_string();
        let err = assert_err(Config::resolve(
            env_of(&[("TOKEN", "xoxb-1"), ("MARIO_CONFIG", path.as_str())]),
            &[],
        ));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::resolve(
            env_of(&[("TOKEN", "xoxb-1"), ("MARIO_CONFIG", "/nonexistent/path/config.json")]),
            &[],
        ));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let path = file.path().to_string_lossy().to_string();
        let err = assert_err(Config::resolve(
            env_of(&[("TOKEN", "xoxb-1"), ("MARIO_CONFIG", path.as_str())]),
            &[],
        ));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
