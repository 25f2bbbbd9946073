use std::path::PathBuf;

use anyhow::Context;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = lookup("LIBRETAS_API_URL")
            .filter(|value| !value.trim().is_empty())
            .context("LIBRETAS_API_URL must point at the school backend")?;

        let api_token = lookup("LIBRETAS_API_TOKEN").filter(|value| !value.trim().is_empty());

        let timeout_secs = match lookup("LIBRETAS_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("LIBRETAS_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let output_dir = lookup("LIBRETAS_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            api_url: api_url.trim().to_string(),
            api_token,
            timeout_secs,
            output_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("LIBRETAS_API_URL", "http://localhost:3000/api")]).unwrap();
        assert_eq!(config.api_url, "http://localhost:3000/api");
        assert_eq!(config.api_token, None);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[test]
    fn api_url_is_required() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("LIBRETAS_API_URL", " ")]).is_err());
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("LIBRETAS_API_URL", "http://api"),
            ("LIBRETAS_API_TOKEN", "abc"),
            ("LIBRETAS_TIMEOUT_SECS", "15"),
            ("LIBRETAS_OUTPUT_DIR", "/tmp/libretas"),
        ])
        .unwrap();
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/libretas"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let result = config_from(&[
            ("LIBRETAS_API_URL", "http://api"),
            ("LIBRETAS_TIMEOUT_SECS", "soon"),
        ]);
        assert!(result.is_err());
    }
}
