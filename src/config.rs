use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, ConfigError};

/// Path Telegram delivers updates to.
pub const WEBHOOK_PATH: &str = "/api";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Config {
    pub telegram_token: Option<String>,
    pub vercel_url: Option<String>,
    pub bot_username: String,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(value) => {
                let parsed = value.trim().parse::<u16>();
                parsed.map_err(|_| ConfigError::Invalid { var: "PORT", value })?
            }
            None => DEFAULT_PORT,
        };

        let request_timeout = match get("BOT_REQUEST_TIMEOUT_SECS") {
            Some(value) => {
                let parsed = value.trim().parse::<u64>();
                match parsed {
                    Ok(secs) if secs > 0 => Duration::from_secs(secs),
                    _ => {
                        return Err(ConfigError::Invalid {
                            var: "BOT_REQUEST_TIMEOUT_SECS",
                            value,
                        })
                    }
                }
            }
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            telegram_token: get("TELEGRAM_TOKEN").map(|token| token.trim().to_owned()),
            vercel_url: get("VERCEL_URL").map(|url| url.trim().to_owned()),
            bot_username: get("BOT_USERNAME").unwrap_or_default(),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port,
            request_timeout,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Callback URL Telegram should deliver updates to: `https://{VERCEL_URL}/api`.
    pub fn webhook_url(&self) -> Result<Url, AppError> {
        let host = self
            .vercel_url
            .as_deref()
            .ok_or(AppError::MissingConfig("VERCEL_URL"))?;

        let url = format!("https://{host}{WEBHOOK_PATH}");
        Url::parse(&url).map_err(|source| AppError::InvalidWebhookUrl { url, source })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_token: None,
            vercel_url: None,
            bot_username: String::new(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "telegram_token",
                &self.telegram_token.as_ref().map(|_| "<redacted>"),
            )
            .field("vercel_url", &self.vercel_url)
            .field("bot_username", &self.bot_username)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();

        assert!(config.telegram_token.is_none());
        assert!(config.vercel_url.is_none());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = config(&[("TELEGRAM_TOKEN", ""), ("VERCEL_URL", "  ")]).unwrap();

        assert!(config.telegram_token.is_none());
        assert!(config.vercel_url.is_none());
    }

    #[test]
    fn rejects_bad_port_and_timeout() {
        assert!(matches!(
            config(&[("PORT", "http")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("BOT_REQUEST_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid {
                var: "BOT_REQUEST_TIMEOUT_SECS",
                ..
            })
        ));
    }

    #[test]
    fn webhook_url_appends_api_path() {
        let config = config(&[("VERCEL_URL", "my-bot.vercel.app")]).unwrap();

        assert_eq!(
            config.webhook_url().unwrap().as_str(),
            "https://my-bot.vercel.app/api"
        );
    }

    #[test]
    fn webhook_url_requires_vercel_url() {
        let err = Config::default().webhook_url().unwrap_err();
        assert!(err.to_string().contains("VERCEL_URL"));
    }

    #[test]
    fn debug_hides_token() {
        let config = config(&[("TELEGRAM_TOKEN", "123:secret")]).unwrap();
        assert!(!format!("{config:?}").contains("secret"));
    }
}
