//! Application settings loaded from the environment.

use std::fmt;
use std::time::Duration;

use super::{AccessPolicy, parse_id_list};

/// GPU types offered by the creation wizard when `PREFERRED_GPUS` is unset.
pub const DEFAULT_GPUS: [&str; 3] = [
    "NVIDIA RTX A4500",
    "NVIDIA A100 80GB PCIe",
    "NVIDIA A100-SXM4-80GB",
];

/// Default RunPod REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://rest.runpod.io/v1";

/// Longest accepted polling interval, one year in minutes.
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 525_600;

/// RunPod API configuration.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Bearer credential for the RunPod API.
    pub api_key: String,

    /// Base URL of the REST API, without a trailing slash.
    pub api_base: String,

    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Webhook delivery settings for the Telegram transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Public base URL Telegram should post updates to.
    pub url: String,

    /// Local port the webhook listener binds to.
    pub port: u16,
}

/// Complete bot configuration.
#[derive(Clone)]
pub struct Settings {
    /// RunPod API settings.
    pub provider: ProviderConfig,

    /// Telegram bot token.
    pub bot_token: String,

    /// Chat that receives periodic reports and alerts.
    pub notify_chat_id: i64,

    /// Interval between instance checks, in minutes.
    pub check_interval_minutes: u64,

    /// Who may issue commands.
    pub access: AccessPolicy,

    /// Ordered GPU labels offered by the creation wizard.
    pub preferred_gpus: Vec<String>,

    /// Webhook mode; `None` means long polling.
    pub webhook: Option<WebhookConfig>,
}

fn default_check_interval() -> u64 {
    60
}

fn default_webhook_port() -> u16 {
    8443
}

fn default_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// Creates settings from environment variables.
    ///
    /// Expects `RUNPOD_API_KEY`, `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`
    /// to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnvVar(name))
        };

        let api_key = required("RUNPOD_API_KEY")?;
        let bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let notify_chat_id =
            parse_number::<i64>("TELEGRAM_CHAT_ID", &required("TELEGRAM_CHAT_ID")?)?;

        let check_interval_minutes = match lookup("CHECK_INTERVAL_MINUTES") {
            Some(raw) => parse_number("CHECK_INTERVAL_MINUTES", &raw)?,
            None => default_check_interval(),
        };
        if !(1..=MAX_CHECK_INTERVAL_MINUTES).contains(&check_interval_minutes) {
            return Err(ConfigError::InvalidValue {
                name: "CHECK_INTERVAL_MINUTES",
                value: check_interval_minutes.to_string(),
            });
        }

        // An unset chat list restricts commands to the notification chat;
        // an explicitly empty one lifts the restriction.
        let allowed_chats = match lookup("ALLOWED_CHAT_IDS") {
            Some(raw) => parse_id_list(&raw).map_err(|value| ConfigError::InvalidValue {
                name: "ALLOWED_CHAT_IDS",
                value,
            })?,
            None => std::iter::once(notify_chat_id).collect(),
        };
        let allowed_users = parse_id_list(&lookup("ALLOWED_USER_IDS").unwrap_or_default())
            .map_err(|value| ConfigError::InvalidValue {
                name: "ALLOWED_USER_IDS",
                value,
            })?;

        let preferred_gpus = parse_gpu_list(&lookup("PREFERRED_GPUS").unwrap_or_default());

        let webhook = match lookup("WEBHOOK_URL").map(|v| v.trim().to_owned()) {
            Some(url) if !url.is_empty() => {
                let port = match lookup("WEBHOOK_PORT") {
                    Some(raw) => parse_number("WEBHOOK_PORT", &raw)?,
                    None => default_webhook_port(),
                };
                Some(WebhookConfig {
                    url: url.trim_end_matches('/').to_owned(),
                    port,
                })
            }
            _ => None,
        };

        let api_base = lookup("RUNPOD_API_BASE")
            .map(|v| v.trim().trim_end_matches('/').to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_owned());
        let timeout_secs = match lookup("RUNPOD_TIMEOUT_SECS") {
            Some(raw) => parse_number("RUNPOD_TIMEOUT_SECS", &raw)?,
            None => default_timeout_secs(),
        };

        Ok(Self {
            provider: ProviderConfig {
                api_key,
                api_base,
                timeout: Duration::from_secs(timeout_secs),
            },
            bot_token,
            notify_chat_id,
            check_interval_minutes,
            access: AccessPolicy::new(allowed_chats, allowed_users),
            preferred_gpus,
            webhook,
        })
    }

    /// Returns the polling interval as a [`Duration`].
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }

    /// Returns an annotated `.env` template.
    #[must_use]
    pub fn example_env() -> String {
        format!(
            "# RunPod monitor bot configuration\n\
             \n\
             # Required\n\
             RUNPOD_API_KEY=your-runpod-api-key\n\
             TELEGRAM_BOT_TOKEN=123456:ABC-your-bot-token\n\
             TELEGRAM_CHAT_ID=123456789\n\
             \n\
             # Optional\n\
             CHECK_INTERVAL_MINUTES={}\n\
             # Defaults to TELEGRAM_CHAT_ID; set empty to accept any chat\n\
             #ALLOWED_CHAT_IDS=123456789\n\
             #ALLOWED_USER_IDS=111111,222222\n\
             #PREFERRED_GPUS={}\n\
             #WEBHOOK_URL=https://example.ngrok.io\n\
             #WEBHOOK_PORT={}\n\
             #RUNPOD_API_BASE={DEFAULT_API_BASE}\n\
             #RUNPOD_TIMEOUT_SECS={}\n",
            default_check_interval(),
            DEFAULT_GPUS.join(","),
            default_webhook_port(),
            default_timeout_secs(),
        )
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("bot_token", &"<redacted>")
            .field("notify_chat_id", &self.notify_chat_id)
            .field("check_interval_minutes", &self.check_interval_minutes)
            .field("access", &self.access)
            .field("preferred_gpus", &self.preferred_gpus)
            .field("webhook", &self.webhook)
            .finish()
    }
}

/// Parses a comma-separated GPU list, falling back to [`DEFAULT_GPUS`].
#[must_use]
pub fn parse_gpu_list(raw: &str) -> Vec<String> {
    let gpus: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_owned)
        .collect();

    if gpus.is_empty() {
        DEFAULT_GPUS.iter().map(|&g| g.to_owned()).collect()
    } else {
        gpus
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_owned(),
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}
