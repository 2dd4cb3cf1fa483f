//! Configuration module for the monitor bot.
//!
//! Handles loading of credentials, polling and wizard settings from the
//! environment, and the allow-lists that gate every command.

mod access;
mod settings;

pub use access::{AccessPolicy, parse_id_list};
pub use settings::{
    ConfigError, DEFAULT_API_BASE, DEFAULT_GPUS, ProviderConfig, Settings, WebhookConfig,
    parse_gpu_list,
};
