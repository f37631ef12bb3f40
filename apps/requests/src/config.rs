use crate::controller::ControllerOptions;
use crate::filters::DEFAULT_PAGE_SIZE;
use crate::token::TokenId;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use std::{env, fs, path::Path};
use tracing::{info, warn};
use utils::errors::*;

const DEFAULT_CONFIG_PATH: &str = "daopad.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub gateway_url: Option<String>,
    pub token_id: Option<String>,
    /// Session identity sent as a bearer token. Without one the feed is
    /// read-only.
    pub identity: Option<String>,
    pub page_size: u16,
    pub refresh_interval_secs: Option<u64>,
    pub vote_retry_delay_ms: u64,
    pub disable_sort: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            token_id: None,
            identity: None,
            page_size: DEFAULT_PAGE_SIZE,
            refresh_interval_secs: None,
            vote_retry_delay_ms: 3000,
            disable_sort: false,
        }
    }
}

impl FeedConfig {
    /// Reads the JSON file named by `DAOPAD_CONFIG_PATH` (falling back to
    /// defaults when it is missing or broken), then applies env overrides.
    pub fn load() -> Self {
        let path = env::var("DAOPAD_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = match Self::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %format!("{err:#}"), path = %path, "Feed config not loaded, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();

        info!(
            gateway_url = config.gateway_url.as_deref().unwrap_or("<unset>"),
            token_id = config.token_id.as_deref().unwrap_or("<unset>"),
            authenticated = config.identity.is_some(),
            page_size = config.page_size,
            refresh_interval_secs = config.refresh_interval_secs,
            disable_sort = config.disable_sort,
            "Feed config loaded"
        );

        config
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context(CONFIG_READ_FAILED)?;
        let config: Self = serde_json::from_str(&contents).context(CONFIG_PARSE_FAILED)?;
        Ok(config.validated())
    }

    /// Holds file values to the same rules as env overrides: invalid ones
    /// are logged and replaced by their defaults.
    fn validated(mut self) -> Self {
        let defaults = Self::default();

        for (name, field) in [
            ("gateway_url", &mut self.gateway_url),
            ("token_id", &mut self.token_id),
            ("identity", &mut self.identity),
        ] {
            if field.as_deref().is_some_and(|value| value.trim().is_empty()) {
                warn!(field = name, "Ignoring blank config value");
                *field = None;
            } else if let Some(value) = field.as_mut() {
                *value = value.trim().to_string();
            }
        }

        if self.page_size == 0 {
            warn!(value = self.page_size, "Ignoring invalid page_size in config file");
            self.page_size = defaults.page_size;
        }
        if self.refresh_interval_secs == Some(0) {
            self.refresh_interval_secs = None;
        }

        self
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = non_empty_var("DAOPAD_GATEWAY_URL") {
            self.gateway_url = Some(value);
        }
        if let Some(value) = non_empty_var("DAOPAD_TOKEN_ID") {
            self.token_id = Some(value);
        }
        if let Some(value) = non_empty_var("DAOPAD_IDENTITY") {
            self.identity = Some(value);
        }

        if let Some(value) = non_empty_var("DAOPAD_PAGE_SIZE") {
            match value.parse::<u16>() {
                Ok(size) if size > 0 => self.page_size = size,
                _ => warn!(value = %value, "Ignoring invalid DAOPAD_PAGE_SIZE override"),
            }
        }

        if let Some(value) = non_empty_var("DAOPAD_REFRESH_INTERVAL_SECS") {
            match value.parse::<u64>() {
                Ok(0) => self.refresh_interval_secs = None,
                Ok(secs) => self.refresh_interval_secs = Some(secs),
                Err(err) => warn!(
                    error = %err,
                    value = %value,
                    "Ignoring invalid DAOPAD_REFRESH_INTERVAL_SECS override"
                ),
            }
        }

        if let Some(value) = non_empty_var("DAOPAD_VOTE_RETRY_DELAY_MS") {
            match value.parse::<u64>() {
                Ok(ms) => self.vote_retry_delay_ms = ms,
                Err(err) => warn!(
                    error = %err,
                    value = %value,
                    "Ignoring invalid DAOPAD_VOTE_RETRY_DELAY_MS override"
                ),
            }
        }

        if let Some(value) = non_empty_var("DAOPAD_DISABLE_SORT") {
            match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.disable_sort = true,
                "0" | "false" | "no" => self.disable_sort = false,
                _ => warn!(value = %value, "Ignoring invalid DAOPAD_DISABLE_SORT override"),
            }
        }
    }

    pub fn gateway_url(&self) -> Result<&str> {
        self.gateway_url.as_deref().context(GATEWAY_URL_NOT_SET)
    }

    /// The configured token, if any. A token that is set but malformed is
    /// an error rather than "no token".
    pub fn token(&self) -> Result<Option<TokenId>> {
        self.token_id
            .as_deref()
            .map(|text| TokenId::parse(text).context(TOKEN_ID_INVALID))
            .transpose()
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            page_size: self.page_size,
            refresh_interval: self
                .refresh_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            retry_delay: Duration::from_millis(self.vote_retry_delay_ms),
            send_sort: !self.disable_sort,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
