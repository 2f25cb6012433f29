use std::{fs, io::ErrorKind, path::Path, time::Duration};

use add_product::{ControllerOptions, OrderingPolicy};
use anyhow::{bail, Context, Result};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub graphql_url: String,
    pub database_url: String,
    pub request_timeout_secs: u64,
    pub min_loading_delay_ms: u64,
    pub ordering: OrderingPolicy,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            graphql_url: "http://127.0.0.1:4000/graphql".into(),
            database_url: "sqlite://./data/session.db".into(),
            request_timeout_secs: 15,
            min_loading_delay_ms: 2000,
            ordering: OrderingPolicy::LatestIssued,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            min_loading_delay: Duration::from_millis(self.min_loading_delay_ms),
            ordering: self.ordering,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.graphql_url)
            .with_context(|| format!("invalid graphql_url '{}'", self.graphql_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("graphql_url must use http or https, got '{}'", url.scheme());
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// Defaults, then `config_path` if it exists, then environment variables.
pub fn load_settings(config_path: &Path) -> Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(config_path) {
        Ok(raw) => apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("failed to read config '{}'", config_path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to open config '{}'", config_path.display()))
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.database_url = normalize_database_url(&settings.database_url);
    Ok(settings)
}

/// Top-level keys may be strings or integers; anything else is rejected.
pub(crate) fn apply_file_overrides(settings: &mut Settings, raw: &str) -> Result<()> {
    let file_cfg: toml::Table = toml::from_str(raw)?;
    for (key, value) in &file_cfg {
        let value = match value {
            toml::Value::String(text) => text.clone(),
            toml::Value::Integer(number) => number.to_string(),
            other => bail!("'{key}' must be a string or integer, got {}", other.type_str()),
        };
        apply_key(settings, key, &value)?;
    }
    Ok(())
}

/// `STOCKCTL_<KEY>` is read first, `APP__<KEY>` wins when both are set.
pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    const KEYS: [&str; 6] = [
        "graphql_url",
        "database_url",
        "request_timeout_secs",
        "min_loading_delay_ms",
        "ordering",
        "log_filter",
    ];

    for key in KEYS {
        let upper = key.to_ascii_uppercase();
        for var in [format!("STOCKCTL_{upper}"), format!("APP__{upper}")] {
            if let Some(value) = lookup(&var) {
                apply_key(settings, key, &value).with_context(|| format!("invalid {var}"))?;
            }
        }
    }
    Ok(())
}

fn apply_key(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "graphql_url" => settings.graphql_url = value.trim().to_string(),
        "database_url" => settings.database_url = value.trim().to_string(),
        "request_timeout_secs" => {
            settings.request_timeout_secs = value
                .trim()
                .parse()
                .with_context(|| format!("'{value}' is not a number of seconds"))?;
        }
        "min_loading_delay_ms" => {
            settings.min_loading_delay_ms = value
                .trim()
                .parse()
                .with_context(|| format!("'{value}' is not a number of milliseconds"))?;
        }
        "ordering" => {
            let Some(policy) = OrderingPolicy::parse(value) else {
                bail!("unknown ordering '{value}', expected latest_issued or latest_completion");
            };
            settings.ordering = policy;
        }
        "log_filter" => settings.log_filter = value.trim().to_string(),
        _ => {}
    }
    Ok(())
}

pub(crate) fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
