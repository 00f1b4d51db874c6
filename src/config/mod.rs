//! Configuration system (layered: settings file > `.env` > environment).
//!
//! Keys keep the names used by `appsettings.toml`:
//!
//! ```toml
//! SpaceId = "01ef..."
//! AuthToken = "dapi..."
//! BaseAddress = "https://adb-123.azuredatabricks.net"
//! PollingDelayMilliseconds = 5000
//! AgenModelName = "gpt-4o"
//! AgentName = "myAgent"
//! PROJECT_CONNECTION_STRING = "eastus.api.azureml.ms;sub;rg;project"
//! ```
//!
//! Required keys are validated lazily by [`AppConfig::genie_settings`] and
//! [`AppConfig::agent_settings`], so the Genie menu works without any agent
//! configuration and vice versa.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{GenieError, Result};
use crate::genie::PollPolicy;

/// Default settings file, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "appsettings.toml";

const DEFAULT_POLLING_DELAY_MS: u64 = 5_000;
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 120;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 900;
const DEFAULT_MAX_UNRECOGNIZED: u32 = 3;
const DEFAULT_AGENT_NAME: &str = "myAgent";
const DEFAULT_AGENT_API_VERSION: &str = "2024-12-01-preview";
const DEFAULT_AGENT_INSTRUCTIONS: &str = "agentInstructions.txt";
const DEFAULT_TOOL_INSTRUCTIONS: &str = "askGenieInstructions.txt";

/// Raw configuration as loaded from file and environment.
///
/// Every field is optional here; the typed views returned by
/// [`genie_settings`](Self::genie_settings) and
/// [`agent_settings`](Self::agent_settings) enforce what each mode needs.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    #[serde(rename = "SpaceId")]
    pub space_id: Option<String>,
    #[serde(rename = "AuthToken")]
    pub auth_token: Option<String>,
    #[serde(rename = "BaseAddress")]
    pub base_address: Option<String>,
    #[serde(rename = "PollingDelayMilliseconds", deserialize_with = "lenient_number")]
    pub polling_delay_ms: Option<u64>,
    #[serde(rename = "MaxPollAttempts", deserialize_with = "lenient_number")]
    pub max_poll_attempts: Option<u32>,
    #[serde(rename = "PollTimeoutSeconds", deserialize_with = "lenient_number")]
    pub poll_timeout_secs: Option<u64>,
    #[serde(rename = "MaxUnrecognizedStatuses", deserialize_with = "lenient_number")]
    pub max_unrecognized_statuses: Option<u32>,
    #[serde(rename = "AgenModelName")]
    pub agent_model: Option<String>,
    #[serde(rename = "AgentName")]
    pub agent_name: Option<String>,
    #[serde(rename = "PROJECT_CONNECTION_STRING")]
    pub connection_string: Option<String>,
    #[serde(rename = "AgentApiKey")]
    pub agent_api_key: Option<String>,
    #[serde(rename = "AgentApiVersion")]
    pub agent_api_version: Option<String>,
    #[serde(rename = "AgentInstructionsFile")]
    pub agent_instructions_file: Option<PathBuf>,
    #[serde(rename = "ToolInstructionsFile")]
    pub tool_instructions_file: Option<PathBuf>,
    #[serde(rename = "WorkingDirectory")]
    pub working_directory: Option<PathBuf>,
}

/// Everything the Genie client and poller need.
#[derive(Debug, Clone)]
pub struct GenieSettings {
    pub base_address: String,
    pub space_id: String,
    pub auth_token: String,
    pub poll_policy: PollPolicy,
}

/// Everything the hosted agent session needs.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub connection_string: String,
    pub api_key: String,
    pub api_version: String,
    pub model: String,
    pub name: String,
    pub agent_instructions_file: PathBuf,
    pub tool_instructions_file: PathBuf,
    pub working_directory: PathBuf,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read when present. `.env` and `GENIE_*` variables are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML settings file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GenieError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| GenieError::Configuration(e.to_string()))
    }

    /// Overlay values from an environment-like lookup.
    ///
    /// Numeric values that fail to parse are ignored so the file value (or the
    /// default) stays in effect.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let string_mappings: [(&str, &mut Option<String>); 8] = [
            ("GENIE_SPACE_ID", &mut self.space_id),
            ("GENIE_AUTH_TOKEN", &mut self.auth_token),
            ("GENIE_BASE_ADDRESS", &mut self.base_address),
            ("GENIE_AGENT_MODEL", &mut self.agent_model),
            ("GENIE_AGENT_NAME", &mut self.agent_name),
            ("PROJECT_CONNECTION_STRING", &mut self.connection_string),
            ("GENIE_AGENT_API_KEY", &mut self.agent_api_key),
            ("GENIE_AGENT_API_VERSION", &mut self.agent_api_version),
        ];
        for (var, slot) in string_mappings {
            if let Some(value) = lookup(var) {
                *slot = Some(value);
            }
        }

        let path_mappings: [(&str, &mut Option<PathBuf>); 3] = [
            ("GENIE_AGENT_INSTRUCTIONS_FILE", &mut self.agent_instructions_file),
            ("GENIE_TOOL_INSTRUCTIONS_FILE", &mut self.tool_instructions_file),
            ("GENIE_WORKING_DIRECTORY", &mut self.working_directory),
        ];
        for (var, slot) in path_mappings {
            if let Some(value) = lookup(var) {
                *slot = Some(PathBuf::from(value));
            }
        }

        if let Some(delay) = lookup("GENIE_POLLING_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.polling_delay_ms = Some(delay);
        }
        if let Some(attempts) = lookup("GENIE_MAX_POLL_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.max_poll_attempts = Some(attempts);
        }
        if let Some(secs) = lookup("GENIE_POLL_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            self.poll_timeout_secs = Some(secs);
        }
        if let Some(max) = lookup("GENIE_MAX_UNRECOGNIZED_STATUSES").and_then(|v| v.parse().ok()) {
            self.max_unrecognized_statuses = Some(max);
        }
    }

    /// Polling behaviour, with defaults for anything unset.
    ///
    /// A zero attempt count or timeout disables that bound.
    pub fn poll_policy(&self) -> PollPolicy {
        let max_attempts = self.max_poll_attempts.unwrap_or(DEFAULT_MAX_POLL_ATTEMPTS);
        let timeout_secs = self.poll_timeout_secs.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);
        PollPolicy::builder()
            .interval(Duration::from_millis(
                self.polling_delay_ms.unwrap_or(DEFAULT_POLLING_DELAY_MS),
            ))
            .maybe_max_attempts((max_attempts > 0).then_some(max_attempts))
            .maybe_timeout((timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)))
            .max_unrecognized(
                self.max_unrecognized_statuses
                    .unwrap_or(DEFAULT_MAX_UNRECOGNIZED),
            )
            .build()
    }

    /// Validate and return the Genie connection settings.
    pub fn genie_settings(&self) -> Result<GenieSettings> {
        Ok(GenieSettings {
            space_id: require(&self.space_id, "SpaceId")?,
            auth_token: require(&self.auth_token, "AuthToken")?,
            base_address: require(&self.base_address, "BaseAddress")?,
            poll_policy: self.poll_policy(),
        })
    }

    /// Validate and return the agent session settings.
    pub fn agent_settings(&self) -> Result<AgentSettings> {
        Ok(AgentSettings {
            connection_string: require(&self.connection_string, "PROJECT_CONNECTION_STRING")?,
            api_key: require(&self.agent_api_key, "AgentApiKey")?,
            model: require(&self.agent_model, "AgenModelName")?,
            api_version: self
                .agent_api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_AGENT_API_VERSION.to_string()),
            name: self
                .agent_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
            agent_instructions_file: self
                .agent_instructions_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_AGENT_INSTRUCTIONS)),
            tool_instructions_file: self
                .tool_instructions_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL_INSTRUCTIONS)),
            working_directory: self
                .working_directory
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

/// Numbers may be written bare or quoted. Quoted text that does not parse
/// leaves the key unset, same as a bad environment value.
fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText<T> {
        Number(T),
        Text(String),
    }

    Ok(match NumberOrText::<T>::deserialize(deserializer)? {
        NumberOrText::Number(n) => Some(n),
        NumberOrText::Text(text) => text.trim().parse().ok(),
    })
}

fn require(value: &Option<String>, key: &str) -> Result<String> {
    value
        .as_ref()
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| {
            GenieError::Configuration(format!("{key} cannot be null in the configuration."))
        })
}
