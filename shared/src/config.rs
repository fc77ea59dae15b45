use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{ApiBase, HttpError};
use crate::locale::Language;
use crate::resource::{BindingPolicy, CompletionOrder, DebouncePolicy};
use crate::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid api_base_url: {0}")]
    InvalidBaseUrl(#[source] HttpError),

    #[error("default_state must not be empty")]
    EmptyDefaultState,
}

/// Settings the shell hands to the core with `Event::Configure`. Every field
/// has a default so a partial JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_base_url: String,
    /// Per-request deadline; `0` disables it.
    pub request_timeout_ms: u64,
    pub debounce: DebouncePolicy,
    pub completion_order: CompletionOrder,
    pub default_language: Language,
    pub default_state: String,
    pub default_city: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            debounce: DebouncePolicy::Immediate,
            completion_order: CompletionOrder::LastIssuedWins,
            default_language: Language::En,
            default_state: "Andhra Pradesh".to_string(),
            default_city: "Vijayawada".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Checks the config and returns it normalized, together with the parsed
    /// base URL.
    pub fn validate(mut self) -> Result<(Self, ApiBase), ConfigError> {
        let base = ApiBase::new(&self.api_base_url).map_err(ConfigError::InvalidBaseUrl)?;
        if self.default_state.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultState);
        }
        self.api_base_url = base.as_str().to_string();
        self.debounce = self.debounce.normalized();
        Ok((self, base))
    }

    #[must_use]
    pub const fn binding_policy(&self) -> BindingPolicy {
        BindingPolicy {
            debounce: self.debounce,
            order: self.completion_order,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Option<u64> {
        match self.request_timeout_ms {
            0 => None,
            ms => Some(ms),
        }
    }
}
