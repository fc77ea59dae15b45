// lib.rs - Rural dashboard core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod chat;
pub mod config;
pub mod event;
pub mod locale;
pub mod location;
pub mod model;
pub mod resource;
pub mod symptom;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::DashboardConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
pub const MAX_CHAT_MESSAGE_CHARS: usize = 2_000;
pub const MAX_SYMPTOM_CHARS: usize = 2_000;
pub const NEWS_SUMMARY_PREVIEW_CHARS: usize = 140;
pub const MAPS_DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    NotFound,
    RateLimited,
    Server,
    HttpStatus,
    Deserialization,
    FeatureUnavailable,
    Validation,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::HttpStatus => "HTTP_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::FeatureUnavailable => "FEATURE_UNAVAILABLE",
            Self::Validation => "VALIDATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The server took too long to respond. Please try again.".into(),
            ErrorKind::NotFound => "This information is not available right now.".into(),
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.".into(),
            ErrorKind::Server | ErrorKind::HttpStatus => {
                "The service is having trouble. Please try again shortly.".into()
            }
            ErrorKind::Deserialization => {
                "We received data we could not read. Please try again.".into()
            }
            ErrorKind::FeatureUnavailable | ErrorKind::Validation => self.message.clone(),
            ErrorKind::Internal => "An unexpected error occurred. Please try again.".into(),
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::HttpStatus,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .and_then(|e| e.detail.or(e.message))
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<capabilities::HttpError> for AppError {
    fn from(e: capabilities::HttpError) -> Self {
        use capabilities::HttpError;

        match e {
            HttpError::Status { status, body } => Self::from_http_status(status, body.as_deref()),
            HttpError::Transport { message } => Self::new(ErrorKind::Network, message),
            HttpError::Timeout { timeout_ms } => {
                Self::new(ErrorKind::Timeout, format!("timeout after {timeout_ms}ms"))
            }
            HttpError::EmptyBody | HttpError::ResponseTooLarge { .. } => {
                Self::new(ErrorKind::Deserialization, e.to_string())
            }
            HttpError::InvalidUrl { .. } | HttpError::Serialization { .. } => {
                Self::new(ErrorKind::Internal, e.to_string())
            }
        }
    }
}

/// Error body shape of the backend (FastAPI uses `detail`).
#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}
