use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_RESPONSE_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Result of a single backend round trip, normalized at the capability
/// boundary so the rest of the core never sees `crux_http` types.
pub type FetchOutcome = Result<Vec<u8>, HttpError>;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("HTTP error {status}")]
    Status { status: u16, body: Option<Vec<u8>> },

    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("response body too large: {size} bytes exceeds maximum of {max} bytes")]
    ResponseTooLarge { size: usize, max: usize },

    #[error("empty response body")]
    EmptyBody,
}

/// Validated backend base URL. Endpoint URLs are always derived from it so a
/// panel can never address a different host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiBase {
    url: String,
}

impl ApiBase {
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        let url = url.into();
        let trimmed = url.trim();

        if trimmed.is_empty() {
            return Err(HttpError::InvalidUrl {
                url: String::new(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if trimmed.len() > MAX_URL_LENGTH {
            return Err(HttpError::InvalidUrl {
                url: truncate_url(trimmed),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let parsed = Url::parse(trimmed).map_err(|e| HttpError::InvalidUrl {
            url: truncate_url(trimmed),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(HttpError::InvalidUrl {
                url: truncate_url(trimmed),
                reason: format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            });
        }

        if parsed.host_str().is_none() {
            return Err(HttpError::InvalidUrl {
                url: truncate_url(trimmed),
                reason: "URL must have a host".to_string(),
            });
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(HttpError::InvalidUrl {
                url: truncate_url(trimmed),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        Ok(Self {
            url: trimmed.trim_end_matches('/').to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Joins `path` onto the base and appends the query pairs, percent-encoded.
    pub fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<String, HttpError> {
        let raw = format!("{}/{}", self.url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).map_err(|e| HttpError::InvalidUrl {
            url: truncate_url(&raw),
            reason: e.to_string(),
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }

        Ok(url.into())
    }
}

impl Default for ApiBase {
    fn default() -> Self {
        Self {
            url: crate::DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Maps a `crux_http` completion into a [`FetchOutcome`]. Non-2xx statuses
/// are errors even when the transport reports them as responses.
pub fn into_outcome(result: crux_http::Result<crux_http::Response<Vec<u8>>>) -> FetchOutcome {
    let mut response = result.map_err(|e| HttpError::Transport {
        message: e.to_string(),
    })?;

    let status: u16 = response.status().into();
    let body = response.take_body();

    if !(200..300).contains(&status) {
        return Err(HttpError::Status { status, body });
    }

    let body = body.ok_or(HttpError::EmptyBody)?;
    if body.len() > MAX_RESPONSE_BODY_SIZE {
        return Err(HttpError::ResponseTooLarge {
            size: body.len(),
            max: MAX_RESPONSE_BODY_SIZE,
        });
    }

    Ok(body)
}

fn truncate_url(url: &str) -> String {
    if url.len() <= 100 {
        url.to_string()
    } else {
        let mut end = 100;
        while !url.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &url[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_rejects_non_http_schemes() {
        assert!(ApiBase::new("ftp://example.com").is_err());
        assert!(ApiBase::new("javascript:alert(1)").is_err());
        assert!(ApiBase::new("   ").is_err());
    }

    #[test]
    fn api_base_rejects_credentials() {
        let err = ApiBase::new("https://user:pw@example.com").unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl { .. }));
    }

    #[test]
    fn api_base_strips_trailing_slash() {
        let base = ApiBase::new("http://localhost:8000/").unwrap();
        assert_eq!(base.as_str(), "http://localhost:8000");
    }

    #[test]
    fn default_base_is_valid() {
        let parsed = ApiBase::new(crate::DEFAULT_API_BASE_URL).unwrap();
        assert_eq!(parsed, ApiBase::default());
    }

    #[test]
    fn endpoint_encodes_query_values() {
        let base = ApiBase::new("http://localhost:8000").unwrap();
        let url = base
            .endpoint("/market-prices", &[("location", "Andhra Pradesh".to_string())])
            .unwrap();
        assert_eq!(url, "http://localhost:8000/market-prices?location=Andhra+Pradesh");
    }

    #[test]
    fn endpoint_without_query_has_no_question_mark() {
        let base = ApiBase::new("https://api.example.org/v1").unwrap();
        let url = base.endpoint("chat/status", &[]).unwrap();
        assert_eq!(url, "https://api.example.org/v1/chat/status");
    }
}
