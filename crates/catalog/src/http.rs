//! Shared HTTP plumbing for the lookup clients

use crate::{SourceError, SourceResult};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

pub(crate) const NOT_FOUND_MESSAGE: &str = "Book not found";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

pub(crate) fn build_client(timeout: Duration, user_agent: &str) -> SourceResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| SourceError::NetworkError(format!("HTTP client not available: {}", e)))
}

pub(crate) fn default_client() -> SourceResult<Client> {
    build_client(
        Duration::from_secs(10),
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
    )
}

/// Parses a configured base URL and appends path segments to it
pub(crate) fn endpoint(base_url: &str, segments: &[&str]) -> SourceResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| SourceError::InvalidQuery(format!("Bad base URL '{}': {}", base_url, e)))?;

    url.path_segments_mut()
        .map_err(|_| SourceError::InvalidQuery(format!("Bad base URL '{}'", base_url)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// Sends a GET and maps transport failures
pub(crate) async fn get(client: &Client, url: Url) -> SourceResult<Response> {
    log::debug!("GET {}", url);
    client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            SourceError::Timeout
        } else {
            SourceError::NetworkError(format!("Request failed: {}", e))
        }
    })
}

/// Passes successful responses through and turns the rest into errors
///
/// The error carries the body's `message` or `error` field when present.
pub(crate) async fn check_status(response: Response) -> SourceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    log::debug!("Lookup failed with HTTP {}: {:?}", status.as_u16(), message);

    Err(status_error(status, message))
}

fn status_error(status: StatusCode, message: Option<String>) -> SourceError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited,
        StatusCode::BAD_REQUEST => {
            SourceError::InvalidQuery(message.unwrap_or_else(|| "Invalid ISBN".to_string()))
        }
        s if s.is_server_error() => SourceError::Unavailable(message.unwrap_or_else(|| {
            format!(
                "HTTP {} {}",
                s.as_u16(),
                s.canonical_reason().unwrap_or("Unknown")
            )
        })),
        _ => SourceError::NotFound(message.unwrap_or_else(|| NOT_FOUND_MESSAGE.to_string())),
    }
}

pub(crate) fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

/// Reads the body as JSON
pub(crate) async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> SourceResult<T> {
    let text = response.text().await.map_err(|e| {
        if e.is_timeout() {
            SourceError::Timeout
        } else {
            SourceError::NetworkError(format!("Failed to read response: {}", e))
        }
    })?;

    serde_json::from_str(&text)
        .map_err(|e| SourceError::ParseError(format!("JSON parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_message_field() {
        let body = r#"{"message": "no such book", "error": "not_found"}"#;
        assert_eq!(error_message(body), Some("no such book".to_string()));
    }

    #[test]
    fn test_error_message_falls_back_to_error_field() {
        let body = r#"{"error": "書籍が見つかりません"}"#;
        assert_eq!(error_message(body), Some("書籍が見つかりません".to_string()));
    }

    #[test]
    fn test_error_message_absent() {
        assert_eq!(error_message("<html>oops</html>"), None);
        assert_eq!(error_message(r#"{"message": ""}"#), None);
        assert_eq!(error_message(""), None);
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let url = endpoint("http://localhost:5000", &["api", "book", "0306406152"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/book/0306406152");

        let url = endpoint("https://books.example.com/pagemark/", &["api", "book", "x"]).unwrap();
        assert_eq!(url.as_str(), "https://books.example.com/pagemark/api/book/x");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = endpoint("http://localhost:5000", &["api", "book", "12345/7?90"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/book/12345%2F7%3F90");
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(matches!(
            endpoint("not a url", &["api"]),
            Err(SourceError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, None),
            SourceError::NotFound(NOT_FOUND_MESSAGE.to_string())
        );
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, Some("slow".to_string())),
            SourceError::RateLimited
        );
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, Some("ISBNが無効です".to_string())),
            SourceError::InvalidQuery("ISBNが無効です".to_string())
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, None),
            SourceError::Unavailable("HTTP 502 Bad Gateway".to_string())
        );
    }
}
