//! Single-attempt HTTP text fetches.
//!
//! A failed request is reported to the caller as-is. Nothing here retries;
//! a year whose file cannot be fetched is counted as failed for that load.

use reqwest::StatusCode;

use crate::SourceError;

/// Sends `request` once and returns the response body as a `String`.
///
/// Returns `Ok(None)` when the server answers 404, so callers can move on
/// to the next candidate location.
///
/// # Errors
///
/// * [`SourceError::Http`] if the request or the body read fails.
/// * [`SourceError::Status`] for any other non-success status.
pub async fn send_text(request: reqwest::RequestBuilder) -> Result<Option<String>, SourceError> {
    let response = request.send().await?;
    if !check_status(response.url().as_str(), response.status())? {
        return Ok(None);
    }
    Ok(Some(response.text().await?))
}

/// Maps a response status onto "has a body" (`true`), "not found"
/// (`false`) or an error.
fn check_status(url: &str, status: StatusCode) -> Result<bool, SourceError> {
    if status == StatusCode::NOT_FOUND {
        return Ok(false);
    }
    if status.is_success() {
        return Ok(true);
    }
    log::debug!("HTTP {status} for {url}");
    Err(SourceError::Status {
        url: url.to_string(),
        status: status.as_u16(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.org/2022.csv";

    #[test]
    fn success_has_a_body() {
        assert!(check_status(URL, StatusCode::OK).unwrap());
    }

    #[test]
    fn not_found_is_none() {
        assert!(!check_status(URL, StatusCode::NOT_FOUND).unwrap());
    }

    #[test]
    fn server_errors_fail_without_retry() {
        for status in [
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::FORBIDDEN,
        ] {
            let err = check_status(URL, status).unwrap_err();
            assert!(
                matches!(err, SourceError::Status { ref url, status: code } if url == URL && code == status.as_u16()),
                "{err}"
            );
        }
    }
}
