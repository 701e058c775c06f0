use thiserror::Error;
use url::Url;

/// Errors that can occur during feed URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("{0}")]
    Unparseable(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Validates a URL string for use as a feed source.
///
/// Syntactic validation only: the string must parse as an absolute URL with
/// an `http` or `https` scheme. No host policy is applied — loopback
/// addresses are legitimate feed sources in development and tests.
///
/// # Errors
///
/// Returns [`UrlValidationError`] if the string cannot be parsed or uses a
/// non-HTTP scheme.
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
}
