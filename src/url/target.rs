use crate::UrlError;
use url::Url;

/// Parses and validates a crawl target
///
/// A target must be an absolute URL using the `http` or `https` scheme and
/// must name a host.
///
/// # Examples
///
/// ```
/// use page_inspector::url::parse_target;
///
/// let url = parse_target("https://example.com/docs").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(parse_target("ftp://example.com/").is_err());
/// assert!(parse_target("/relative/path").is_err());
/// ```
pub fn parse_target(url_str: &str) -> Result<Url, UrlError> {
    let trimmed = url_str.trim();
    let url = Url::parse(trimmed).map_err(|e| UrlError::Parse {
        url: trimmed.to_string(),
        message: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost(trimmed.to_string())),
    }
}
