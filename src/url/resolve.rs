use url::Url;

/// Returns true if the href carries an absolute `http://` or `https://` scheme marker
///
/// The comparison ignores ASCII case.
pub fn has_absolute_scheme(href: &str) -> bool {
    starts_with_ignore_case(href, "http://") || starts_with_ignore_case(href, "https://")
}

/// Returns true if the href is a `mailto:` address
pub fn is_mailto(href: &str) -> bool {
    starts_with_ignore_case(href, "mailto:")
}

/// Returns the origin of a URL (`scheme://host[:port]`)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_inspector::url::site_origin;
///
/// let url = Url::parse("https://example.com:8443/docs/intro?x=1").unwrap();
/// assert_eq!(site_origin(&url), "https://example.com:8443");
/// ```
pub fn site_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Resolves a site-relative href (one starting with `/`) against the base URL's origin
///
/// The base URL's own path is ignored: `/about` on `https://example.com/blog/`
/// resolves to `https://example.com/about`. Leading slashes are collapsed, so
/// `//cdn.test/x` stays on the base host as `https://example.com/cdn.test/x`.
pub fn resolve_site_relative(base: &Url, href: &str) -> String {
    let path = format!("/{}", href.trim_start_matches('/'));
    match base.join(&path) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => format!("{}{}", site_origin(base), path),
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}
