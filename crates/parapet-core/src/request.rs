//! Inbound request shape handed to the engine by the transport layer.

use serde::{Deserialize, Serialize};

/// One request as seen at the proxy boundary.
///
/// The transport parses the wire format; the engine only needs the source
/// address, the method, the full target URL, and the already-decoded query
/// and body parameters.
///
/// # Example
///
/// ```rust
/// use parapet_core::InboundRequest;
///
/// let request = InboundRequest::new("203.0.113.7", "POST", "http://shop.test/login")
///     .with_form(vec![("user".into(), "admin".into())]);
/// assert_eq!(request.host(), "shop.test");
/// assert_eq!(request.path(), "/login");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundRequest {
    /// Source address as the transport reports it.
    pub client_ip: String,

    /// HTTP method, uppercase as on the wire.
    pub method: String,

    /// Full target URL including scheme, host, and query string.
    pub url: String,

    /// Decoded query string pairs in wire order.
    pub query: Vec<(String, String)>,

    /// Decoded form-encoded body pairs, when the body parsed as a form.
    pub form: Vec<(String, String)>,

    /// Raw text body, when present and not form-encoded.
    pub body: Option<String>,
}

impl InboundRequest {
    /// Creates a request with no query, form, or body.
    pub fn new(
        client_ip: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            client_ip: client_ip.into(),
            method: method.into(),
            url: url.into(),
            query: Vec::new(),
            form: Vec::new(),
            body: None,
        }
    }

    /// Sets the decoded query pairs.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Sets the decoded form pairs.
    #[must_use]
    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = form;
        self
    }

    /// Sets the raw text body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Host component of the URL, port stripped.
    #[must_use]
    pub fn host(&self) -> &str {
        host_of(&self.url)
    }

    /// Path component of the URL, before any query or fragment.
    #[must_use]
    pub fn path(&self) -> &str {
        path_of(&self.url)
    }
}

/// Extracts the host from a URL, dropping the scheme and any port.
///
/// Bracketed IPv6 literals keep their colons; a URL without a scheme is
/// treated as starting at the authority.
#[must_use]
pub fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    strip_port(authority)
}

/// Extracts the path from a URL: everything from the first `/` after the
/// authority up to the query or fragment. Empty when the URL has no path.
#[must_use]
pub fn path_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    // Cut the query and fragment first so their slashes never read as a path.
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let rest = &rest[..end];
    rest.find('/').map_or("", |at| &rest[at..])
}

fn strip_port(authority: &str) -> &str {
    if let Some(inner) = authority.strip_prefix('[') {
        // [::1]:8080 form: the host is the bracketed literal.
        return inner.split(']').next().unwrap_or(inner);
    }
    match authority.rsplit_once(':') {
        Some((host, port))
            if !host.contains(':') && !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            host
        }
        _ => authority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_strips_scheme_and_port() {
        assert_eq!(host_of("http://shop.test/cart"), "shop.test");
        assert_eq!(host_of("https://shop.test:8443/cart"), "shop.test");
        assert_eq!(host_of("http://127.0.0.1:5000/dashboard"), "127.0.0.1");
        assert_eq!(host_of("http://shop.test"), "shop.test");
    }

    #[test]
    fn test_host_keeps_ipv6_literals_whole() {
        assert_eq!(host_of("http://[::1]:8080/x"), "::1");
        assert_eq!(host_of("http://[2001:db8::1]/x"), "2001:db8::1");
    }

    #[test]
    fn test_host_ignores_query_and_fragment() {
        assert_eq!(host_of("http://shop.test?next=http://evil.test/"), "shop.test");
        assert_eq!(host_of("http://shop.test#frag"), "shop.test");
    }

    #[test]
    fn test_path_extraction() {
        assert_eq!(path_of("http://shop.test/static/app.js?v=3"), "/static/app.js");
        assert_eq!(path_of("http://shop.test/a/b#frag"), "/a/b");
        assert_eq!(path_of("http://shop.test"), "");
        assert_eq!(path_of("http://shop.test?q=1"), "");
    }

    #[test]
    fn test_path_never_borrows_slashes_from_the_query() {
        assert_eq!(path_of("http://shop.test?f=/a.css"), "");
        assert_eq!(path_of("http://shop.test#/section"), "");
        assert_eq!(path_of("shop.test?redirect=/login"), "");
    }

    #[test]
    fn test_builder_chain() {
        let request = InboundRequest::new("10.0.0.1", "POST", "http://shop.test/login")
            .with_query(vec![("next".into(), "/".into())])
            .with_form(vec![("user".into(), "bob".into())])
            .with_body("ignored when form present");

        assert_eq!(request.query.len(), 1);
        assert_eq!(request.form.len(), 1);
        assert!(request.body.is_some());
        assert_eq!(request.path(), "/login");
    }

    #[test]
    fn test_non_numeric_port_not_stripped() {
        // A colon followed by non-digits is part of the authority, not a port.
        assert_eq!(strip_port("shop.test:abc"), "shop.test:abc");
        assert_eq!(strip_port("shop.test:"), "shop.test:");
    }
}
