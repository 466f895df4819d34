use super::locale::parse_accept_language;

/// What the inbound request object is able to do
///
/// Path-based site selection rewrites the path and base URL, which only
/// site-aware requests support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestKind {
    /// Plain request: path info and base URL are fixed
    Standard,
    /// Request whose path info and base URL may be rewritten
    #[default]
    SiteAware,
}

impl RequestKind {
    pub fn supports_path_rewrite(&self) -> bool {
        matches!(self, RequestKind::SiteAware)
    }
}

/// The parts of an HTTP request that site resolution reads and rewrites
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRequest {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub method: String,
    pub path_info: String,
    pub base_url: String,
    /// Normalized tags ordered by preference (`en_US`, `fr`, ...)
    pub preferred_languages: Vec<String>,
    pub locale: Option<String>,
    /// Site id remembered by the session, if any
    pub pinned_site_id: Option<String>,
    pub kind: RequestKind,
}

impl SiteRequest {
    /// GET request for `path` on `host` over https
    pub fn new(host: impl Into<String>, path_info: impl Into<String>) -> Self {
        let path_info = path_info.into();
        Self {
            scheme: "https".to_string(),
            host: host.into(),
            port: None,
            method: "GET".to_string(),
            path_info: if path_info.is_empty() {
                "/".to_string()
            } else {
                path_info
            },
            base_url: String::new(),
            preferred_languages: Vec::new(),
            locale: None,
            pinned_site_id: None,
            kind: RequestKind::SiteAware,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn with_accept_language(mut self, header: &str) -> Self {
        self.preferred_languages = parse_accept_language(header);
        self
    }

    pub fn with_pinned_site(mut self, site_id: impl Into<String>) -> Self {
        self.pinned_site_id = Some(site_id.into());
        self
    }

    pub fn with_kind(mut self, kind: RequestKind) -> Self {
        self.kind = kind;
        self
    }

    /// `scheme://host[:port]` with default ports omitted
    pub fn scheme_and_host(&self) -> String {
        match self.port {
            Some(port) if !is_default_port(&self.scheme, port) => {
                format!("{}://{}:{}", self.scheme, self.host, port)
            }
            _ => format!("{}://{}", self.scheme, self.host),
        }
    }
}

pub(crate) fn is_default_port(scheme: &str, port: u16) -> bool {
    matches!((scheme, port), ("http", 80) | ("https", 443))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_defaults_to_root() {
        let request = SiteRequest::new("example.com", "");
        assert_eq!(request.path_info, "/");
        assert!(request.kind.supports_path_rewrite());
    }

    #[test]
    fn test_scheme_and_host_omits_default_port() {
        let request = SiteRequest::new("example.com", "/").with_port(443);
        assert_eq!(request.scheme_and_host(), "https://example.com");
        let request = request.with_scheme("http").with_port(8080);
        assert_eq!(request.scheme_and_host(), "http://example.com:8080");
    }
}
