use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Route-name prefix of pages that are never matched by URL
pub const PAGE_INTERNAL_PREFIX: &str = "_page_internal_";

/// Route-name prefix of internal error pages (`_page_internal_error_404`)
pub const PAGE_INTERNAL_ERROR_PREFIX: &str = "_page_internal_error_";

/// Mandatory prefix of page aliases
pub const PAGE_ALIAS_PREFIX: &str = "_page_alias_";

/// Kind of page, driving how the router treats it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// Editable page rendered from its block tree
    #[default]
    Static,
    /// Page bound to an application route pattern
    Dynamic,
    /// Page backed by an application action
    Action,
    /// Error page rendered for an HTTP status
    Error,
    /// Page reachable only through its alias
    Alias,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Static => "static",
            PageType::Dynamic => "dynamic",
            PageType::Action => "action",
            PageType::Error => "error",
            PageType::Alias => "alias",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "static" => Some(PageType::Static),
            "dynamic" => Some(PageType::Dynamic),
            "action" => Some(PageType::Action),
            "error" => Some(PageType::Error),
            "alias" => Some(PageType::Alias),
            _ => None,
        }
    }
}

const METHODS: [&str; 6] = ["GET", "POST", "HEAD", "PUT", "DELETE", "PATCH"];

/// Set of HTTP methods a page accepts; the empty set accepts all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RequestMethods(u8);

impl RequestMethods {
    pub fn any() -> Self {
        Self(0)
    }

    /// Parse a `GET|POST` style mask; unknown tokens are ignored
    pub fn parse(mask: &str) -> Self {
        let mut bits = 0u8;
        for token in mask.split(['|', ',']) {
            let token = token.trim().to_ascii_uppercase();
            if let Some(index) = METHODS.iter().position(|m| *m == token) {
                bits |= 1 << index;
            }
        }
        Self(bits)
    }

    pub fn is_any(&self) -> bool {
        self.0 == 0
    }

    pub fn allows(&self, method: &str) -> bool {
        if self.is_any() {
            return true;
        }
        let method = method.to_ascii_uppercase();
        METHODS
            .iter()
            .position(|m| *m == method)
            .map(|index| self.0 & (1 << index) != 0)
            .unwrap_or(false)
    }

    pub fn methods(&self) -> Vec<&'static str> {
        METHODS
            .iter()
            .enumerate()
            .filter(|(i, _)| self.0 & (1 << i) != 0)
            .map(|(_, m)| *m)
            .collect()
    }
}

impl From<String> for RequestMethods {
    fn from(mask: String) -> Self {
        Self::parse(&mask)
    }
}

impl From<RequestMethods> for String {
    fn from(methods: RequestMethods) -> Self {
        methods.methods().join("|")
    }
}

/// Page - one node of a site's page tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub site_id: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    /// Page whose URL this page redirects to
    #[serde(default)]
    pub target_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub slug: String,

    /// Canonical URL, derived from the parent chain (see `ops::url`)
    #[serde(default)]
    pub url: String,

    /// Editor-provided URL override used when generating links
    #[serde(default)]
    pub custom_url: Option<String>,

    /// Unique per site
    pub route_name: String,

    #[serde(default)]
    pub page_alias: Option<String>,

    #[serde(default)]
    pub page_type: PageType,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Draft differs from the last published snapshot
    #[serde(default)]
    pub edited: bool,

    #[serde(default)]
    pub request_method: RequestMethods,

    #[serde(default = "default_true")]
    pub decorate: bool,

    #[serde(default)]
    pub template_code: Option<String>,

    #[serde(default)]
    pub raw_headers: BTreeMap<String, String>,

    #[serde(default)]
    pub position: i64,

    #[serde(default)]
    pub meta_description: Option<String>,

    #[serde(default)]
    pub meta_keywords: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Page {
    /// Create an enabled static page with empty url
    pub fn new(
        id: impl Into<String>,
        site_id: impl Into<String>,
        name: impl Into<String>,
        route_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            site_id: site_id.into(),
            parent_id: None,
            target_id: None,
            name: name.into(),
            title: None,
            slug: String::new(),
            url: String::new(),
            custom_url: None,
            route_name: route_name.into(),
            page_alias: None,
            page_type: PageType::Static,
            enabled: true,
            edited: false,
            request_method: RequestMethods::any(),
            decorate: true,
            template_code: None,
            raw_headers: BTreeMap::new(),
            position: 0,
            meta_description: None,
            meta_keywords: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_type(mut self, page_type: PageType) -> Self {
        self.page_type = page_type;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.page_alias = Some(alias.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Only static pages are rendered by the URL matcher
    pub fn is_cms(&self) -> bool {
        self.page_type == PageType::Static
    }

    pub fn is_dynamic(&self) -> bool {
        self.page_type == PageType::Dynamic
    }

    pub fn is_internal(&self) -> bool {
        self.route_name.starts_with(PAGE_INTERNAL_PREFIX)
    }

    pub fn is_error(&self) -> bool {
        self.route_name.starts_with(PAGE_INTERNAL_ERROR_PREFIX)
    }

    pub fn has_target(&self) -> bool {
        self.target_id.is_some()
    }

    pub fn allows_method(&self, method: &str) -> bool {
        self.request_method.allows(method)
    }

    /// Mark the draft as diverging from its published snapshot
    pub fn mark_edited(&mut self) {
        self.edited = true;
        self.updated_at = Utc::now();
    }
}
