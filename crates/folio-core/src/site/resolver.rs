use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{CmsError, Result};
use crate::model::site::LOCALHOST;
use crate::model::Site;
use crate::ops::SiteRepository;

use super::locale::preferred_site;
use super::request::SiteRequest;

/// Site selection strategy, chosen by deployment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SiteSelection {
    #[default]
    HostOnly,
    HostLocale,
    HostPath,
    HostPathLocale,
}

impl SiteSelection {
    pub fn uses_path(&self) -> bool {
        matches!(self, SiteSelection::HostPath | SiteSelection::HostPathLocale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStatus {
    /// 301, used when the default site takes over an unmatched path
    Permanent,
    /// 302, used when the visitor's locale picks the target
    Temporary,
}

impl RedirectStatus {
    pub fn code(&self) -> u16 {
        match self {
            RedirectStatus::Permanent => 301,
            RedirectStatus::Temporary => 302,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub location: String,
    pub status: RedirectStatus,
}

/// Outcome of site resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Site(Site),
    Redirect(Redirect),
    /// No candidate site; the request continues without one
    Unresolved,
}

impl Resolution {
    pub fn site(&self) -> Option<&Site> {
        match self {
            Resolution::Site(site) => Some(site),
            _ => None,
        }
    }
}

/// A candidate whose path prefix matched the request path
struct PathMatch<'a> {
    site: &'a Site,
    prefix: String,
    remainder: String,
}

/// Resolves the site serving a request
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteResolver {
    selection: SiteSelection,
}

impl SiteResolver {
    pub fn new(selection: SiteSelection) -> Self {
        Self { selection }
    }

    pub fn selection(&self) -> SiteSelection {
        self.selection
    }

    /// Resolve the site for `request` at instant `at`
    ///
    /// On success the request may have been rewritten: the locale is copied
    /// from the site and, for path strategies, `path_info` becomes the part
    /// after the site prefix while `base_url` gains the prefix.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when a path strategy is used with a request
    /// that cannot be rewritten, or any repository error.
    pub fn resolve<R>(
        &self,
        repo: &R,
        request: &mut SiteRequest,
        at: DateTime<Utc>,
    ) -> Result<Resolution>
    where
        R: SiteRepository + ?Sized,
    {
        if self.selection.uses_path() && !request.kind.supports_path_rewrite() {
            return Err(CmsError::Configuration {
                reason: format!(
                    "site selection {:?} requires a request that supports path rewriting",
                    self.selection
                ),
            });
        }

        let sites = repo.sites_for_hosts(&[request.host.as_str(), LOCALHOST])?;
        let candidates = order_candidates(&sites, at);

        tracing::debug!(
            component = module_path!(),
            host = %request.host,
            path = %request.path_info,
            candidates = candidates.len(),
            "resolving site"
        );

        let resolution = match self.selection {
            SiteSelection::HostOnly => self.by_host(&candidates, request),
            SiteSelection::HostLocale => self.by_host_locale(&candidates, request),
            SiteSelection::HostPath | SiteSelection::HostPathLocale => {
                self.by_path(&candidates, request)?
            }
        };

        if let Resolution::Site(site) = &resolution {
            if site.locale.is_some() {
                request.locale = site.locale.clone();
            }
        }
        Ok(resolution)
    }

    fn by_host(&self, candidates: &[&Site], request: &SiteRequest) -> Resolution {
        pinned(candidates, request)
            .or_else(|| candidates.first().copied())
            .map(|site| Resolution::Site(site.clone()))
            .unwrap_or(Resolution::Unresolved)
    }

    fn by_host_locale(&self, candidates: &[&Site], request: &SiteRequest) -> Resolution {
        pinned(candidates, request)
            .or_else(|| preferred_site(candidates, &request.preferred_languages))
            .or_else(|| candidates.first().copied())
            .map(|site| Resolution::Site(site.clone()))
            .unwrap_or(Resolution::Unresolved)
    }

    fn by_path(&self, candidates: &[&Site], request: &mut SiteRequest) -> Result<Resolution> {
        let mut matches: Vec<PathMatch> = Vec::new();
        for site in candidates {
            if let Some(m) = match_prefix(site, &request.path_info)? {
                matches.push(m);
            }
        }

        let pinned_match = request.pinned_site_id.as_deref().and_then(|pinned_id| {
            matches.iter().position(|m| m.site.id == pinned_id)
        });
        // Real hosts beat localhost, then the longest prefix wins.
        let chosen = pinned_match.or_else(|| {
            matches
                .iter()
                .enumerate()
                .max_by(|(ia, a), (ib, b)| {
                    (!a.site.is_localhost())
                        .cmp(&!b.site.is_localhost())
                        .then_with(|| a.prefix.len().cmp(&b.prefix.len()))
                        .then_with(|| ib.cmp(ia))
                })
                .map(|(i, _)| i)
        });

        if let Some(index) = chosen {
            let m = &matches[index];
            request.path_info = m.remainder.clone();
            request.base_url = format!("{}{}", request.base_url.trim_end_matches('/'), m.prefix);
            return Ok(Resolution::Site(m.site.clone()));
        }

        let target = match self.selection {
            SiteSelection::HostPath => candidates
                .iter()
                .find(|s| s.is_default)
                .map(|site| (*site, RedirectStatus::Permanent)),
            _ => preferred_site(candidates, &request.preferred_languages)
                .or_else(|| candidates.first().copied())
                .map(|site| (site, RedirectStatus::Temporary)),
        };

        Ok(match target {
            Some((site, status)) => Resolution::Redirect(Redirect {
                location: redirect_location(site, request),
                status,
            }),
            None => Resolution::Unresolved,
        })
    }
}

/// Enabled candidates with real hosts before localhost fallbacks
///
/// Within each group the repository order (default sites first) is kept.
fn order_candidates(sites: &[Site], at: DateTime<Utc>) -> Vec<&Site> {
    let (real, fallback): (Vec<&Site>, Vec<&Site>) = sites
        .iter()
        .filter(|s| s.is_enabled_at(at))
        .partition(|s| !s.is_localhost());
    real.into_iter().chain(fallback).collect()
}

fn pinned<'a>(candidates: &[&'a Site], request: &SiteRequest) -> Option<&'a Site> {
    let pinned_id = request.pinned_site_id.as_deref()?;
    candidates.iter().find(|s| s.id == pinned_id).copied()
}

fn match_prefix<'a>(site: &'a Site, path: &str) -> Result<Option<PathMatch<'a>>> {
    let prefix = site.normalized_relative_path();
    let pattern = format!("^({})(/.*|$)", regex::escape(&prefix));
    let re = Regex::new(&pattern).map_err(|e| CmsError::Internal {
        message: format!("invalid site prefix pattern for site {}: {}", site.id, e),
    })?;

    Ok(re.captures(path).map(|caps| {
        let remainder = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        PathMatch {
            site,
            prefix,
            remainder: if remainder.is_empty() {
                "/".to_string()
            } else {
                remainder.to_string()
            },
        }
    }))
}

/// Localhost sites answer on any host, so they redirect to the requesting one
fn redirect_location(site: &Site, request: &SiteRequest) -> String {
    let url = site.url();
    let location = if url.starts_with("//") {
        format!("{}:{}", request.scheme, url)
    } else {
        format!("{}{}", request.scheme_and_host(), url)
    };
    if site.normalized_relative_path().is_empty() && !location.ends_with('/') {
        format!("{}/", location)
    } else {
        location
    }
}
