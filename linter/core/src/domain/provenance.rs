// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! AppID Provenance
//!
//! Reconstructs where an application identifier claims to come from (a
//! code-forge project or a registrable domain) and verifies that claim
//! through network collaborators.
//!
//! Candidate reconstruction is deterministic and pure; only [`ProvenanceResolver::verify`]
//! touches the network, and only through the [`ReachabilityChecker`] and
//! [`RegistrationChecker`] traits. Collaborators never fail: an unreachable
//! host is simply `false`.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements the identifier → URL/domain heuristic and its verification contract

use crate::domain::appid::AppId;
use crate::domain::diagnostics::Diagnostics;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Network reachability contract. Implementations bound every call with a
/// timeout and map any failure to `false`.
#[async_trait]
pub trait ReachabilityChecker: Send + Sync {
    /// GET without following redirects; true iff a 2xx response arrives
    async fn check_http(&self, url: &Url) -> bool;

    /// List the remote's HEAD; true iff the listing succeeds
    async fn check_git_remote(&self, url: &Url) -> bool;
}

/// Domain registration contract. The lookup mechanism is an implementation
/// detail; only the boolean matters.
#[async_trait]
pub trait RegistrationChecker: Send + Sync {
    async fn is_domain_registered(&self, domain: &str) -> bool;

    async fn has_reserved_record(&self, domain: &str) -> bool;
}

/// Answers whether an identifier is already listed on the distribution
/// service, in which case provenance is not re-verified.
#[async_trait]
pub trait PublishedCatalog: Send + Sync {
    async fn is_published(&self, appid: &str) -> bool;
}

/// How a candidate URL is verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    GitRemote,
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceCandidate {
    pub url: Url,
    pub verification: Verification,
}

/// What an identifier resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// One or two code-forge URLs; any reachable one proves provenance
    CodeHost(Vec<ProvenanceCandidate>),
    /// A registrable domain
    Domain(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvenanceError {
    #[error("no code-host URL can be formed for {0}")]
    CodeHostNotFound(String),

    #[error("no domain can be formed for {0}")]
    DomainNotFound(String),
}

impl ProvenanceError {
    pub fn code(&self) -> &'static str {
        match self {
            ProvenanceError::CodeHostNotFound(_) => "appid-code-host-not-found",
            ProvenanceError::DomainNotFound(_) => "appid-domain-not-found",
        }
    }
}

/// Code forges addressed by a git remote: (identifier prefix, host)
const GIT_FORGES: &[(&[&str], &str)] = &[
    (&["io", "github"], "github.com"),
    (&["io", "gitlab"], "gitlab.com"),
    (&["io", "frama"], "framagit.org"),
    (&["page", "codeberg"], "codeberg.org"),
    (&["org", "gnome", "gitlab"], "gitlab.gnome.org"),
    (&["org", "freedesktop", "gitlab"], "gitlab.freedesktop.org"),
];

const SOURCEFORGE_PREFIXES: &[&[&str]] = &[&["io", "sourceforge"], &["net", "sourceforge"]];

/// First-party namespaces with a fixed domain: (identifier prefix, domain)
const FIRST_PARTY_DOMAINS: &[(&[&str], &str)] = &[
    (&["org", "gnome"], "gnome.org"),
    (&["org", "kde"], "kde.org"),
    (&["org", "freedesktop"], "freedesktop.org"),
];

/// Top-level domains whose registries need a second, reservation-style check
const STRICT_TLDS: &[&str] = &["ch", "es", "gr", "my", "pk", "vn"];

/// Undo the reverse-DNS mangling of hyphens: one leading underscore is
/// dropped, remaining underscores become hyphens.
pub fn demangle(component: &str) -> String {
    let component = component.strip_prefix('_').unwrap_or(component);
    component.replace('_', "-")
}

fn has_prefix(components: &[&str], prefix: &[&str]) -> bool {
    components.len() >= prefix.len()
        && components
            .iter()
            .zip(prefix)
            .all(|(component, expected)| component.eq_ignore_ascii_case(expected))
}

fn url_label(component: &str) -> Option<String> {
    let label = demangle(component).to_lowercase();
    (!label.is_empty()).then_some(label)
}

fn git_candidate(host: &str, user: &str, project: &str) -> Option<ProvenanceCandidate> {
    let user = url_label(user)?;
    let project = url_label(project)?;
    let url = Url::parse(&format!("https://{}/{}/{}.git", host, user, project)).ok()?;
    Some(ProvenanceCandidate {
        url,
        verification: Verification::GitRemote,
    })
}

/// Reconstruct the provenance claim encoded in an identifier
pub fn resolve(appid: &AppId) -> Result<Provenance, ProvenanceError> {
    let components = appid.components();

    if let Some((prefix, host)) = GIT_FORGES.iter().find(|(prefix, _)| has_prefix(&components, prefix)) {
        let rest = &components[prefix.len()..];
        let candidates: Vec<ProvenanceCandidate> = match rest {
            // Umbrella apps embed a sub-app name: either trailing component
            // may be the project.
            [user, first, second] if prefix.len() == 2 => [first, second]
                .into_iter()
                .filter_map(|project| git_candidate(host, user, project))
                .collect(),
            [user, project, ..] => git_candidate(host, user, project).into_iter().collect(),
            _ => Vec::new(),
        };

        if candidates.is_empty() {
            return Err(ProvenanceError::CodeHostNotFound(appid.to_string()));
        }
        return Ok(Provenance::CodeHost(candidates));
    }

    if let Some(prefix) = SOURCEFORGE_PREFIXES.iter().find(|prefix| has_prefix(&components, prefix)) {
        let candidate = components
            .get(prefix.len())
            .and_then(|project| url_label(project))
            .and_then(|project| Url::parse(&format!("https://sourceforge.net/projects/{}/", project)).ok())
            .map(|url| ProvenanceCandidate {
                url,
                verification: Verification::Http,
            })
            .ok_or_else(|| ProvenanceError::CodeHostNotFound(appid.to_string()))?;
        return Ok(Provenance::CodeHost(vec![candidate]));
    }

    if let Some((_, domain)) = FIRST_PARTY_DOMAINS.iter().find(|(prefix, _)| has_prefix(&components, prefix)) {
        return Ok(Provenance::Domain((*domain).to_string()));
    }

    if components.len() < 3 {
        return Err(ProvenanceError::DomainNotFound(appid.to_string()));
    }

    let tld = components[0];
    let mut labels: Vec<String> = components[1..components.len() - 1]
        .iter()
        .map(|component| demangle(component))
        .collect();
    labels.reverse();
    labels.push(tld.to_string());

    if labels.iter().any(String::is_empty) {
        return Err(ProvenanceError::DomainNotFound(appid.to_string()));
    }

    Ok(Provenance::Domain(labels.join(".").to_lowercase()))
}

fn needs_reservation_check(domain: &str) -> bool {
    domain
        .rsplit('.')
        .next()
        .is_some_and(|tld| STRICT_TLDS.contains(&tld))
}

/// Verifies a resolved provenance claim through the network collaborators
pub struct ProvenanceResolver {
    reachability: Arc<dyn ReachabilityChecker>,
    registration: Arc<dyn RegistrationChecker>,
}

impl ProvenanceResolver {
    pub fn new(
        reachability: Arc<dyn ReachabilityChecker>,
        registration: Arc<dyn RegistrationChecker>,
    ) -> Self {
        Self {
            reachability,
            registration,
        }
    }

    async fn check_candidate(&self, candidate: &ProvenanceCandidate) -> bool {
        let reachable = match candidate.verification {
            Verification::GitRemote => self.reachability.check_git_remote(&candidate.url).await,
            Verification::Http => self.reachability.check_http(&candidate.url).await,
        };
        tracing::debug!(url = %candidate.url, reachable, "Checked provenance candidate");
        reachable
    }

    /// Resolve and verify, reporting findings as diagnostics
    pub async fn verify(&self, appid: &AppId) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        match resolve(appid) {
            Err(e) => {
                tracing::info!(appid = %appid, "{}", e);
                diagnostics.error(e.code());
            }
            Ok(Provenance::CodeHost(candidates)) => {
                let results = join_all(candidates.iter().map(|c| self.check_candidate(c))).await;
                if !results.into_iter().any(|reachable| reachable) {
                    tracing::warn!(appid = %appid, "No code-host candidate is reachable");
                    diagnostics.error("appid-code-host-not-reachable");
                }
            }
            Ok(Provenance::Domain(domain)) => {
                if needs_reservation_check(&domain) {
                    let (reserved, registered) = futures::join!(
                        self.registration.has_reserved_record(&domain),
                        self.registration.is_domain_registered(&domain)
                    );
                    if !(reserved && registered) {
                        tracing::warn!(domain = %domain, reserved, registered, "Domain could not be resolved");
                        diagnostics.error("appid-domain-not-resolvable");
                    }
                } else if !self.registration.is_domain_registered(&domain).await {
                    tracing::warn!(domain = %domain, "Domain is not registered");
                    diagnostics.error("appid-domain-not-registered");
                }
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(raw: &str) -> Vec<String> {
        match resolve(&AppId::new(raw)).unwrap() {
            Provenance::CodeHost(candidates) => candidates.into_iter().map(|c| c.url.to_string()).collect(),
            Provenance::Domain(domain) => panic!("expected code host, got domain {}", domain),
        }
    }

    fn domain(raw: &str) -> String {
        match resolve(&AppId::new(raw)).unwrap() {
            Provenance::Domain(domain) => domain,
            other => panic!("expected domain, got {:?}", other),
        }
    }

    #[test]
    fn test_demangle() {
        assert_eq!(demangle("_0xfoo"), "0xfoo");
        assert_eq!(demangle("my_project"), "my-project");
        assert_eq!(demangle("__a_b"), "-a-b");
        assert_eq!(demangle("plain"), "plain");
    }

    #[test]
    fn test_github_candidate_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(urls("io.github.alice.Tool"), vec!["https://github.com/alice/tool.git"]);
        }
    }

    #[test]
    fn test_forge_hosts() {
        assert_eq!(urls("io.gitlab.bob.Thing"), vec!["https://gitlab.com/bob/thing.git"]);
        assert_eq!(urls("io.frama.carol.Pad"), vec!["https://framagit.org/carol/pad.git"]);
        assert_eq!(urls("page.codeberg.dave.Notes"), vec!["https://codeberg.org/dave/notes.git"]);
        assert_eq!(
            urls("org.gnome.gitlab.World.Fragments"),
            vec!["https://gitlab.gnome.org/world/fragments.git"]
        );
        assert_eq!(
            urls("org.freedesktop.gitlab.user.my_tool"),
            vec!["https://gitlab.freedesktop.org/user/my-tool.git"]
        );
    }

    #[test]
    fn test_five_components_yield_two_candidates() {
        assert_eq!(
            urls("io.github.alice.Suite.Viewer"),
            vec![
                "https://github.com/alice/suite.git",
                "https://github.com/alice/viewer.git",
            ]
        );
    }

    #[test]
    fn test_sourceforge_uses_project_listing() {
        let provenance = resolve(&AppId::new("net.sourceforge.Frozen_Bubble.Game")).unwrap();
        let Provenance::CodeHost(candidates) = provenance else {
            panic!("expected code host");
        };
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url.as_str(), "https://sourceforge.net/projects/frozen-bubble/");
        assert_eq!(candidates[0].verification, Verification::Http);
    }

    #[test]
    fn test_forge_without_project_is_not_found() {
        let err = resolve(&AppId::new("io.frama.OnlyUser")).unwrap_err();
        assert_eq!(err.code(), "appid-code-host-not-found");

        let err = resolve(&AppId::new("org.gnome.gitlab.Thing")).unwrap_err();
        assert_eq!(err.code(), "appid-code-host-not-found");
    }

    #[test]
    fn test_first_party_domains() {
        assert_eq!(domain("org.gnome.Calculator"), "gnome.org");
        assert_eq!(domain("org.kde.kate"), "kde.org");
        assert_eq!(domain("org.freedesktop.Platform.GL.default"), "freedesktop.org");
    }

    #[test]
    fn test_generic_domain_reconstruction() {
        assert_eq!(domain("com.example.App"), "example.com");
        assert_eq!(domain("org.Foo.bar.App"), "bar.foo.org");
        assert_eq!(domain("de.my_site.Tool"), "my-site.de");
    }

    #[test]
    fn test_empty_label_is_domain_not_found() {
        let err = resolve(&AppId::new("com._.App")).unwrap_err();
        assert_eq!(err.code(), "appid-domain-not-found");
    }

    #[test]
    fn test_strict_tlds() {
        assert!(needs_reservation_check("example.ch"));
        assert!(needs_reservation_check("foo.vn"));
        assert!(!needs_reservation_check("example.com"));
        assert!(!needs_reservation_check("example.chx"));
    }
}
