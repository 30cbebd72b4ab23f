//! Race-to-first mirror resolution (spec §4.4).

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use repoutils_config::ResolvedConfig;
use repoutils_core::CancellationToken;

use crate::error::{MirrorError, Result};
use crate::registry::MirrorRegistry;

/// Notified of probe lifecycle events, for UI progress reporting. Mirrors
/// the teacher's kernel-trigger callback style but as a plain trait object
/// rather than a global dispatcher.
pub trait ProbeObserver: Send + Sync {
    /// A probe against `host` started.
    fn probe_started(&self, host: &str) {
        let _ = host;
    }
    /// A probe against `host` completed; `elapsed` is `None` on failure.
    fn probe_finished(&self, host: &str, elapsed: Option<Duration>) {
        let _ = (host, elapsed);
    }
}

struct NoopObserver;
impl ProbeObserver for NoopObserver {}

/// Resolves `user/repo@host` references against a [`MirrorRegistry`] by
/// racing reachability probes and returning the first responder.
pub struct MirrorResolver {
    registry: MirrorRegistry,
    client: reqwest::Client,
    observer: Arc<dyn ProbeObserver>,
    probe_timeout: Duration,
}

/// The outcome of resolving a reference: the URL a backend should actually
/// fetch from, and the official (non-mirror) URL `origin` must be restored
/// to afterward per spec §4.5.1. Equal for opaque references, hosts with no
/// registered mirrors, and when the registry has no `official` entry to
/// restore to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The URL selected for fetching: the fastest reachable mirror, or the
    /// official URL if none responded.
    pub url: String,
    /// The official upstream URL, substituted from the registry's
    /// `official` template.
    pub official_url: String,
}

impl Resolution {
    fn passthrough(reference: &str) -> Self {
        Self {
            url: reference.to_string(),
            official_url: reference.to_string(),
        }
    }
}

/// A parsed `user/repo@host` reference, or an opaque URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference<'a> {
    /// An opaque URL, returned unchanged by [`MirrorResolver::resolve`].
    Opaque(&'a str),
    /// A `user/repo@host` mirror reference.
    Parsed {
        /// Owner or organization segment.
        user: &'a str,
        /// Repository name segment.
        repo: &'a str,
        /// Logical host token (e.g. `github`).
        host: &'a str,
    },
}

/// Split `reference` on the last `@`, then the first `/` before it. Mirrors
/// the original implementation's `(.*)/(.*)@(.*)` pattern without a regex
/// dependency.
#[must_use]
pub fn parse_reference(reference: &str) -> Reference<'_> {
    let Some((path, host)) = reference.rsplit_once('@') else {
        return Reference::Opaque(reference);
    };
    let Some((user, repo)) = path.rsplit_once('/') else {
        return Reference::Opaque(reference);
    };
    if host.is_empty() || user.is_empty() || repo.is_empty() {
        return Reference::Opaque(reference);
    }
    Reference::Parsed { user, repo, host }
}

fn substitute(template: &str, user: &str, repo: &str) -> String {
    template.replace("{user}", user).replace("{repo}", repo)
}

impl MirrorResolver {
    /// Build a resolver over `registry` using a default HTTP client and the
    /// default 15 s probe timeout.
    #[must_use]
    pub fn new(registry: MirrorRegistry) -> Self {
        Self {
            registry,
            client: reqwest::Client::new(),
            observer: Arc::new(NoopObserver),
            probe_timeout: Duration::from_millis(ResolvedConfig::default().resolver_timeout_ms),
        }
    }

    /// Attach a progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProbeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Apply `resolver.timeout_ms` from a resolved settings view in place of
    /// the 15 s default.
    #[must_use]
    pub fn with_resolved_config(mut self, config: &ResolvedConfig) -> Self {
        self.probe_timeout = Duration::from_millis(config.resolver_timeout_ms);
        self
    }

    /// Resolve `reference` to a [`Resolution`]. Opaque references and
    /// references for hosts/protocols with no registered mirrors resolve to
    /// themselves, with `url == official_url`.
    pub async fn resolve(&self, reference: &str, protocol: &str) -> Result<Resolution> {
        let (user, repo, host) = match parse_reference(reference) {
            Reference::Opaque(_) => return Ok(Resolution::passthrough(reference)),
            Reference::Parsed { user, repo, host } => (user, repo, host),
        };

        let mirrors = self.registry.mirrors_for(host, protocol);
        if mirrors.is_empty() {
            return Ok(Resolution::passthrough(reference));
        }

        let official_url = self
            .registry
            .official_template(host, protocol)
            .ok()
            .map(|template| substitute(&template, user, repo));

        let done = CancellationToken::new();
        let mut probes = FuturesUnordered::new();
        for (_name, template) in &mirrors {
            let url = substitute(template, user, repo);
            let client = self.client.clone();
            let done = done.clone();
            let observer = self.observer.clone();
            let probe_timeout = self.probe_timeout;
            probes.push(async move {
                if done.is_cancelled() {
                    return None;
                }
                observer.probe_started(&url);
                let start = std::time::Instant::now();
                let reachable = probe_head(&client, &url, probe_timeout).await;
                if done.is_cancelled() {
                    observer.probe_finished(&url, None);
                    return None;
                }
                if reachable {
                    observer.probe_finished(&url, Some(start.elapsed()));
                    Some(url)
                } else {
                    observer.probe_finished(&url, None);
                    None
                }
            });
        }

        while let Some(result) = probes.next().await {
            if let Some(winner) = result {
                done.cancel();
                // No registered `official` entry leaves nothing correct to
                // restore `origin` to; fall back to the winning mirror URL
                // itself so the dispatcher's equality check skips the
                // rewrite instead of restoring a bogus value.
                let official_url = official_url.unwrap_or_else(|| winner.clone());
                return Ok(Resolution { url: winner, official_url });
            }
        }

        let official_url = official_url.ok_or_else(|| MirrorError::MissingOfficial {
            host: host.to_string(),
            protocol: protocol.to_string(),
        })?;
        Ok(Resolution {
            url: official_url.clone(),
            official_url,
        })
    }
}

async fn probe_head(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, client.head(url).send()).await {
        Ok(Ok(response)) => response.status().is_success() || response.status().is_redirection(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_repo_at_host() {
        let parsed = parse_reference("alice/widget@github");
        assert_eq!(
            parsed,
            Reference::Parsed {
                user: "alice",
                repo: "widget",
                host: "github"
            }
        );
    }

    #[test]
    fn opaque_url_passes_through() {
        assert_eq!(
            parse_reference("https://example.org/repo.git"),
            Reference::Opaque("https://example.org/repo.git")
        );
    }

    #[test]
    fn substitution_replaces_both_tokens() {
        assert_eq!(
            substitute("https://x/{user}/{repo}.git", "alice", "widget"),
            "https://x/alice/widget.git"
        );
    }

    #[tokio::test]
    async fn opaque_reference_resolves_unchanged() {
        let registry = MirrorRegistry::from_afm(repoutils_config::Afm::empty(
            repoutils_core::VariableStore::new(),
        ));
        let resolver = MirrorResolver::new(registry);
        let resolved = resolver
            .resolve("https://example.org/x.git", "http")
            .await
            .unwrap();
        assert_eq!(resolved.url, "https://example.org/x.git");
        assert_eq!(resolved.official_url, "https://example.org/x.git");
    }

    #[tokio::test]
    async fn unregistered_host_resolves_unchanged() {
        let registry = MirrorRegistry::from_afm(repoutils_config::Afm::empty(
            repoutils_core::VariableStore::new(),
        ));
        let resolver = MirrorResolver::new(registry);
        let resolved = resolver.resolve("alice/widget@github", "http").await.unwrap();
        assert_eq!(resolved.url, "alice/widget@github");
        assert_eq!(resolved.official_url, "alice/widget@github");
    }

    #[test]
    fn default_probe_timeout_matches_resolved_config_default() {
        let registry = MirrorRegistry::from_afm(repoutils_config::Afm::empty(
            repoutils_core::VariableStore::new(),
        ));
        let resolver = MirrorResolver::new(registry);
        assert_eq!(
            resolver.probe_timeout,
            Duration::from_millis(repoutils_config::DEFAULT_RESOLVER_TIMEOUT_MS)
        );
    }
}
