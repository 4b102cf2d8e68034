// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Network Collaborators
//!
//! Implements the provenance contracts against the real network:
//!
//! - [`NetworkReachability`]: HTTP GET without redirects, `git ls-remote`
//! - [`DnsRegistrationChecker`]: DNS resolution plus an HTTPS probe
//! - [`HttpCatalog`]: catalog summary lookup plus a static allow list
//!
//! Every call is bounded by the configured timeout and every failure is
//! reported as `false`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Anti-corruption layer between provenance rules and the network

use crate::domain::provenance::{PublishedCatalog, ReachabilityChecker, RegistrationChecker};
use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use std::collections::BTreeSet;
use std::process::Stdio;
use std::time::Duration;
use url::Url;

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(redirect::Policy::none())
        .user_agent(concat!("finlint/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// HTTP and git-remote reachability
pub struct NetworkReachability {
    client: Client,
    timeout: Duration,
    git_binary: String,
}

impl NetworkReachability {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            timeout,
            git_binary: "git".to_string(),
        })
    }

    pub fn with_git_binary(mut self, binary: impl Into<String>) -> Self {
        self.git_binary = binary.into();
        self
    }
}

#[async_trait]
impl ReachabilityChecker for NetworkReachability {
    async fn check_http(&self, url: &Url) -> bool {
        match self.client.get(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(url = %url, %status, "HTTP reachability");
                status.is_success()
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "HTTP request failed");
                false
            }
        }
    }

    async fn check_git_remote(&self, url: &Url) -> bool {
        let mut cmd = tokio::process::Command::new(&self.git_binary);
        cmd.arg("ls-remote")
            .arg(url.as_str())
            .arg("HEAD")
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_ASKPASS", "/bin/true")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.status()).await {
            Ok(Ok(status)) => {
                tracing::debug!(url = %url, %status, "git ls-remote finished");
                status.success()
            }
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Failed to run git");
                false
            }
            Err(_) => {
                tracing::debug!(url = %url, "git ls-remote timed out");
                false
            }
        }
    }
}

/// Registration through DNS; reservation through an HTTPS answer
pub struct DnsRegistrationChecker {
    client: Client,
    timeout: Duration,
}

impl DnsRegistrationChecker {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            timeout,
        })
    }

    async fn resolves(&self, host: &str) -> bool {
        match tokio::time::timeout(self.timeout, tokio::net::lookup_host((host, 443))).await {
            Ok(Ok(mut addrs)) => addrs.next().is_some(),
            Ok(Err(e)) => {
                tracing::debug!(host = %host, error = %e, "DNS lookup failed");
                false
            }
            Err(_) => {
                tracing::debug!(host = %host, "DNS lookup timed out");
                false
            }
        }
    }
}

#[async_trait]
impl RegistrationChecker for DnsRegistrationChecker {
    async fn is_domain_registered(&self, domain: &str) -> bool {
        if self.resolves(domain).await {
            return true;
        }
        self.resolves(&format!("www.{}", domain)).await
    }

    async fn has_reserved_record(&self, domain: &str) -> bool {
        let Ok(url) = Url::parse(&format!("https://{}/", domain)) else {
            return false;
        };
        // Any answer counts, including redirects and error pages.
        match self.client.get(url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(domain = %domain, error = %e, "HTTPS probe failed");
                false
            }
        }
    }
}

/// "Is this id already listed" through a catalog API and a static list
pub struct HttpCatalog {
    client: Client,
    api: Option<String>,
    known: BTreeSet<String>,
}

impl HttpCatalog {
    pub fn new(
        api: Option<String>,
        known: impl IntoIterator<Item = String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            api: api.map(|a| a.trim_end_matches('/').to_string()),
            known: known.into_iter().collect(),
        })
    }
}

#[async_trait]
impl PublishedCatalog for HttpCatalog {
    async fn is_published(&self, appid: &str) -> bool {
        if self.known.contains(appid) {
            return true;
        }

        let Some(api) = &self.api else {
            return false;
        };

        let Ok(url) = Url::parse(&format!("{}/summary/{}", api, appid)) else {
            tracing::warn!(api = %api, "Catalog API URL is not valid");
            return false;
        };

        match self.client.get(url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!(appid = %appid, error = %e, "Catalog lookup failed");
                false
            }
        }
    }
}
