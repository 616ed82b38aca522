//! Client for one repository's simple index and upload endpoint.

use std::{
    collections::BTreeSet,
    fmt,
    sync::{Arc, Mutex},
};

use pkgsync_dl::{
    auth::Credentials,
    transport::{HttpTransport, Transport},
    utils::basename_from_href,
};
use pkgsync_package::{LocalDistribution, Metadata};
use tracing::debug;

use crate::{
    error::{RegistryError, Result},
    links::extract_links,
    remote::RemoteDistribution,
    specifier::ReleaseSpecifier,
    upload::{self, Action},
};

pub const SIMPLE_PREFIX: &str = "simple";

/// A package repository exposing `<base>/simple/` and accepting form posts at `<base>/`.
pub struct Repository {
    base_url: String,
    credentials: Option<Credentials>,
    transport: Arc<dyn Transport>,
    package_names: Mutex<Option<BTreeSet<String>>>,
}

impl Repository {
    /// Creates a repository backed by the shared HTTP agent.
    pub fn new(base_url: &str, credentials: Option<Credentials>) -> Self {
        Self::with_transport(base_url, credentials, Arc::new(HttpTransport))
    }

    pub fn with_transport(
        base_url: &str,
        credentials: Option<Credentials>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            transport,
            package_names: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn simple_url(&self) -> String {
        format!("{}/{SIMPLE_PREFIX}/", self.base_url)
    }

    pub fn package_index(&self, package_name: &str) -> String {
        format!("{}/{SIMPLE_PREFIX}/{package_name}/", self.base_url)
    }

    /// Where registrations and uploads are posted.
    pub fn upload_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// Fetches an index page. `None` means the page does not exist.
    fn fetch_page(&self, url: &str) -> Result<Option<String>> {
        let response = self.transport.get(url, self.credentials.as_ref())?;
        let status = response.status;

        if status == 404 {
            debug!("{url} not found");
            return Ok(None);
        }
        if response.is_unauthorized() {
            let body = response.into_text().unwrap_or_default();
            return Err(RegistryError::Unauthorized {
                url: url.to_string(),
                status,
                body,
            });
        }
        if !response.is_success() {
            return Err(RegistryError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }

        Ok(Some(response.into_text()?))
    }

    fn lock_names(&self) -> std::sync::MutexGuard<'_, Option<BTreeSet<String>>> {
        self.package_names
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every package name listed on the simple index. Cached after the first success.
    pub fn package_names(&self) -> Result<BTreeSet<String>> {
        if let Some(names) = self.lock_names().as_ref() {
            return Ok(names.clone());
        }

        let url = self.simple_url();
        let names: BTreeSet<String> = self
            .fetch_page(&url)?
            .map(|html| {
                extract_links(&html)
                    .into_iter()
                    .map(|link| {
                        if link.text.is_empty() {
                            basename_from_href(link.href.trim_end_matches('/'))
                        } else {
                            link.text
                        }
                    })
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        debug!("{} lists {} packages", url, names.len());
        *self.lock_names() = Some(names.clone());
        Ok(names)
    }

    pub fn invalidate_package_names(&self) {
        *self.lock_names() = None;
    }

    /// Every well-formed distribution linked from the package's index page.
    ///
    /// Links that do not name a distribution of `package_name` are skipped.
    pub fn all_distributions(&self, package_name: &str) -> Result<Vec<RemoteDistribution>> {
        let index_url = self.package_index(package_name);
        let Some(html) = self.fetch_page(&index_url)? else {
            return Ok(Vec::new());
        };

        let dists = extract_links(&html)
            .into_iter()
            .filter_map(|link| {
                match RemoteDistribution::from_href(
                    package_name,
                    &index_url,
                    &link.href,
                    self.credentials.clone(),
                    self.transport.clone(),
                ) {
                    Ok(dist) => Some(dist),
                    Err(err) => {
                        debug!("skipping link {}: {err}", link.href);
                        None
                    }
                }
            })
            .collect();

        Ok(dists)
    }

    /// Distributions matching `specifier` and none of `exclude`.
    ///
    /// With `latest`, only the first distribution of the highest matching version is kept.
    pub fn distributions(
        &self,
        specifier: &ReleaseSpecifier,
        exclude: &[ReleaseSpecifier],
        latest: bool,
    ) -> Result<Vec<RemoteDistribution>> {
        let project = specifier.project_name();
        let matching: Vec<RemoteDistribution> = self
            .all_distributions(project)?
            .into_iter()
            .filter(|dist| specifier.matches(dist.version()))
            .filter(|dist| {
                !exclude
                    .iter()
                    .any(|ex| ex.names(project) && ex.matches(dist.version()))
            })
            .collect();

        if !latest {
            return Ok(matching);
        }

        let newest = matching
            .iter()
            .reduce(|best, dist| if dist.version() > best.version() { dist } else { best })
            .cloned();
        Ok(newest.into_iter().collect())
    }

    /// Registers the release described by `metadata`.
    pub fn register(&self, metadata: &Metadata) -> Result<u16> {
        upload::send(
            self.transport.as_ref(),
            &self.upload_url(),
            self.credentials.as_ref(),
            Action::Register,
            &metadata.register_payload(),
        )
    }

    /// Uploads `dist` as a file of the release described by `metadata`.
    pub fn upload(&self, metadata: &Metadata, dist: &LocalDistribution) -> Result<u16> {
        let payload = metadata.upload_payload(dist)?;
        upload::send(
            self.transport.as_ref(),
            &self.upload_url(),
            self.credentials.as_ref(),
            Action::Upload,
            &payload,
        )
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}
