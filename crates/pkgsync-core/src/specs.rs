//! The set of release specifiers a run synchronizes.

use std::{
    collections::BTreeMap,
    fs,
    path::Path,
};

use pkgsync_config::{error::ConfigError, versions::parse_versions};
use pkgsync_dl::{
    auth::Credentials,
    transport::{ensure_success, Transport},
};
use pkgsync_registry::{ReleaseSpecifier, Repository};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ErrorContext, PkgsyncResult};

/// Unique specifiers keyed by their literal text, validated on construction and read-only
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecificationSet {
    specs: BTreeMap<String, ReleaseSpecifier>,
}

impl SpecificationSet {
    fn insert(&mut self, spec: ReleaseSpecifier) {
        self.specs.insert(spec.as_str().to_string(), spec);
    }

    /// Builds a set from literal specifiers such as `pkg`, `pkg==1.0` or `pkg>=1,<2`.
    pub fn from_specifiers<I, S>(specs: I) -> PkgsyncResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for spec in specs {
            set.insert(ReleaseSpecifier::parse(spec.as_ref())?);
        }
        Ok(set)
    }

    /// One `name==version` specifier per entry. Keys keep their case.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPin`] for an entry that does not form a valid specifier.
    pub fn from_mapping(versions: &BTreeMap<String, String>) -> PkgsyncResult<Self> {
        let mut set = Self::default();
        for (name, version) in versions {
            let (name, version) = (name.trim(), version.trim());
            let spec = ReleaseSpecifier::parse(&format!("{name}=={version}")).map_err(|_| {
                ConfigError::InvalidPin {
                    name: name.to_string(),
                    version: version.to_string(),
                }
            })?;
            set.insert(spec);
        }
        Ok(set)
    }

    /// Every package listed by `repository`, minus packages excluded outright by a bare
    /// specifier in `exclude`.
    ///
    /// Index entries that are not valid project names are skipped with a warning.
    pub fn from_repository(
        repository: &Repository,
        exclude: &SpecificationSet,
    ) -> PkgsyncResult<Self> {
        let mut set = Self::default();
        for name in repository.package_names()? {
            let spec = match ReleaseSpecifier::parse(&name) {
                Ok(spec) => spec,
                Err(err) => {
                    warn!("skipping index entry {name:?}: {err}");
                    continue;
                }
            };
            if exclude
                .specs_for(spec.project_name())
                .iter()
                .any(ReleaseSpecifier::is_unconstrained)
            {
                debug!("{name} is excluded");
                continue;
            }
            set.insert(spec);
        }
        Ok(set)
    }

    /// Parses a buildout-style versions file.
    pub fn from_versions_content(content: &str) -> PkgsyncResult<Self> {
        Self::from_mapping(&parse_versions(content)?)
    }

    /// Loads a versions file from a local path, a `file://` URI or an `http(s)://` URI.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnrecognizedVersionsUri`] when `uri` is neither a URL we can fetch
    /// nor an existing local file.
    pub fn from_uri(
        uri: &str,
        credentials: Option<&Credentials>,
        transport: &dyn Transport,
    ) -> PkgsyncResult<Self> {
        let unrecognized = || ConfigError::UnrecognizedVersionsUri(uri.to_string());

        let content = if uri.starts_with("http://") || uri.starts_with("https://") {
            debug!("fetching versions from {uri}");
            let response = ensure_success(uri, transport.get(uri, credentials)?)?;
            response.into_text()?
        } else {
            let path = match uri.strip_prefix("file://") {
                Some(_) => {
                    Url::parse(uri)
                        .ok()
                        .and_then(|url| url.to_file_path().ok())
                        .ok_or_else(unrecognized)?
                }
                None => Path::new(uri).to_path_buf(),
            };
            if !path.is_file() {
                return Err(unrecognized().into());
            }
            debug!("reading versions from {}", path.display());
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?
        };

        Self::from_versions_content(&content)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn contains(&self, spec: &str) -> bool {
        self.specs.contains_key(spec)
    }

    /// Specifiers ordered by project name, then by the literal string.
    pub fn specifiers(&self) -> Vec<&ReleaseSpecifier> {
        let mut ordered: Vec<_> = self.specs.values().collect();
        ordered.sort_by(|a, b| {
            a.project_name()
                .cmp(b.project_name())
                .then_with(|| a.as_str().cmp(b.as_str()))
        });
        ordered
    }

    /// Every specifier naming `project`.
    pub fn specs_for(&self, project: &str) -> Vec<ReleaseSpecifier> {
        self.specs
            .values()
            .filter(|spec| spec.names(project))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use pkgsync_dl::transport::TransportResponse;

    use super::*;
    use crate::error::PkgsyncError;

    #[derive(Default)]
    struct PageTransport {
        pages: HashMap<String, (u16, String)>,
    }

    impl Transport for PageTransport {
        fn get(
            &self,
            url: &str,
            _credentials: Option<&Credentials>,
        ) -> pkgsync_dl::error::Result<TransportResponse> {
            let (status, body) = self
                .pages
                .get(url)
                .cloned()
                .unwrap_or((404, String::new()));
            Ok(TransportResponse::from_bytes(status, body))
        }

        fn post(
            &self,
            _url: &str,
            _headers: &[(String, String)],
            _body: &[u8],
        ) -> pkgsync_dl::error::Result<TransportResponse> {
            unreachable!()
        }
    }

    const VERSIONS_CFG: &str = "[buildout]\nversions = pins\n\n[pins]\niw.fss = 2.7.1\nzkaffold = 0.0.8\nzc.buildout = 1.4.3\n";

    #[test]
    fn test_from_specifiers_dedupes() {
        let set = SpecificationSet::from_specifiers(["pkg==1.0", "pkg==1.0", " pkg==1.0 ", "other"])
            .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("pkg==1.0"));
    }

    #[test]
    fn test_from_specifiers_rejects_invalid() {
        assert!(matches!(
            SpecificationSet::from_specifiers(["==1.0"]),
            Err(PkgsyncError::Registry(_))
        ));
    }

    #[test]
    fn test_from_mapping() {
        let mut versions = BTreeMap::new();
        versions.insert("Zope2".to_string(), "2.13.1".to_string());
        versions.insert("zkaffold".to_string(), "0.0.8".to_string());

        let set = SpecificationSet::from_mapping(&versions).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Zope2==2.13.1", "zkaffold==0.0.8"]);
    }

    #[test]
    fn test_from_mapping_rejects_bad_pin() {
        let mut versions = BTreeMap::new();
        versions.insert("zkaffold".to_string(), "0.0.8".to_string());
        versions.insert("Foo Bar".to_string(), "1.0".to_string());

        assert!(matches!(
            SpecificationSet::from_mapping(&versions),
            Err(PkgsyncError::Config(ConfigError::InvalidPin { ref name, .. })) if name == "Foo Bar"
        ));
    }

    #[test]
    fn test_from_versions_content_rejects_bad_pin() {
        let result = SpecificationSet::from_versions_content("[versions]\nzkaffold = <1\n");
        assert!(matches!(
            result,
            Err(PkgsyncError::Config(ConfigError::InvalidPin { .. }))
        ));
    }

    #[test]
    fn test_specs_for() {
        let set =
            SpecificationSet::from_specifiers(["pkg>=1.0", "pkg<0.5", "pkgx==1", "Other"]).unwrap();
        let specs: Vec<_> = set
            .specs_for("pkg")
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        assert_eq!(specs, vec!["pkg<0.5", "pkg>=1.0"]);
        assert_eq!(set.specs_for("other").len(), 1);
        assert!(set.specs_for("missing").is_empty());
    }

    #[test]
    fn test_specifiers_sorted_by_project() {
        let set = SpecificationSet::from_specifiers(["b==1", "a>=2", "a<1", "c"]).unwrap();
        let order: Vec<_> = set
            .specifiers()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        assert_eq!(order, vec!["a<1", "a>=2", "b==1", "c"]);
    }

    #[test]
    fn test_from_uri_local_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("versions.cfg");
        std::fs::write(&path, VERSIONS_CFG).unwrap();
        let transport = PageTransport::default();

        let set = SpecificationSet::from_uri(path.to_str().unwrap(), None, &transport).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains("zc.buildout==1.4.3"));

        let uri = Url::from_file_path(&path).unwrap().to_string();
        let set = SpecificationSet::from_uri(&uri, None, &transport).unwrap();
        assert!(set.contains("iw.fss==2.7.1"));
    }

    #[test]
    fn test_from_uri_http() {
        let mut transport = PageTransport::default();
        transport.pages.insert(
            "https://config.example.com/versions.cfg".into(),
            (200, "[versions]\npkgsync = 0.1.0\n".into()),
        );

        let set = SpecificationSet::from_uri(
            "https://config.example.com/versions.cfg",
            None,
            &transport,
        )
        .unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["pkgsync==0.1.0"]);

        assert!(matches!(
            SpecificationSet::from_uri("https://config.example.com/missing.cfg", None, &transport),
            Err(PkgsyncError::Download(_))
        ));
    }

    #[test]
    fn test_from_uri_unrecognized() {
        let transport = PageTransport::default();
        for uri in ["/nonexistent/versions.cfg", "ftp://example.com/versions.cfg"] {
            assert!(matches!(
                SpecificationSet::from_uri(uri, None, &transport),
                Err(PkgsyncError::Config(ConfigError::UnrecognizedVersionsUri(_)))
            ));
        }
    }

    #[test]
    fn test_from_uri_no_versions_section() {
        let mut transport = PageTransport::default();
        transport.pages.insert(
            "http://config.example.com/empty.cfg".into(),
            (200, "[buildout]\nparts =\n".into()),
        );
        assert!(matches!(
            SpecificationSet::from_uri("http://config.example.com/empty.cfg", None, &transport),
            Err(PkgsyncError::Config(ConfigError::NoVersionsSection(_)))
        ));
    }

    fn index(body: &str) -> Repository {
        let mut transport = PageTransport::default();
        transport
            .pages
            .insert("https://pypi.example.com/simple/".into(), (200, body.into()));
        Repository::with_transport("https://pypi.example.com", None, Arc::new(transport))
    }

    #[test]
    fn test_from_repository_drops_bare_excludes() {
        let repo = index("<a href=\"a/\">a</a><a href=\"b/\">B</a><a href=\"c/\">c</a>");
        let exclude = SpecificationSet::from_specifiers(["b", "c==1.0"]).unwrap();

        let set = SpecificationSet::from_repository(&repo, &exclude).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_from_repository_skips_invalid_names() {
        let repo = index("<a href=\"foo-bar/\">Foo Bar</a><a href=\"pkgsync/\">pkgsync</a>");

        let set = SpecificationSet::from_repository(&repo, &SpecificationSet::default()).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["pkgsync"]);
        assert_eq!(set.specifiers().len(), 1);
    }
}
