use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use pkgsync_config::{config::Config, repository::RepositoryConfig};
use pkgsync_core::{PkgsyncResult, SpecificationSet};
use pkgsync_dl::auth::Credentials;
use pkgsync_events::{EventSinkHandle, SyncEvent};
use pkgsync_registry::Repository;
use pkgsync_utils::fs::ensure_dir_exists;
use tracing::debug;

/// Everything a sync run needs: both repositories, the scratch directory, selection
/// options, the event sink and the interruption flag.
pub struct SyncContext {
    source: Repository,
    destination: Repository,
    tmp_dir: PathBuf,
    latest: bool,
    exclude: SpecificationSet,
    events: EventSinkHandle,
    interrupted: Arc<AtomicBool>,
}

fn credentials(repo: &RepositoryConfig) -> Option<Credentials> {
    Credentials::from_parts(repo.username.clone(), repo.password.clone())
}

impl SyncContext {
    pub fn new(
        source: Repository,
        destination: Repository,
        tmp_dir: impl Into<PathBuf>,
        events: EventSinkHandle,
    ) -> Self {
        Self {
            source,
            destination,
            tmp_dir: tmp_dir.into(),
            latest: false,
            exclude: SpecificationSet::default(),
            events,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Builds a context from a resolved [`Config`], creating the temporary directory.
    pub fn from_config(config: &Config, events: EventSinkHandle) -> PkgsyncResult<Self> {
        let destination = config.destination()?;
        let tmp_dir = config.get_tmp_dir()?;
        ensure_dir_exists(&tmp_dir)?;

        let exclude = SpecificationSet::from_specifiers(config.exclude())?;

        debug!(
            source = %config.source.url,
            destination = %destination.url,
            tmp_dir = %tmp_dir.display(),
            "creating sync context"
        );

        Ok(Self::new(
            Repository::new(&config.source.url, credentials(&config.source)),
            Repository::new(&destination.url, credentials(destination)),
            tmp_dir,
            events,
        )
        .with_latest(config.latest())
        .with_exclude(exclude))
    }

    pub fn with_latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    pub fn with_exclude(mut self, exclude: SpecificationSet) -> Self {
        self.exclude = exclude;
        self
    }

    /// Shares `flag` as the interruption flag, e.g. with a Ctrl-C handler.
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    pub fn source(&self) -> &Repository {
        &self.source
    }

    pub fn destination(&self) -> &Repository {
        &self.destination
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    pub fn latest(&self) -> bool {
        self.latest
    }

    /// Specifiers withheld from the run; bare names drop a project entirely.
    pub fn exclude(&self) -> &SpecificationSet {
        &self.exclude
    }

    pub fn events(&self) -> &EventSinkHandle {
        &self.events
    }

    pub fn emit(&self, event: SyncEvent) {
        self.events.emit(event);
    }

    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}
