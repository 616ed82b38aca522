//! The synchronization engine.
//!
//! For each specifier the source is queried first; only when it has matching artifacts is
//! the destination queried and the difference computed. Every missing artifact then runs
//! through fetch, metadata extraction, registration and upload, and its temporary file is
//! removed whatever the outcome. Failures are recorded against the artifact or specifier
//! and never stop the run.

use pkgsync_core::{PkgsyncError, PkgsyncResult, SpecificationSet};
use pkgsync_events::{ArtifactStage, SyncEvent};
use pkgsync_package::Metadata;
use pkgsync_registry::{diff, ReleaseSpecifier, RemoteDistribution};
use pkgsync_utils::fs::safe_remove;
use tracing::{debug, debug_span, info, warn};

use crate::{FailedInfo, PackageOutcome, PackageReport, SyncContext, SyncReport, SyncedInfo};

/// Synchronizes every specifier in `specs` from the context's source to its destination.
///
/// Specifiers are processed ordered by project name, then by their literal text. The
/// interruption flag is honoured between specifiers and between artifacts.
///
/// Failures are recorded per specifier and per artifact in the returned report.
pub fn sync(ctx: &SyncContext, specs: &SpecificationSet) -> SyncReport {
    let specifiers = specs.specifiers();
    debug!(count = specifiers.len(), "starting sync");

    let mut report = SyncReport::default();
    for specifier in specifiers {
        if ctx.is_interrupted() {
            warn!("interrupted before {}", specifier);
            report.interrupted = true;
            break;
        }

        let outcome = sync_specifier(ctx, specifier);
        report.packages.push(PackageReport {
            specifier: specifier.as_str().to_string(),
            outcome,
        });
    }

    if ctx.is_interrupted() {
        report.interrupted = true;
    }

    info!(
        packages = report.packages.len(),
        synced = report.synced().count(),
        failed = report.failed().count(),
        "sync finished"
    );
    report
}

/// Artifacts on the source matching `specifier` that the destination lacks.
///
/// `latest` narrows the source query only. The destination is always queried for every
/// matching release, so an artifact it already holds is never offered again. The
/// destination is not queried when the source has nothing to offer.
pub fn missing_distributions(
    ctx: &SyncContext,
    specifier: &ReleaseSpecifier,
    exclude: &[ReleaseSpecifier],
) -> PkgsyncResult<Vec<RemoteDistribution>> {
    debug!("querying {} for {}", ctx.source(), specifier);
    let available = ctx
        .source()
        .distributions(specifier, exclude, ctx.latest())?;
    if available.is_empty() {
        return Ok(available);
    }

    debug!("querying {} for {}", ctx.destination(), specifier);
    let present = ctx
        .destination()
        .distributions(specifier, exclude, false)?;

    Ok(diff(&available, &present))
}


fn required_label(missing: &[RemoteDistribution]) -> String {
    let mut versions: Vec<&str> = Vec::new();
    for dist in missing {
        let version = dist.version().as_str();
        if !versions.contains(&version) {
            versions.push(version);
        }
    }
    format!(" {} required", versions.join(", "))
}

fn sync_specifier(ctx: &SyncContext, specifier: &ReleaseSpecifier) -> PackageOutcome {
    let _span = debug_span!("package", spec = %specifier).entered();
    ctx.emit(SyncEvent::report(
        format!("Checking required versions for {specifier}..."),
        0,
    ));

    let exclude = ctx.exclude().specs_for(specifier.project_name());
    let missing = match missing_distributions(ctx, specifier, &exclude) {
        Ok(missing) => missing,
        Err(err) => {
            warn!("failed to query repositories for {}: {}", specifier, err);
            ctx.emit(SyncEvent::error(err.to_string()));
            return PackageOutcome::QueryFailed {
                error: err.to_string(),
            };
        }
    };

    if missing.is_empty() {
        debug!("{} is up to date", specifier);
        ctx.emit(SyncEvent::inline(" up to date."));
        return PackageOutcome::UpToDate;
    }

    ctx.emit(SyncEvent::inline(required_label(&missing)));

    let mut synced = Vec::new();
    let mut failed = Vec::new();
    for dist in &missing {
        if ctx.is_interrupted() {
            warn!("interrupted before {}", dist);
            break;
        }

        match sync_artifact(ctx, dist) {
            Ok(info) => synced.push(info),
            Err(err) => {
                warn!("failed to sync {}: {}", dist, err);
                ctx.emit(SyncEvent::error(err.to_string()));
                failed.push(FailedInfo {
                    basename: dist.basename().to_string(),
                    error: err.to_string(),
                });
            }
        }

        cleanup(ctx, dist);
        ctx.emit(SyncEvent::report("--", 1));
    }

    PackageOutcome::Synced { synced, failed }
}

fn stage(ctx: &SyncContext, dist: &RemoteDistribution, stage: ArtifactStage) {
    debug!("{} {}", stage, dist);
    ctx.emit(SyncEvent::artifact(dist.basename(), stage));
}

fn done(ctx: &SyncContext) {
    ctx.emit(SyncEvent::inline(" done."));
}

fn sync_artifact(ctx: &SyncContext, dist: &RemoteDistribution) -> PkgsyncResult<SyncedInfo> {
    let _span = debug_span!("artifact", file = %dist.basename()).entered();
    stage(ctx, dist, ArtifactStage::Fetching);
    let local = dist.download(ctx.tmp_dir())?;
    done(ctx);

    stage(ctx, dist, ArtifactStage::Verifying);
    let metadata = Metadata::from_distribution(&local)?;
    if !metadata.is_structured() {
        debug!("using metadata derived from the file name of {}", dist);
    }
    done(ctx);

    let destination = ctx.destination();

    stage(ctx, dist, ArtifactStage::Registering);
    destination.register(&metadata)?;
    done(ctx);

    stage(ctx, dist, ArtifactStage::Uploading);
    destination.upload(&metadata, &local)?;
    destination.invalidate_package_names();
    done(ctx);

    Ok(SyncedInfo {
        basename: dist.basename().to_string(),
        name: metadata.name().to_string(),
        version: metadata.version().to_string(),
    })
}

fn cleanup(ctx: &SyncContext, dist: &RemoteDistribution) {
    stage(ctx, dist, ArtifactStage::Cleaning);
    let path = ctx.tmp_dir().join(dist.basename());
    match safe_remove(&path) {
        Ok(()) => done(ctx),
        Err(err) => {
            let err = PkgsyncError::from(err);
            warn!("failed to clean up {}: {}", path.display(), err);
            ctx.emit(SyncEvent::error(err.to_string()));
        }
    }
}
