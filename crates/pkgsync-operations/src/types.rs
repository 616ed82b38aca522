/// What happened to one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// Nothing on the source is missing from the destination.
    UpToDate,
    /// Missing artifacts were processed.
    Synced {
        synced: Vec<SyncedInfo>,
        failed: Vec<FailedInfo>,
    },
    /// One of the repositories could not be queried.
    QueryFailed { error: String },
}

/// Per-specifier entry of a [`SyncReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub specifier: String,
    pub outcome: PackageOutcome,
}

/// An artifact now present on the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedInfo {
    pub basename: String,
    pub name: String,
    pub version: String,
}

/// An artifact that could not be synchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedInfo {
    pub basename: String,
    pub error: String,
}

/// Report returned after a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub packages: Vec<PackageReport>,
    /// Set when the run stopped early on an interruption.
    pub interrupted: bool,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        self.packages.iter().any(|pkg| {
            match &pkg.outcome {
                PackageOutcome::UpToDate => false,
                PackageOutcome::Synced { failed, .. } => !failed.is_empty(),
                PackageOutcome::QueryFailed { .. } => true,
            }
        })
    }

    pub fn synced(&self) -> impl Iterator<Item = &SyncedInfo> {
        self.packages.iter().flat_map(|pkg| {
            match &pkg.outcome {
                PackageOutcome::Synced { synced, .. } => synced.as_slice(),
                _ => &[][..],
            }
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = &FailedInfo> {
        self.packages.iter().flat_map(|pkg| {
            match &pkg.outcome {
                PackageOutcome::Synced { failed, .. } => failed.as_slice(),
                _ => &[][..],
            }
        })
    }

    /// Specifiers whose repositories could not be queried.
    pub fn query_failures(&self) -> usize {
        self.packages
            .iter()
            .filter(|pkg| matches!(pkg.outcome, PackageOutcome::QueryFailed { .. }))
            .count()
    }

    pub fn up_to_date(&self) -> usize {
        self.packages
            .iter()
            .filter(|pkg| pkg.outcome == PackageOutcome::UpToDate)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(specifier: &str, outcome: PackageOutcome) -> PackageReport {
        PackageReport {
            specifier: specifier.into(),
            outcome,
        }
    }

    #[test]
    fn test_has_failures() {
        let mut summary = SyncReport::default();
        summary.packages.push(report("a", PackageOutcome::UpToDate));
        summary.packages.push(report(
            "b==1.0",
            PackageOutcome::Synced {
                synced: vec![SyncedInfo {
                    basename: "b-1.0.tar.gz".into(),
                    name: "b".into(),
                    version: "1.0".into(),
                }],
                failed: vec![],
            },
        ));
        assert!(!summary.has_failures());
        assert_eq!(summary.up_to_date(), 1);
        assert_eq!(summary.synced().count(), 1);

        summary.packages.push(report(
            "c",
            PackageOutcome::QueryFailed {
                error: "HTTP 502".into(),
            },
        ));
        assert!(summary.has_failures());
        assert_eq!(summary.failed().count(), 0);
        assert_eq!(summary.query_failures(), 1);
    }

    #[test]
    fn test_failed_artifacts_count_as_failures() {
        let summary = SyncReport {
            packages: vec![report(
                "d",
                PackageOutcome::Synced {
                    synced: vec![],
                    failed: vec![FailedInfo {
                        basename: "d-2.0.zip".into(),
                        error: "digest mismatch".into(),
                    }],
                },
            )],
            interrupted: false,
        };
        assert!(summary.has_failures());
        assert_eq!(summary.failed().count(), 1);
    }
}
