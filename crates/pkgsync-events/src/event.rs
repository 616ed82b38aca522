use std::fmt;

/// Step of the per-artifact pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStage {
    Fetching,
    Verifying,
    Registering,
    Uploading,
    Cleaning,
}

impl fmt::Display for ArtifactStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactStage::Fetching => "fetching",
            ArtifactStage::Verifying => "verifying",
            ArtifactStage::Registering => "registering",
            ArtifactStage::Uploading => "uploading",
            ArtifactStage::Cleaning => "cleaning up",
        };
        f.write_str(s)
    }
}

/// Everything a sync run tells its reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A line of output, indented by `level`.
    Report { message: String, level: usize },
    /// Text continuing the current line.
    Inline { message: String },
    /// A failure that did not stop the run.
    Error { message: String },
    /// An artifact entered a new pipeline step.
    Artifact {
        basename: String,
        stage: ArtifactStage,
    },
}

impl SyncEvent {
    pub fn report(message: impl Into<String>, level: usize) -> Self {
        SyncEvent::Report {
            message: message.into(),
            level,
        }
    }

    pub fn inline(message: impl Into<String>) -> Self {
        SyncEvent::Inline {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        SyncEvent::Error {
            message: message.into(),
        }
    }

    pub fn artifact(basename: impl Into<String>, stage: ArtifactStage) -> Self {
        SyncEvent::Artifact {
            basename: basename.into(),
            stage,
        }
    }
}
