//! Renders [`SyncEvent`]s as the indented status lines users see.

use std::{
    io::{self, Write},
    sync::{mpsc::Receiver, Mutex, PoisonError},
    thread::JoinHandle,
};

use nu_ansi_term::Color::{Cyan, Green, Red};
use pkgsync_events::SyncEvent;

use crate::utils::Colored;

const LEVEL_SYMBOL: &str = "  ";

/// Whether stdout currently ends in the middle of a status line.
static LINE_OPEN: Mutex<bool> = Mutex::new(false);

/// Ends any open status line, then runs `f` with the output to itself.
pub fn suspend<F: FnOnce()>(f: F) {
    let mut open = LINE_OPEN.lock().unwrap_or_else(PoisonError::into_inner);
    if *open {
        println!();
        *open = false;
    }
    f();
}

/// Handle returned by [`spawn_event_handler`] that owns the rendering thread.
///
/// The context holding the channel sender must be dropped before
/// [`finish`](ReporterGuard::finish), otherwise the thread waits for more events forever.
pub struct ReporterGuard {
    handle: Option<JoinHandle<()>>,
}

impl ReporterGuard {
    /// Waits for the remaining events to be rendered and terminates the last line.
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
        suspend(|| {});
    }
}

/// Spawns a background thread printing every event received on `receiver`.
pub fn spawn_event_handler(receiver: Receiver<SyncEvent>) -> ReporterGuard {
    let handle = std::thread::spawn(move || {
        for event in receiver {
            let mut open = LINE_OPEN.lock().unwrap_or_else(PoisonError::into_inner);
            let stdout = io::stdout();
            let stderr = io::stderr();
            render(&mut stdout.lock(), &mut stderr.lock(), &mut open, event).ok();
        }
    });

    ReporterGuard {
        handle: Some(handle),
    }
}

fn start_line<W: Write>(out: &mut W, open: &mut bool) -> io::Result<()> {
    if *open {
        writeln!(out)?;
        *open = false;
    }
    Ok(())
}

/// Writes one event. Reports start a new line, inline messages continue the current one
/// and errors get a line of their own on `err`.
pub fn render<W: Write, E: Write>(
    out: &mut W,
    err: &mut E,
    open: &mut bool,
    event: SyncEvent,
) -> io::Result<()> {
    match event {
        SyncEvent::Report { message, level } => {
            start_line(out, open)?;
            write!(out, "{}{message}", LEVEL_SYMBOL.repeat(level))?;
            *open = true;
        }
        SyncEvent::Inline { message } => {
            if message.trim() == "done." || message.trim() == "up to date." {
                write!(out, "{}", Colored(Green, message))?;
            } else {
                write!(out, "{message}")?;
            }
            *open = true;
        }
        SyncEvent::Error { message } => {
            start_line(out, open)?;
            out.flush()?;
            writeln!(err, "{} {message}", Colored(Red, "ERROR:"))?;
            err.flush()?;
        }
        SyncEvent::Artifact { basename, stage } => {
            start_line(out, open)?;
            write!(out, "{LEVEL_SYMBOL}{stage} {}...", Colored(Cyan, basename))?;
            *open = true;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use pkgsync_events::ArtifactStage;

    use super::*;

    fn rendered(events: Vec<SyncEvent>) -> (String, String) {
        crate::utils::set_color(false);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut open = false;
        for event in events {
            render(&mut out, &mut err, &mut open, event).unwrap();
        }
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_render_up_to_date() {
        let (out, err) = rendered(vec![
            SyncEvent::report("Checking required versions for foo...", 0),
            SyncEvent::inline(" up to date."),
            SyncEvent::report("Checking required versions for bar...", 0),
        ]);
        assert_eq!(
            out,
            "Checking required versions for foo... up to date.\nChecking required versions for bar..."
        );
        assert!(err.is_empty());
    }

    #[test]
    fn test_render_artifact_stages() {
        let (out, _) = rendered(vec![
            SyncEvent::artifact("foo-1.0.tar.gz", ArtifactStage::Fetching),
            SyncEvent::inline(" done."),
            SyncEvent::artifact("foo-1.0.tar.gz", ArtifactStage::Cleaning),
            SyncEvent::inline(" done."),
            SyncEvent::report("--", 1),
        ]);
        assert_eq!(
            out,
            "  fetching foo-1.0.tar.gz... done.\n  cleaning up foo-1.0.tar.gz... done.\n  --"
        );
    }

    #[test]
    fn test_render_error_on_own_line() {
        let (out, err) = rendered(vec![
            SyncEvent::artifact("foo-1.0.tar.gz", ArtifactStage::Uploading),
            SyncEvent::error("Authentication failed"),
        ]);
        assert_eq!(out, "  uploading foo-1.0.tar.gz...\n");
        assert_eq!(err, "ERROR: Authentication failed\n");
    }
}
