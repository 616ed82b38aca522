mod event;
mod sink;

use std::sync::Arc;

pub use event::*;
pub use sink::*;

/// Shared handle to an event sink.
pub type EventSinkHandle = Arc<dyn EventSink>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sink() {
        let sink = NullSink;
        sink.report("pkgsync==0.1.0", 0);
        sink.error("ignored");
    }

    #[test]
    fn test_channel_sink() {
        let (sink, rx) = ChannelSink::new();
        sink.report("pkgsync==0.1.0", 0);
        sink.inline(" up to date");
        sink.emit(SyncEvent::artifact(
            "pkgsync-0.1.0.tar.gz",
            ArtifactStage::Fetching,
        ));
        sink.error("boom");

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                SyncEvent::report("pkgsync==0.1.0", 0),
                SyncEvent::inline(" up to date"),
                SyncEvent::artifact("pkgsync-0.1.0.tar.gz", ArtifactStage::Fetching),
                SyncEvent::error("boom"),
            ]
        );
    }

    #[test]
    fn test_channel_sink_receiver_dropped() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.report("orphaned", 1);
    }

    #[test]
    fn test_collector_sink() {
        let sink = CollectorSink::default();
        assert!(sink.is_empty());

        sink.report("pkgsync>=0.0.0", 0);
        sink.report("0.0.1", 1);
        sink.emit(SyncEvent::artifact("pkgsync-0.0.1.tar.gz", ArtifactStage::Uploading));
        sink.error("Digest mismatch");

        assert_eq!(sink.len(), 4);
        assert_eq!(sink.messages(), vec!["pkgsync>=0.0.0", "0.0.1"]);
        assert_eq!(sink.errors(), vec!["Digest mismatch"]);
        assert!(matches!(
            &sink.events()[1],
            SyncEvent::Report { level: 1, .. }
        ));
    }

    #[test]
    fn test_event_sink_handle() {
        let collector = Arc::new(CollectorSink::default());
        let sink: EventSinkHandle = collector.clone();
        sink.inline("done");
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_event_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullSink>();
        assert_send_sync::<ChannelSink>();
        assert_send_sync::<CollectorSink>();
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ArtifactStage::Cleaning.to_string(), "cleaning up");
        assert_eq!(ArtifactStage::Registering.to_string(), "registering");
    }
}
