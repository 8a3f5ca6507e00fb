use framevault::observability::{IngestMetrics, MetricsSnapshot};
use std::sync::Arc;

#[test]
fn test_metrics_start_at_zero() {
    let metrics = IngestMetrics::new("cam");
    let snapshot = metrics.snapshot();

    assert_eq!(metrics.stream_name(), "cam");
    assert_eq!(
        snapshot,
        MetricsSnapshot {
            stream_name: "cam".to_string(),
            ..Default::default()
        }
    );
}

#[test]
fn test_metrics_shared_across_threads() {
    let metrics = Arc::new(IngestMetrics::new("cam"));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let metrics = metrics.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    metrics.record_received();
                    metrics.record_archived();
                }
                metrics.record_archive_drop();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.frames_received, 400);
    assert_eq!(snapshot.frames_archived, 400);
    assert_eq!(snapshot.archive_drops, 4);
}

#[test]
fn test_snapshot_serializes() {
    let metrics = IngestMetrics::new("cam");
    metrics.record_segment_created();
    metrics.record_write_error();

    let json = serde_json::to_value(metrics.snapshot()).unwrap();
    assert_eq!(json["segments_created"], 1);
    assert_eq!(json["entry_write_errors"], 1);
    assert!(metrics.snapshot().report().contains("1 write error\n"));
}
