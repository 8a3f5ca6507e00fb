use super::MetricsSnapshot;

fn plural(count: u64, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}

impl MetricsSnapshot {
    /// Short human-readable summary of a session
    pub fn report(&self) -> String {
        let mut report = format!("=== Stream {} ===\n", self.stream_name);
        report.push_str(&format!(
            "  Received: {}\n  Rejected: {}\n  Live: {} forwarded\n",
            plural(self.frames_received, "frame"),
            plural(self.frames_rejected, "frame"),
            self.frames_forwarded,
        ));
        report.push_str(&format!(
            "  Archive: {} in {}, {} dropped, {}\n",
            plural(self.frames_archived, "frame"),
            plural(self.segments_created, "segment"),
            self.archive_drops,
            plural(self.entry_write_errors, "write error"),
        ));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_pluralisation() {
        let snapshot = MetricsSnapshot {
            stream_name: "cam".to_string(),
            frames_received: 1,
            frames_archived: 1,
            segments_created: 2,
            ..Default::default()
        };
        let report = snapshot.report();
        assert!(report.contains("Received: 1 frame\n"));
        assert!(report.contains("1 frame in 2 segments"));
        assert!(report.contains("0 write errors"));
    }
}
