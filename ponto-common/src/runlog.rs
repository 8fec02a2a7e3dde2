//! The run's narrative: an append-only sequence of timestamped entries.

use chrono::Local;

/// Ordered log of what a single run did, returned to the caller as the run's
/// result. Entries are stamped when appended and never reordered or edited.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry, stamped with the local wall-clock time.
    pub fn push(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let stamp = Local::now().format("%d/%m/%Y %H:%M:%S");
        tracing::info!(target: "checkin.runlog", "{message}");
        self.entries.push(format!("[{stamp}] {message}"));
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The caller-facing form: every entry, oldest first, newline-joined.
    pub fn join(&self) -> String {
        self.entries.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_append_order() {
        let mut log = RunLog::new();
        log.push("first");
        log.push("second");
        log.push("third");

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].ends_with("first"));
        assert!(entries[1].ends_with("second"));
        assert!(entries[2].ends_with("third"));
    }

    #[test]
    fn entries_are_timestamped() {
        let mut log = RunLog::new();
        log.push("hello");

        let entry = &log.entries()[0];
        // "[dd/mm/yyyy hh:mm:ss] hello"
        assert!(entry.starts_with('['));
        assert_eq!(entry.find(']'), Some(20));
        assert!(entry.ends_with("] hello"));
    }

    #[test]
    fn join_is_newline_separated() {
        let mut log = RunLog::new();
        log.push("a");
        log.push("b");

        let joined = log.join();
        assert_eq!(joined.lines().count(), 2);
        assert!(joined.lines().next().unwrap().ends_with("a"));
    }

    #[test]
    fn empty_log_joins_to_empty_string() {
        assert_eq!(RunLog::new().join(), "");
    }
}
