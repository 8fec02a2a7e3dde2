//! Markdown run summaries for CI job pages.
//!
//! When `GITHUB_STEP_SUMMARY` names a file (the cron job sets it), a short
//! section is appended there after every run. Absent variable, no-op;
//! write failures are logged and otherwise ignored.

use std::io::Write;

use chrono::Local;
use tracing::warn;

pub fn write_success(log: &str) {
    let stamp = Local::now().format("%d/%m/%Y %H:%M:%S");
    append(&format!(
        "### ✅ Check-in recorded\n- Time: {stamp}\n\n<details><summary>Run log</summary>\n\n```\n{log}\n```\n\n</details>\n"
    ));
}

pub fn write_failure(error: &str) {
    let stamp = Local::now().format("%d/%m/%Y %H:%M:%S");
    append(&format!(
        "### ❌ Check-in failed\n- Time: {stamp}\n- Error: `{error}`\n"
    ));
}

fn append(markdown: &str) {
    let Ok(path) = std::env::var("GITHUB_STEP_SUMMARY") else {
        return;
    };
    if path.trim().is_empty() {
        return;
    }

    let result = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut file| writeln!(file, "{markdown}"));

    if let Err(err) = result {
        warn!(%path, error = %err, "run summary not written");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn appends_sections_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("summary.md");

        temp_env::with_var("GITHUB_STEP_SUMMARY", Some(path.to_str().unwrap()), || {
            write_success("line one\nline two");
            write_failure("boom");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let success = content.find("✅ Check-in recorded").expect("success section");
        let failure = content.find("❌ Check-in failed").expect("failure section");
        assert!(success < failure);
        assert!(content.contains("line two"));
        assert!(content.contains("`boom`"));
    }

    #[test]
    #[serial]
    fn without_the_variable_nothing_is_written() {
        temp_env::with_var("GITHUB_STEP_SUMMARY", None::<&str>, || {
            // must simply not panic
            write_success("ignored");
            write_failure("ignored");
        });
    }

    #[test]
    #[serial]
    fn unwritable_summary_path_is_swallowed() {
        let tmp = TempDir::new().unwrap();
        let dir_as_file = tmp.path().to_str().unwrap().to_string();

        // the path is a directory; the open fails and is only logged
        temp_env::with_var("GITHUB_STEP_SUMMARY", Some(dir_as_file), || {
            write_failure("ignored");
        });
    }
}
