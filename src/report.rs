use crate::models::{HistoryEntry, JobResultFile, JobSummary};
use indicatif::{HumanBytes, HumanDuration};
use std::fmt::Write;
use std::time::Duration;

/// How many history entries are shown.
pub const HISTORY_LIMIT: usize = 10;

/// Original names of the files the worker reported as failed.
pub fn failed_files(files: &[JobResultFile]) -> Vec<String> {
    files
        .iter()
        .filter(|f| f.is_failed())
        .map(|f| f.original.clone())
        .collect()
}

pub fn render_results(files: &[JobResultFile], summary: Option<&JobSummary>) -> String {
    let mut out = String::new();

    for file in files {
        let mark = if file.is_failed() { '✖' } else { '✔' };
        let name = if file.final_name.is_empty() {
            &file.original
        } else {
            &file.final_name
        };
        let _ = write!(out, "{} {}", mark, name);
        if let Some(size) = file.size {
            let _ = write!(out, " ({})", HumanBytes(size));
        }
        let _ = writeln!(out, " - {}", file.status);

        if !file.folder.is_empty() {
            let _ = writeln!(out, "    folder:   {}", file.folder);
        }
        if let Some(link) = file.download.as_deref().filter(|l| !l.is_empty()) {
            let _ = writeln!(out, "    download: {}", link);
        }
        if !file.notes.is_empty() {
            let _ = writeln!(out, "    notes:    {}", file.notes);
        }
    }

    let failed = files.iter().filter(|f| f.is_failed()).count();
    let _ = writeln!(out, "\nDone: {} success, {} failed", files.len() - failed, failed);

    if let Some(summary) = summary {
        if let Some(bytes) = summary.total_bytes {
            let _ = writeln!(out, "Total size: {}", HumanBytes(bytes));
        }
        if let Some(elapsed) = summary
            .duration_seconds
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        {
            let _ = writeln!(out, "Total time: {}", HumanDuration(elapsed));
        }
    }

    out
}

pub fn render_history(entries: &[HistoryEntry]) -> String {
    let mut out = String::new();
    for entry in entries.iter().take(HISTORY_LIMIT) {
        let _ = writeln!(out, "{}", entry.job_id);
        let _ = writeln!(
            out,
            "    {} - {}  (run {})",
            entry.status,
            entry.time_label(),
            entry.run_id
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(original: &str, status: &str) -> JobResultFile {
        JobResultFile {
            original: original.into(),
            final_name: original.into(),
            status: status.into(),
            ..JobResultFile::default()
        }
    }

    #[test]
    fn failed_files_selects_by_status_text() {
        let files = vec![
            file("a.iso", "uploaded"),
            file("b.iso", "Download failed: 404"),
            file("c.iso", "checksum error"),
        ];
        assert_eq!(failed_files(&files), vec!["b.iso", "c.iso"]);
    }

    #[test]
    fn results_list_files_and_totals() {
        let mut ok = file("a.iso", "uploaded");
        ok.size = Some(2048);
        ok.download = Some("https://mirror.example/a.iso".into());
        ok.folder = "os".into();
        let files = vec![ok, file("b.iso", "failed")];
        let summary = JobSummary {
            total_bytes: Some(2048),
            duration_seconds: Some(3.0),
        };

        let text = render_results(&files, Some(&summary));
        assert!(text.contains("✔ a.iso (2.00 KiB) - uploaded"));
        assert!(text.contains("download: https://mirror.example/a.iso"));
        assert!(text.contains("folder:   os"));
        assert!(text.contains("✖ b.iso - failed"));
        assert!(text.contains("Done: 1 success, 1 failed"));
        assert!(text.contains("Total size: 2.00 KiB"));
        assert!(text.contains("Total time:"));
    }

    #[test]
    fn unrepresentable_duration_is_left_out() {
        for secs in [1e30, -1.0, f64::NAN] {
            let summary = JobSummary {
                duration_seconds: Some(secs),
                ..JobSummary::default()
            };
            let text = render_results(&[], Some(&summary));
            assert!(!text.contains("Total time"), "{secs} rendered a time");
        }
    }

    #[test]
    fn history_is_capped() {
        let entries: Vec<HistoryEntry> = (0..15)
            .map(|i| HistoryEntry {
                job_id: format!("job-{}", i),
                status: "completed".into(),
                ..HistoryEntry::default()
            })
            .collect();
        let text = render_history(&entries);
        assert!(text.contains("job-9\n"));
        assert!(!text.contains("job-10"));
    }
}
