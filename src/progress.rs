use crate::poller::ProgressView;
use crate::stage::{StageBoard, StageRow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Draws a job status line plus one stage row per tracked file.
pub struct TerminalView {
    status_pb: ProgressBar,
    rows: Vec<ProgressBar>,
    name_width: usize,
}

impl TerminalView {
    pub fn new(job_id: &str, file_names: &[String]) -> Self {
        let mp = MultiProgress::new();
        let style = ProgressStyle::default_bar()
            .template("{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let status_pb = mp.add(ProgressBar::new_spinner());
        status_pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        status_pb.set_message(format!("Job {} Queued", job_id));
        status_pb.enable_steady_tick(std::time::Duration::from_millis(120));

        let name_width = file_names.iter().map(|n| n.chars().count()).max().unwrap_or(0);

        let rows = file_names
            .iter()
            .map(|name| {
                let pb = mp.add(ProgressBar::new(1));
                pb.set_style(style.clone());
                pb.set_message(format!(
                    "{:width$}  {}",
                    name,
                    StageRow::new(name.as_str()).render(),
                    width = name_width
                ));
                pb
            })
            .collect();

        Self {
            status_pb,
            rows,
            name_width,
        }
    }

    /// Leaves the rows on screen and stops the spinner.
    pub fn finish(&self) {
        self.status_pb.finish();
        for pb in &self.rows {
            pb.finish();
        }
    }
}

impl ProgressView for TerminalView {
    fn status_changed(&mut self, status: &str) {
        self.status_pb.set_message(format!("Status: {}", status));
    }

    fn stage_changed(&mut self, board: &StageBoard) {
        for (pb, row) in self.rows.iter().zip(board.rows()) {
            pb.set_message(format!(
                "{:width$}  {}",
                row.name,
                row.render(),
                width = self.name_width
            ));
        }
    }
}

impl Drop for TerminalView {
    fn drop(&mut self) {
        self.finish();
    }
}
