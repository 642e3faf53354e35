//! Stage progress tracking.
//!
//! The worker reports the stage of a run as free text on every poll. Those
//! reports may repeat or arrive stale, so the tracker only ever moves forward
//! and every tracked file row is derived from the furthest stage seen.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Validating,
    Downloading,
    Uploading,
    Verifying,
    Finished,
}

pub const COMPLETED_COLOR: &str = "#34d399";
pub const PENDING_COLOR: &str = "#a1a1aa";

impl Stage {
    /// Every stage in progress order; a stage's position is its index.
    pub const ALL: [Stage; 5] = [
        Stage::Validating,
        Stage::Downloading,
        Stage::Uploading,
        Stage::Verifying,
        Stage::Finished,
    ];

    /// Maps a reported stage name, ignoring case and surrounding whitespace.
    pub fn parse(name: &str) -> Option<Stage> {
        match name.trim().to_lowercase().as_str() {
            "validating" => Some(Stage::Validating),
            "downloading" => Some(Stage::Downloading),
            "uploading" => Some(Stage::Uploading),
            "verifying" => Some(Stage::Verifying),
            "finished" => Some(Stage::Finished),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Validating => "Validating",
            Stage::Downloading => "Downloading",
            Stage::Uploading => "Uploading to Mirror",
            Stage::Verifying => "Verifying",
            Stage::Finished => "Finished",
        }
    }

    pub fn active_color(self) -> &'static str {
        match self {
            Stage::Validating => "#facc15",
            Stage::Downloading => "#60a5fa",
            Stage::Uploading => "#c084fc",
            Stage::Verifying => "#fb923c",
            Stage::Finished => "#34d399",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Completed,
    Active,
    Pending,
}

impl SlotState {
    pub fn glyph(self) -> char {
        match self {
            SlotState::Completed => '✔',
            SlotState::Active => '●',
            SlotState::Pending => '○',
        }
    }
}

/// Furthest stage reached by one job session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTracker {
    last: Option<Stage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets progress; called whenever a new session starts.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn current(&self) -> Option<Stage> {
        self.last
    }

    /// Index of the furthest stage, or -1 before any stage was seen.
    pub fn last_stage_index(&self) -> i32 {
        self.last.map_or(-1, |stage| stage.index() as i32)
    }

    /// Applies a reported stage name. Returns the stage when it was applied;
    /// unknown names and stages behind the current one return `None`. The
    /// current stage itself is applied again.
    pub fn on_stage_notification(&mut self, name: &str) -> Option<Stage> {
        let Some(stage) = Stage::parse(name) else {
            log::debug!("Ignoring unknown stage {:?}", name);
            return None;
        };

        if let Some(last) = self.last {
            if stage < last {
                log::debug!("Discarding stale stage {} (already at {})", stage, last);
                return None;
            }
        }

        self.last = Some(stage);
        Some(stage)
    }

    pub fn classify(&self, slot: Stage) -> SlotState {
        match self.last {
            Some(current) if slot < current => SlotState::Completed,
            Some(current) if slot == current => SlotState::Active,
            _ => SlotState::Pending,
        }
    }

    /// Colour a slot is drawn in.
    pub fn color(&self, slot: Stage) -> &'static str {
        match self.classify(slot) {
            SlotState::Completed => COMPLETED_COLOR,
            SlotState::Active => slot.active_color(),
            SlotState::Pending => PENDING_COLOR,
        }
    }
}

/// Stage slots of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRow {
    pub name: String,
    pub slots: [SlotState; 5],
}

impl StageRow {
    /// A row before any stage was reported shows validation under way.
    pub fn new(name: impl Into<String>) -> Self {
        let mut slots = [SlotState::Pending; 5];
        slots[Stage::Validating.index()] = SlotState::Active;
        Self {
            name: name.into(),
            slots,
        }
    }

    pub fn render(&self) -> String {
        Stage::ALL
            .iter()
            .zip(self.slots.iter())
            .map(|(stage, slot)| format!("{} {}", slot.glyph(), stage.label()))
            .collect::<Vec<_>>()
            .join("  ")
    }
}

/// A tracker together with every file row it drives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageBoard {
    tracker: StageTracker,
    rows: Vec<StageRow>,
}

impl StageBoard {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tracker: StageTracker::new(),
            rows: names.into_iter().map(StageRow::new).collect(),
        }
    }

    /// Starts a new session with a fresh set of rows.
    pub fn reset<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self = Self::new(names);
    }

    pub fn tracker(&self) -> &StageTracker {
        &self.tracker
    }

    pub fn rows(&self) -> &[StageRow] {
        &self.rows
    }

    /// Feeds a reported stage to the tracker and redraws every row when it
    /// was applied.
    pub fn on_stage_notification(&mut self, name: &str) -> Option<Stage> {
        let applied = self.tracker.on_stage_notification(name)?;
        log::debug!("Stage now {}", applied);

        let slots = Stage::ALL.map(|slot| self.tracker.classify(slot));
        for row in &mut self.rows {
            row.slots = slots;
        }
        Some(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        assert_eq!(Stage::parse("  Downloading \n"), Some(Stage::Downloading));
        assert_eq!(Stage::parse("FINISHED"), Some(Stage::Finished));
        assert_eq!(Stage::parse("teleporting"), None);
    }

    #[test]
    fn indices_follow_table_order() {
        for (idx, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), idx);
        }
    }

    #[test]
    fn fresh_tracker_is_before_first_stage() {
        let tracker = StageTracker::new();
        assert_eq!(tracker.last_stage_index(), -1);
        assert!(Stage::ALL.iter().all(|s| tracker.classify(*s) == SlotState::Pending));
    }

    #[test]
    fn stale_stage_does_not_regress() {
        let mut tracker = StageTracker::new();
        assert_eq!(tracker.on_stage_notification("uploading"), Some(Stage::Uploading));
        assert_eq!(tracker.on_stage_notification("downloading"), None);
        assert_eq!(tracker.last_stage_index(), 2);
        assert_eq!(tracker.classify(Stage::Downloading), SlotState::Completed);
        assert_eq!(tracker.classify(Stage::Uploading), SlotState::Active);
        assert_eq!(tracker.classify(Stage::Verifying), SlotState::Pending);
    }

    #[test]
    fn repeated_stage_is_reapplied() {
        let mut once = StageBoard::new(["a.iso"]);
        once.on_stage_notification("downloading");

        let mut twice = StageBoard::new(["a.iso"]);
        twice.on_stage_notification("downloading");
        assert_eq!(twice.on_stage_notification("Downloading"), Some(Stage::Downloading));

        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_stage_changes_nothing() {
        let mut board = StageBoard::new(["a", "b"]);
        board.on_stage_notification("verifying");
        let before = board.clone();

        assert_eq!(board.on_stage_notification("teleporting"), None);
        assert_eq!(board, before);
        assert_eq!(board.tracker().last_stage_index(), 3);
    }

    #[test]
    fn every_row_follows_the_stage() {
        let mut board = StageBoard::new(["a", "b", "c"]);
        board.on_stage_notification("uploading");

        let expected = [
            SlotState::Completed,
            SlotState::Completed,
            SlotState::Active,
            SlotState::Pending,
            SlotState::Pending,
        ];
        assert!(board.rows().iter().all(|row| row.slots == expected));
        assert_eq!(
            board.rows()[0].render(),
            "✔ Validating  ✔ Downloading  ● Uploading to Mirror  ○ Verifying  ○ Finished"
        );
    }

    #[test]
    fn new_rows_show_validation_under_way() {
        let board = StageBoard::new(["a.iso"]);
        assert_eq!(board.tracker().last_stage_index(), -1);
        assert_eq!(
            board.rows()[0].render(),
            "● Validating  ○ Downloading  ○ Uploading to Mirror  ○ Verifying  ○ Finished"
        );
    }

    #[test]
    fn colors_follow_slot_state() {
        let mut tracker = StageTracker::new();
        tracker.on_stage_notification("downloading");
        assert_eq!(tracker.color(Stage::Validating), COMPLETED_COLOR);
        assert_eq!(tracker.color(Stage::Downloading), "#60a5fa");
        assert_eq!(tracker.color(Stage::Finished), PENDING_COLOR);
    }

    #[test]
    fn reset_starts_a_new_session() {
        let mut board = StageBoard::new(["a"]);
        board.on_stage_notification("finished");
        board.reset(["b", "c"]);

        assert_eq!(board.tracker().last_stage_index(), -1);
        assert_eq!(board.rows().len(), 2);
        assert_eq!(board.on_stage_notification("validating"), Some(Stage::Validating));
    }
}
