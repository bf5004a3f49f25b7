//! Multi-file stage progress with automatic batching for large sets

use crate::algorithm::Stage;
use crate::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

/// Display state of one file: name, stages started, current stage label
#[derive(Debug, Clone, Default)]
struct FileState {
    name: String,
    position: usize,
    status: String,
}

/// Coordinates progress display for batch operations
///
/// Individual bars show the pipeline stage of the most recent files; past
/// `MAX_INDIVIDUAL_PROGRESS_BARS + 1` files an overall batch bar is added.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    file_bars: Vec<ProgressBar>,
    file_count: usize,
    file_states: Vec<FileState>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{prefix} [{bar:30.cyan/blue}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Files: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            file_bars: Vec::new(),
            file_count: 0,
            file_states: Vec::new(),
        }
    }

    /// Create bars for `file_count` files
    pub fn initialize(&mut self, file_count: usize) {
        self.file_count = file_count;

        if file_count > MAX_INDIVIDUAL_PROGRESS_BARS + 1 {
            let batch_bar = ProgressBar::new(file_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }

        for _ in 0..file_count.min(MAX_INDIVIDUAL_PROGRESS_BARS) {
            let pb = ProgressBar::new(Stage::ALL.len() as u64);
            pb.set_style(STAGE_STYLE.clone());
            self.file_bars.push(self.multi_progress.add(pb));
        }
    }

    /// Number of files announced by [`Self::initialize`]
    pub const fn file_count(&self) -> usize {
        self.file_count
    }

    /// Register a file that is about to be processed
    pub fn start_file(&mut self, index: usize, path: &Path) {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        if index >= self.file_states.len() {
            self.file_states.resize(index + 1, FileState::default());
        }
        if let Some(state) = self.file_states.get_mut(index) {
            *state = FileState {
                name,
                position: 0,
                status: "loading".to_string(),
            };
        }
        self.update_bars();
    }

    /// Report the stage a file has entered
    pub fn update_stage(&mut self, index: usize, stage: Stage) {
        if let Some(state) = self.file_states.get_mut(index) {
            state.position = stage.position();
            state.status = stage.label().to_string();
        }
        self.update_bars();
    }

    /// Mark a file as written
    pub fn complete_file(&mut self, index: usize, elapsed: Duration) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
        if let Some(state) = self.file_states.get_mut(index) {
            state.name = format!("✓ {}", state.name);
            state.position = Stage::ALL.len();
            state.status = format!("done in {:.1}s", elapsed.as_secs_f64());
        }
        self.update_bars();
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All files processed");
        }
        let _ = self.multi_progress.clear();
    }

    // Show the most recent files on the available bars
    fn update_bars(&self) {
        let active: Vec<&FileState> = self
            .file_states
            .iter()
            .filter(|state| !state.name.is_empty())
            .collect();
        let start = active.len().saturating_sub(MAX_INDIVIDUAL_PROGRESS_BARS);
        let visible = active.get(start..).unwrap_or(&[]);

        for (bar_idx, state) in visible.iter().enumerate() {
            if let Some(bar) = self.file_bars.get(bar_idx) {
                bar.set_position(state.position as u64);
                bar.set_prefix(state.name.clone());
                bar.set_message(state.status.clone());
            }
        }

        for bar in self.file_bars.iter().skip(visible.len()) {
            bar.set_position(0);
            bar.set_message(String::new());
            bar.set_prefix(String::new());
        }
    }
}
