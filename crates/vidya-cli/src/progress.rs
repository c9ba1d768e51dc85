use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;
use vidya_store::{IndexPhase, IndexProgress};

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a progress bar for determinate progress
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(bar_style());
    pb.set_message(message.to_string());
    pb
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ")
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Progress tracker for index startup: scan, embed, save
pub struct BuildProgress {
    multi: MultiProgress,
    scan: ProgressBar,
    embeddings: Option<ProgressBar>,
    save: Option<ProgressBar>,
    hidden: bool,
}

impl BuildProgress {
    pub fn new() -> Self {
        Self::with_visibility(false)
    }

    /// A tracker that draws nothing, for JSON output
    pub fn hidden() -> Self {
        Self::with_visibility(true)
    }

    fn with_visibility(hidden: bool) -> Self {
        // Replaced by a live spinner once scanning starts
        let scan = ProgressBar::hidden();

        Self { multi: MultiProgress::new(), scan, embeddings: None, save: None, hidden }
    }

    fn add(&self, pb: ProgressBar) -> ProgressBar {
        if self.hidden {
            ProgressBar::hidden()
        } else {
            self.multi.add(pb)
        }
    }

    /// Feed one progress event from the index builder
    pub fn update(&mut self, event: IndexProgress) {
        match event.phase {
            IndexPhase::Scanning => {
                if !self.hidden {
                    self.scan = self.multi.add(create_spinner(&event.message));
                }
            }
            IndexPhase::GeneratingEmbeddings => {
                if self.embeddings.is_none() {
                    finish_success(&self.scan, "Scanned source directory");
                    let pb = self.add(create_progress_bar(event.total as u64, "Generating embeddings"));
                    self.embeddings = Some(pb);
                }
                if let Some(pb) = &self.embeddings {
                    pb.set_length(event.total as u64);
                    pb.set_position(event.current as u64);
                }
            }
            IndexPhase::Saving => {
                if let Some(pb) = &self.embeddings {
                    finish_success(pb, &format!("Generated {} embeddings", pb.length().unwrap_or(0)));
                }
                self.save = Some(self.add(create_spinner(&event.message)));
            }
        }
    }

    /// Mark whatever is still running as done
    pub fn finish(&self, succeeded: bool) {
        let finish = |pb: &ProgressBar, ok: &str, failed: &str| {
            if succeeded {
                finish_success(pb, ok)
            } else {
                finish_error(pb, failed)
            }
        };

        if let Some(save) = &self.save {
            finish(save, "Index saved", "Saving failed");
        } else if let Some(pb) = &self.embeddings {
            if !pb.is_finished() {
                finish(pb, "Embeddings generated", "Embedding failed");
            }
        } else if !self.scan.is_finished() {
            self.scan.finish_and_clear();
        }
    }
}
