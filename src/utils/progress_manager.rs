use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const CONTIG_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

/// Owns the progress bars of one run.
pub struct ProgressManager {
    multi: MultiProgress,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    pub fn new() -> Self {
        Self { multi: MultiProgress::new() }
    }

    pub fn add_contig_bar(&self, name: &str, length: usize) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(length as u64));
        let style = ProgressStyle::default_bar()
            .template(CONTIG_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(format!("Processing {}", name));
        pb
    }

    pub fn add_spinner(&self, message: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        let style = ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb
    }
}
