use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Yellow braille spinner next to the current message.
fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.yellow} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
}

/// Spinner on stderr while requests are in flight. Hidden when stderr is not
/// a terminal, so piped output stays clean.
pub fn fetching(what: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(format!("fetching {what}…"));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
