use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar over `len` items labelled with `message`.
pub(crate) fn progress_bar(len: usize, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>5}/{len:5} ({eta})")
        .map(|style| style.progress_chars("##>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message);
    pb
}
