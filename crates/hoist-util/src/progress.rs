//! Cargo-style status lines and the upload progress bar, all on stderr.

use std::io::Write;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

fn status_line(style: Style, label: &str, message: &str) {
    let mut err = std::io::stderr().lock();
    let _ = writeln!(err, "{:>12} {message}", style.bold().apply_to(label));
}

/// `   Uploaded org/ow2/asm/asm/9.9/asm-9.9.jar`, label in green.
pub fn status(label: &str, message: &str) {
    status_line(Style::new().green(), label, message);
}

/// Informational line (cyan label) for things that were checked, not done.
pub fn status_info(label: &str, message: &str) {
    status_line(Style::new().cyan(), label, message);
}

pub fn status_warn(label: &str, message: &str) {
    status_line(Style::new().yellow(), label, message);
}

pub fn status_error(label: &str, message: &str) {
    status_line(Style::new().red(), label, message);
}

/// Bar counting finished files. Hidden automatically when stderr is not a
/// terminal.
pub fn progress_bar(files: u64, message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("{msg:>12.green.bold} [{bar:30.cyan/blue}] {pos}/{len} files")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    let pb = ProgressBar::new(files);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}
