use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Byte-based progress bar. The length is set once the input size is known;
/// without it the bar stays a spinner.
pub fn create_progress_bar(multi: &MultiProgress, label: &str) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::no_length());
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} {prefix} {bar:40.cyan/blue} {bytes}/{total_bytes} ({binary_bytes_per_sec})\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
    )?);
    pb.set_prefix(label.to_string());
    pb.set_message("initializing decoder");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}
