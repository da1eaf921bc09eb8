//! Formatting utilities for sizes, durations, and build summaries.

use console::Term;
use kiln_pipeline::{BuildOutcome, BuildResult, Error};
use owo_colors::OwoColorize;
use std::time::Duration;

use super::colors_enabled;

/// Format file size in human-readable format.
///
/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format duration in human-readable format.
///
/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print the assets of a finished build with their sizes.
pub fn print_build_summary(result: &BuildResult) {
    let width = (Term::stderr().size().1 as usize).clamp(20, 80);
    let rule = "─".repeat(width);
    let title = format!("Build Summary ({})", result.mode);

    if colors_enabled() {
        eprintln!("\n{}", title.bold().underline());
    } else {
        eprintln!("\n{title}");
    }
    eprintln!("{rule}");

    for asset in &result.assets {
        let size = format_size(asset.size() as u64);
        let kind = format!("[{}]", kind_label(asset.kind));
        if colors_enabled() {
            eprintln!(
                "  {} {} {} {}",
                "▸".blue(),
                asset.filename.bright_white().bold(),
                size.dimmed(),
                kind.dimmed()
            );
        } else {
            eprintln!("  ▸ {} {} {}", asset.filename, size, kind);
        }
    }
    if result.assets.is_empty() {
        eprintln!("  (no assets)");
    }

    eprintln!("{rule}");

    let total = format_size(result.total_size() as u64);
    let elapsed = format_duration(result.duration);
    let status = result.outcome.as_str();
    if colors_enabled() {
        let status = match result.outcome {
            BuildOutcome::Success => status.green().to_string(),
            BuildOutcome::Partial => status.yellow().to_string(),
            BuildOutcome::Failed => status.red().to_string(),
        };
        eprintln!(
            "  {} {} in {} ({}, {} entries)",
            "Total:".bold(),
            total.green(),
            elapsed.green(),
            status,
            result.manifest.len()
        );
    } else {
        eprintln!(
            "  Total: {} in {} ({}, {} entries)",
            total,
            elapsed,
            status,
            result.manifest.len()
        );
    }
    if result.written {
        eprintln!("  Written to {}", result.output_dir.display());
    }
}

/// Print per-file errors in manifest order.
pub fn print_build_errors(errors: &[Error]) {
    for err in errors {
        super::error(&err.to_string());
    }
}

fn kind_label(kind: kiln_pipeline::AssetKind) -> &'static str {
    match kind {
        kiln_pipeline::AssetKind::Script => "script",
        kiln_pipeline::AssetKind::Stylesheet => "stylesheet",
        kiln_pipeline::AssetKind::Static => "static",
    }
}
