//! Run statistics and verbosity-gated progress reporting.

use std::ops::AddAssign;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::output::{display_path, plural, Printer};

/// Templates per progress dot at very low verbosity.
const TEMPLATES_PER_DOT: usize = 10;

/// Dots per line before wrapping.
const DOTS_PER_LINE: usize = 50;

/// How much the reporter prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Progress dots and a one-line summary.
    VeryLow,
    /// One line per template and the summary.
    Low,
    /// Also one line per saved file.
    #[default]
    Normal,
    /// Everything, including extension debug output and timing.
    High,
}

/// Counts produced by rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub templates_processed: usize,
    pub files_saved: usize,
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, other: Self) {
        self.templates_processed += other.templates_processed;
        self.files_saved += other.files_saved;
    }
}

/// Tracks counters and elapsed time for one run and prints progress.
///
/// Purely observational: nothing here influences what gets rendered.
#[derive(Debug)]
pub struct Reporter {
    printer: Printer,
    verbosity: Verbosity,
    started: Instant,
    stats: RunStats,
    dots: usize,
}

impl Reporter {
    pub fn new(printer: Printer, verbosity: Verbosity) -> Self {
        Self {
            printer,
            verbosity,
            started: Instant::now(),
            stats: RunStats::default(),
            dots: 0,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Reset counters and the clock for a new run.
    pub fn start(&mut self) {
        self.started = Instant::now();
        self.stats = RunStats::default();
        self.dots = 0;
    }

    /// Record that a template is about to be rendered.
    pub fn template_started(&mut self, name: &str) {
        self.stats.templates_processed += 1;

        if self.verbosity > Verbosity::VeryLow {
            self.printer.status("Rendering", name);
        } else if self.stats.templates_processed % TEMPLATES_PER_DOT == 0 {
            self.printer.dot();
            self.dots += 1;
            if self.dots % DOTS_PER_LINE == 0 {
                self.printer.end_line();
            }
        }
    }

    /// Record a written output file.
    pub fn file_saved(&mut self, path: &Path) {
        self.stats.files_saved += 1;
        if self.verbosity >= Verbosity::Normal {
            self.printer
                .info("Saved", &self.printer.cyan(&display_path(path)));
        }
    }

    /// Report an output directory created on demand.
    pub fn directory_created(&self, path: &Path) {
        if self.verbosity >= Verbosity::Normal {
            self.printer.warning("Created", &display_path(path));
        }
    }

    /// Debug line, shown only at high verbosity.
    pub fn debug(&self, message: &str) {
        if self.verbosity >= Verbosity::High {
            self.printer.info("Debug", &self.printer.dim(message));
        }
    }

    /// Error line, always shown.
    pub fn error(&self, message: &str) {
        self.printer.error("Error", message);
    }

    /// Plain informational line at normal verbosity.
    pub fn note(&self, verb: &str, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            self.printer.info(verb, message);
        }
    }

    /// Pass through a command's standard output at normal verbosity.
    pub fn command_output(&self, text: &str) {
        if self.verbosity >= Verbosity::Normal && !text.is_empty() {
            print!("{}", text);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Print the summary line (and timing at high verbosity).
    pub fn finish(&mut self) {
        if self.dots % DOTS_PER_LINE != 0 {
            self.printer.end_line();
        }

        let elapsed = self.elapsed();
        self.printer
            .success("Finished", &summary(self.verbosity, self.stats, elapsed));

        if self.verbosity >= Verbosity::High {
            if let Some(avg) = average(elapsed, self.stats.templates_processed) {
                self.printer
                    .info("Timing", &format!("{:.1} ms per template", avg));
            }
            if let Some(avg) = average(elapsed, self.stats.files_saved) {
                self.printer.info("Timing", &format!("{:.1} ms per file", avg));
            }
        }
    }
}

/// `3 => 4 in 0.12s` at very low verbosity, spelled out otherwise.
fn summary(verbosity: Verbosity, stats: RunStats, elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if verbosity == Verbosity::VeryLow {
        format!(
            "{} => {} in {:.2}s",
            stats.templates_processed, stats.files_saved, seconds
        )
    } else {
        format!(
            "{}, {} in {:.2}s",
            plural(stats.templates_processed, "template", "templates"),
            plural(stats.files_saved, "file", "files"),
            seconds
        )
    }
}

/// Average milliseconds per item, `None` for zero items.
fn average(elapsed: Duration, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(elapsed.as_secs_f64() * 1000.0 / count as f64)
    }
}
