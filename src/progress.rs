//! Progress reporting
//!
//! [`ProgressWriter`] emits plain, log-friendly progress lines for the
//! archive download. The indicatif helpers cover the shorter local phases
//! (hashing, unpacking).

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Standard spinner characters
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard tick interval for spinners
const TICK_INTERVAL_MS: u64 = 80;

const KILOBYTE: u64 = 1 << 10;
const MEGABYTE: u64 = 1 << 20;

/// Format a byte count as `B`, `KB` or `MB` with one decimal place,
/// dropping a trailing `.0`.
///
/// ```
/// assert_eq!(godl::progress::fmt_size(1536), "1.5 KB");
/// assert_eq!(godl::progress::fmt_size(1 << 20), "1 MB");
/// ```
pub fn fmt_size(size: u64) -> String {
    let (value, unit) = if size >= MEGABYTE {
        (size as f64 / MEGABYTE as f64, "MB")
    } else if size >= KILOBYTE {
        (size as f64 / KILOBYTE as f64, "KB")
    } else {
        (size as f64, "B")
    };
    let formatted = format!("{:.1}", value);
    let formatted = formatted.strip_suffix(".0").unwrap_or(&formatted);
    format!("{} {}", formatted, unit)
}

/// A writer that forwards to `inner` and reports progress to `output` at
/// most once per wall-clock second.
pub struct ProgressWriter<W, O> {
    inner: W,
    output: O,
    written: u64,
    total: Option<u64>,
    last_report: Option<u64>,
}

impl<W: Write, O: Write> ProgressWriter<W, O> {
    /// `total` is `None` when the size is not known up front.
    pub fn new(inner: W, total: Option<u64>, output: O) -> Self {
        Self {
            inner,
            output,
            written: 0,
            total,
            last_report: None,
        }
    }

    /// Emit the final line and hand back the wrapped writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.report();
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn report(&mut self) {
        let line = match self.total {
            Some(total) if total > 0 => {
                let end = if self.written == total { "" } else { " ..." };
                format!(
                    "Downloaded {:5.1}% ({} / {}){}",
                    100.0 * self.written as f64 / total as f64,
                    fmt_size(self.written),
                    fmt_size(total),
                    end
                )
            }
            _ => format!("Downloaded {} bytes", self.written),
        };
        // Progress output errors never fail the copy.
        let _ = writeln!(self.output, "{}", line);
    }
}

impl<W: Write, O: Write> Write for ProgressWriter<W, O> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if self.last_report != Some(now) {
            self.report();
            self.last_report = Some(now);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Create a spinner progress bar with standard styling.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("     {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Create a progress bar with byte tracking.
pub fn create_byte_progress(total_bytes: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_bytes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸━"),
    );
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Run a closure with a spinner, clearing it when done.
pub fn with_spinner<T, E>(message: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let pb = create_spinner(message);
    let result = f();
    pb.finish_and_clear();
    result
}
