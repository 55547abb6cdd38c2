//! Colored diagnostics for the launcher
//!
//! Uses owo-colors for terminal colors. Everything goes to stderr: once a
//! toolchain is delegated to, stdout belongs to the child.

use owo_colors::OwoColorize;

/// Print a detail line (dimmed)
/// Example: "     Unpacking /home/u/sdk/go1.24.3/go1.24.3.linux-amd64.tar.gz ..."
pub fn detail(message: &str) {
    eprintln!("     {}", message.dimmed());
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    eprintln!("{} {}", "::".cyan(), message);
}

/// Print a success message (green)
/// Example: "==> Success. You may now run 'go1.24.3'"
pub fn success(message: &str) {
    eprintln!("{} {}", "==>".green().bold(), message.green());
}

/// Print a skip message (dimmed)
/// Example: "==> go1.24.3: already downloaded in /home/u/sdk/go1.24.3"
pub fn skip(message: &str) {
    eprintln!("{} {}", "==>".dimmed(), message.dimmed());
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}
