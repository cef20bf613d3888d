//! Reporter trait for progress output
//!
//! Keeps the staging and download logic decoupled from how progress is
//! actually rendered, and lets tests run silently.

use std::io::Write;

pub trait Reporter: Send + Sync {
    /// Updates the progress of a download.
    fn downloading(&self, name: &str, current: u64, total: Option<u64>);

    /// Announces that an archive is being unpacked.
    fn extracting(&self, name: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Marks an operation as failed with a specific reason.
    fn failed(&self, name: &str, reason: &str);
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn downloading(&self, _: &str, _: u64, _: Option<u64>) {}
    fn extracting(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn failed(&self, _: &str, _: &str) {}
}

/// Renders progress as single rewritten terminal lines.
#[derive(Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn downloading(&self, name: &str, current: u64, total: Option<u64>) {
        match total.filter(|&t| t > 0) {
            Some(t) => print!("\r  {} {} / {}", name, format_bytes(current), format_bytes(t)),
            None => print!("\r  {} {}", name, format_bytes(current)),
        }
        let _ = std::io::stdout().flush();
    }

    fn extracting(&self, name: &str) {
        println!("\r  {name} extracting");
    }

    fn info(&self, msg: &str) {
        println!("{msg}");
    }

    fn success(&self, msg: &str) {
        println!("{msg}");
    }

    fn failed(&self, name: &str, reason: &str) {
        eprintln!("\r  {name} failed: {reason}");
    }
}

/// Format a byte count as a short human-readable figure.
fn format_bytes(bytes: u64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / MB)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_null_reporter_is_silent() {
        // Compile-time check that all trait methods exist; no output to assert.
        let r = NullReporter;
        r.downloading("x", 0, None);
        r.extracting("x");
        r.info("x");
        r.success("x");
        r.failed("x", "y");
    }
}
