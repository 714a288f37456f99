//! Output formatting utilities.

use colored::Colorize;

/// Print a section header
pub(crate) fn section(title: &str) {
    println!("\n{}", format!("=== {title} ===").cyan().bold());
}

/// Print a key-value pair
pub(crate) fn kv(key: &str, value: impl std::fmt::Display) {
    println!("  {}: {}", key.white().bold(), value);
}

/// Print an info message
pub(crate) fn info(msg: &str) {
    println!("{} {}", "[INFO]".blue(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_does_not_panic() {
        section("Running experiments for Lasso");
    }

    #[test]
    fn test_kv_does_not_panic() {
        kv("Score", 0.87);
    }

    #[test]
    fn test_info_does_not_panic() {
        info("Loading models...");
    }
}
