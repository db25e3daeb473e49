//! CLI output formatting utilities.
//!
//! Colored status lines go to stdout, errors and diagnostics to stderr, so
//! the output of `luapack run` stays the program's own.

use std::fmt::Display;
use std::time::Duration;

use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Print one diagnostic per line, skipping repeats of the line before.
pub fn print_diagnostics<T: Display>(diagnostics: &[T]) {
  for line in dedup_consecutive(diagnostics) {
    eprintln!("{}", line);
  }
}

fn dedup_consecutive<T: Display>(items: &[T]) -> Vec<String> {
  let mut lines: Vec<String> = Vec::with_capacity(items.len());
  for item in items {
    let line = item.to_string();
    if lines.last() != Some(&line) {
      lines.push(line);
    }
  }
  lines
}
