//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output including colored status
//! messages, human-readable byte counts, and value rendering.

use std::io::{self, Write};

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
}

/// Human-readable size using binary units, one decimal above bytes.
pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];

  let mut scaled = bytes as f64;
  let mut unit = None;
  for next in UNITS {
    if scaled < 1024.0 {
      break;
    }
    scaled /= 1024.0;
    unit = Some(next);
  }

  match unit {
    Some(unit) => format!("{:.1} {}", scaled, unit),
    None => format!("{} B", bytes),
  }
}

/// JSON form of a stored value: a string when it is UTF-8, a byte array otherwise.
pub fn json_value(value: &[u8]) -> serde_json::Value {
  match std::str::from_utf8(value) {
    Ok(text) => serde_json::Value::String(text.to_string()),
    Err(_) => serde_json::Value::from(value.to_vec()),
  }
}

/// Write a value to stdout exactly as stored.
pub fn print_raw(value: &[u8]) -> anyhow::Result<()> {
  let mut stdout = io::stdout().lock();
  stdout.write_all(value).context("Failed to write value")?;
  stdout.flush().context("Failed to write value")?;
  Ok(())
}

#[derive(Clone, Copy)]
enum Level {
  Success,
  Error,
  Warning,
  Info,
}

/// Print `message` behind a colored status symbol. Errors and warnings go to
/// stderr and are colored whole; the rest go to stdout.
fn print_status(level: Level, message: &str) {
  let (symbol, stream) = match level {
    Level::Success => (symbols::SUCCESS, Stream::Stdout),
    Level::Error => (symbols::ERROR, Stream::Stderr),
    Level::Warning => (symbols::WARNING, Stream::Stderr),
    Level::Info => (symbols::INFO, Stream::Stdout),
  };
  let paint = |text: &str| -> String {
    let colored = text.if_supports_color(stream, |t| match level {
      Level::Success => t.green().to_string(),
      Level::Error => t.red().to_string(),
      Level::Warning => t.yellow().to_string(),
      Level::Info => t.blue().to_string(),
    });
    colored.to_string()
  };

  match stream {
    Stream::Stderr => eprintln!("{} {}", paint(symbol), paint(message)),
    _ => println!("{} {}", paint(symbol), message),
  }
}

pub fn print_success(message: &str) {
  print_status(Level::Success, message);
}

pub fn print_error(message: &str) {
  print_status(Level::Error, message);
}

pub fn print_warning(message: &str) {
  print_status(Level::Warning, message);
}

pub fn print_info(message: &str) {
  print_status(Level::Info, message);
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON output")?;
  let mut stdout = io::stdout().lock();
  writeln!(stdout, "{}", rendered).context("Failed to write JSON output")?;
  Ok(())
}
