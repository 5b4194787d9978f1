use std::{
  fs::{self, OpenOptions},
  path::Path,
  sync::Mutex,
};

use tracing_subscriber::{EnvFilter, fmt::{self, time::LocalTime}, prelude::*};

use crate::configs::LoggingConfig;

type Timer = LocalTime<&'static [time::format_description::BorrowedFormatItem<'static>]>;

fn timer() -> Timer {
  LocalTime::new(time::macros::format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
  ))
}

/// Builds the filter string from the configured level plus extra directives.
fn filter_directives(logging: Option<&LoggingConfig>) -> String {
  let log_level = logging
    .and_then(|l| l.level.as_deref())
    .unwrap_or("info");

  let filters = logging
    .and_then(|l| l.filters.as_deref())
    .unwrap_or("");

  if filters.is_empty() {
    log_level.to_string()
  } else {
    format!("{},{}", log_level, filters)
  }
}

pub fn init(logging: Option<&LoggingConfig>) {
  // RUST_LOG wins over the config file
  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(filter_directives(logging)));

  // stdout carries the transcript output
  let console_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_timer(timer())
    .with_target(true)
    .with_thread_ids(true)
    .with_line_number(true)
    .with_file(false);

  let file_layer = logging
    .and_then(|l| l.file.as_ref())
    .and_then(|file_config| {
      if let Some(parent) = Path::new(&file_config.path).parent() {
        if let Err(e) = fs::create_dir_all(parent) {
          eprintln!("Failed to create log directory: {}", e);
        }
      }

      match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&file_config.path)
      {
        Ok(file) => Some(
          fmt::layer()
            .with_writer(Mutex::new(file))
            .with_timer(timer())
            .with_target(true)
            .with_line_number(true)
            .with_ansi(false),
        ),
        Err(e) => {
          eprintln!("Failed to open log file {}: {}", file_config.path, e);
          None
        }
      }
    });

  // A subscriber may already be installed (tests, embedding applications).
  let _ = tracing_subscriber::registry()
    .with(env_filter)
    .with(console_layer)
    .with(file_layer)
    .try_init();
}
