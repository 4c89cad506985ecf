//! Logger setup. Everything goes through the `log` macros, `env_logger` prints them.
use std::io::Write;

use colored::Colorize;
use log::{Level, LevelFilter};

/// Initializes the logger at `level`. `RUST_LOG`, when set, takes precedence.
pub fn init(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "ERROR".bright_red().bold(),
                Level::Warn => "WARN".yellow().bold(),
                Level::Info => "INFO".green(),
                Level::Debug => "DEBUG".blue(),
                Level::Trace => "TRACE".dimmed(),
            };
            writeln!(
                buf,
                "[{} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                level,
                record.args()
            )
        })
        .init();
}
