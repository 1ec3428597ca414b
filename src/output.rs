//! # Output Configuration
//!
//! Listings go to stdout; every diagnostic goes to stderr through the `log`
//! facade. This module decides whether stderr gets colors and installs the
//! `env_logger` backend accordingly.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;
use std::io::Write;

use clap::ValueEnum;
use log::LevelFilter;

/// Value of the `--color` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn as_arg(&self) -> &'static str {
        match self {
            ColorChoice::Auto => "auto",
            ColorChoice::Always => "always",
            ColorChoice::Never => "never",
        }
    }
}

/// Output configuration for diagnostics.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors should be used on stderr.
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the `--color` flag against the environment.
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stderr is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(choice: ColorChoice) -> Self {
        let use_color = match choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stderr().features().colors_supported()
    }

    pub fn write_style(&self) -> env_logger::WriteStyle {
        if self.use_color {
            env_logger::WriteStyle::Always
        } else {
            env_logger::WriteStyle::Never
        }
    }
}

/// Parse a `--log-level` value.
pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| format!("unknown log level '{}' (use error, warn, info, debug or trace)", level))
}

/// Install the stderr logger.
///
/// Records are printed as `grm: <message>`, with the level spelled out for
/// anything other than info.
pub fn init_logging(level: LevelFilter, output: &OutputConfig) {
    let colored = output.use_color;
    let result = env_logger::Builder::new()
        .filter_level(level)
        .write_style(output.write_style())
        .target(env_logger::Target::Stderr)
        .format(move |buf, record| {
            let label = match record.level() {
                log::Level::Info => String::new(),
                other => {
                    let text = format!("{}: ", other.as_str().to_lowercase());
                    if colored {
                        level_style(other).apply_to(text).to_string()
                    } else {
                        text
                    }
                }
            };
            writeln!(buf, "grm: {}{}", label, record.args())
        })
        .try_init();

    if result.is_err() {
        log::debug!("Logger already installed");
    }
}

fn level_style(level: log::Level) -> console::Style {
    let style = console::Style::new().force_styling(true);
    match level {
        log::Level::Error => style.red().bold(),
        log::Level::Warn => style.yellow(),
        _ => style.dim(),
    }
}
