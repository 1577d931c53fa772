use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use once_cell::sync::{Lazy, OnceCell};
use terminal_size::{terminal_size, Width};
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset};

pub static TERM_WIDTH: Lazy<Option<u16>> =
    Lazy::new(|| terminal_size().map(|(Width(cols), _)| cols));

static LOG_SINK: OnceCell<LogSink> = OnceCell::new();

// The local offset can only be determined safely before other threads are spawned
static LOCAL_OFFSET: Lazy<UtcOffset> =
    Lazy::new(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC));

static TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month]/[day]/[year] [hour repr:12]_[minute]_[second] [period]"
);

struct LogSink {
    file: Option<Mutex<File>>,
    verbose: bool,
}

/// Set up the log file (if any) and the verbosity of `debug!` messages
///
/// Must be called at most once, before any message is logged
pub fn init(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    Lazy::force(&LOCAL_OFFSET);

    let file = log_file
        .map(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file at: {}", path.display()))
        })
        .transpose()?;

    LOG_SINK
        .set(LogSink {
            file: file.map(Mutex::new),
            verbose,
        })
        .map_err(|_| anyhow::anyhow!("Logging was already initialized"))
}

pub fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET
}

pub fn is_verbose() -> bool {
    LOG_SINK.get().is_some_and(|sink| sink.verbose)
}

/// Append a message to the log file, without colors
pub fn record(level: &str, message: &str) {
    let Some(file) = LOG_SINK.get().and_then(|sink| sink.file.as_ref()) else {
        return;
    };

    let now = OffsetDateTime::now_utc().to_offset(local_offset());
    let timestamp = now.format(TIMESTAMP_FORMAT).unwrap_or_default();

    // A poisoned lock only means another message failed to be written
    let mut file = match file.lock() {
        Ok(file) => file,
        Err(poisoned) => poisoned.into_inner(),
    };

    for line in message.lines() {
        // Logging must never make the program fail
        let _ = writeln!(file, "{timestamp} {level}: {line}");
    }
}

#[macro_export]
macro_rules! _format {
    ($color: ident => $message: tt, $($params: tt)*) => {{
        use colored::Colorize;
        let msg = format!($message, $($params)*);

        let msg = match *$crate::utils::logging::TERM_WIDTH {
            None => msg.as_str(),
            Some(width) => $crate::utils::ansi_strip::ansi_strip(&msg, width.into())
        };

        msg.$color()
    }}
}

#[macro_export]
macro_rules! _record {
    ($level: literal => $message: tt, $($params: tt)*) => {{
        $crate::utils::logging::record(
            $level,
            &$crate::utils::ansi_strip::strip_escapes(&format!($message, $($params)*)),
        );
    }};
}

#[macro_export]
macro_rules! fail {
    ($message: tt, $($params: tt)*) => {{
        $crate::_record!("ERROR" => $message, $($params)*);
        eprintln!("{}", $crate::_format!(bright_red => $message, $($params)*));
        std::process::exit(1);
    }};

    ($message: tt) => {{
        fail!($message,)
    }};
}

#[macro_export]
macro_rules! error {
    ($message: tt, $($params: tt)*) => {{
        $crate::_record!("ERROR" => $message, $($params)*);
        eprintln!("{}", $crate::_format!(bright_red => $message, $($params)*));
    }};

    ($message: tt) => {{
        error!($message,)
    }};
}

#[macro_export]
macro_rules! error_anyhow {
    ($error: expr) => {{
        use colored::Colorize;
        let msg = format!("{:?}", $error);
        $crate::utils::logging::record("ERROR", &$crate::utils::ansi_strip::strip_escapes(&msg));
        eprintln!("{}", msg.bright_red());
    }};
}

#[macro_export]
macro_rules! warn {
    ($message: tt, $($params: tt)*) => {{
        $crate::_record!("WARNING" => $message, $($params)*);
        eprintln!("{}", $crate::_format!(bright_yellow => $message, $($params)*));
    }};

    ($message: tt) => {{
        warn!($message,)
    }};
}

#[macro_export]
macro_rules! info {
    ($message: tt, $($params: tt)*) => {{
        $crate::_record!("INFO" => $message, $($params)*);
        println!("{}", $crate::_format!(bright_blue => $message, $($params)*));
    }};

    ($message: tt) => {{
        info!($message,)
    }};
}

#[macro_export]
macro_rules! success {
    ($message: tt, $($params: tt)*) => {{
        $crate::_record!("INFO" => $message, $($params)*);
        println!("{}", $crate::_format!(bright_green => $message, $($params)*));
    }};

    ($message: tt) => {{
        success!($message,)
    }};
}

#[macro_export]
macro_rules! debug {
    ($message: tt, $($params: tt)*) => {{
        $crate::_record!("DEBUG" => $message, $($params)*);

        if $crate::utils::logging::is_verbose() {
            eprintln!("{}", $crate::_format!(bright_black => $message, $($params)*));
        }
    }};

    ($message: tt) => {{
        debug!($message,)
    }};
}
