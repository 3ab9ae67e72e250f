//! Console logging with wrapped, visually grouped multiline records.

mod pretty_list;

use {
    anyhow::Result,
    flexi_logger::{DeferredNow, Logger, LoggerHandle, Record, WriteMode},
    std::{fmt::Write as FmtWrite, sync::OnceLock},
    textwrap::{termwidth, Options},
};

pub use self::pretty_list::PrettyList;

/// The widest a log record is wrapped to, even on wide terminals.
const MAX_LINE_WIDTH: usize = 74;

/// Keeps the logger running for the rest of the process.
static LOGGER_HANDLE: OnceLock<LoggerHandle> = OnceLock::new();

/// Start console logging. Only the first call has any effect.
///
/// The level filter is read from RUST_LOG and defaults to `info`.
pub fn setup() -> Result<()> {
    if LOGGER_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = Logger::try_with_env_or_str("info")?
        .format(multiline_format)
        .write_mode(WriteMode::Async)
        .start()?;
    if LOGGER_HANDLE.set(handle).is_ok() {
        log::info!("Adjust the log level by setting RUST_LOG. By default RUST_LOG=info");
    }
    Ok(())
}

/// A multiline log format for flexi_logger.
///
/// Records are wrapped at terminal width and prefixed with box drawing
/// characters so it's easy to tell where a big record begins and ends.
pub fn multiline_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let header = format!(
        "{} [{}] [{}:{}]",
        record.level(),
        now.now().format("%H:%M:%S%.6f"),
        record.file().unwrap_or("<unnamed>"),
        record.line().unwrap_or(0),
    );
    let body = record.args().to_string();
    writeln!(
        w,
        "{}",
        wrap_record(&header, &body, termwidth().min(MAX_LINE_WIDTH))
    )
}

/// Join a record's header and body and wrap them to `width` columns. The
/// final line is marked so consecutive records are easy to tell apart.
fn wrap_record(header: &str, body: &str, width: usize) -> String {
    let mut full_line = String::new();
    let _ = writeln!(full_line, "{}", header);
    full_line.push_str(body);

    let wrap_options = Options::new(width)
        .initial_indent("┏ ")
        .subsequent_indent("┃ ");
    let wrapped = textwrap::fill(&full_line, wrap_options);
    match wrapped.rfind('\n') {
        Some(last) if wrapped[last + 1..].starts_with('┃') => {
            let tail = &wrapped[last + 1 + '┃'.len_utf8()..];
            format!("{}\n┗{}", &wrapped[..last], tail)
        }
        _ => wrapped,
    }
}
