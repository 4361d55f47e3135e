//! Process-wide `tracing` setup for the estimator binaries.
//!
//! Two layers share one reloadable level filter: a console layer on stderr
//! (stdout carries reports) with its own on/off gate, and a file layer whose
//! target can be attached after startup.

use anyhow::{Result, anyhow, bail};
use chrono::Local;
use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn level_color(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

/// Drops the `src/` prefix carried by events from this crate. Library
/// crates keep their directory.
fn short_source(path: &str) -> &str {
    path.strip_prefix("src/")
        .or_else(|| path.strip_prefix("src\\"))
        .unwrap_or(path)
}

/// `<local time> <LEVEL> <file:line> <fields>`, colored on a terminal.
struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let (dim, cyan, reset, color) = if writer.has_ansi_escapes() {
            (DIM, CYAN, RESET, level_color(*meta.level()))
        } else {
            ("", "", "", "")
        };

        let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
        write!(writer, "{dim}{stamp}{reset} {color}{:>5}{reset} ", meta.level())?;

        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            write!(writer, "{cyan}{}:{line}{reset} ", short_source(file))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

type SharedFile = Arc<Mutex<Option<File>>>;

/// File target that can be attached after the subscriber is installed.
/// Writes are dropped while it is empty.
#[derive(Clone)]
struct FileSlot(SharedFile);

struct SlotWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for SlotWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), File::flush)
    }
}

impl<'a> MakeWriter<'a> for FileSlot {
    type Writer = SlotWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SlotWriter(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

type Reloader<T> = Box<dyn Fn(T) -> Result<()> + Send + Sync>;

/// Runtime controls captured when the subscriber is installed.
struct Controls {
    level: Reloader<String>,
    console: Reloader<bool>,
    file: SharedFile,
}

static CONTROLS: OnceLock<Controls> = OnceLock::new();
static APP_NAME: OnceLock<String> = OnceLock::new();

fn controls() -> Result<&'static Controls> {
    match CONTROLS.get() {
        Some(controls) => Ok(controls),
        None => bail!("logging not yet initialized"),
    }
}

fn reloader<S, T>(
    handle: reload::Handle<EnvFilter, S>,
    to_filter: fn(T) -> Result<EnvFilter>,
) -> Reloader<T>
where
    S: Subscriber + Send + Sync + 'static,
    T: 'static,
{
    Box::new(move |value| {
        handle
            .reload(to_filter(value)?)
            .map_err(|e| anyhow!("log filter reload failed: {e}"))
    })
}

fn level_filter(directive: String) -> Result<EnvFilter> {
    EnvFilter::try_new(&directive).map_err(|e| anyhow!("invalid log level '{directive}': {e}"))
}

// The level filter above still bounds what an open gate lets through.
fn console_gate(enabled: bool) -> Result<EnvFilter> {
    Ok(EnvFilter::new(if enabled { "trace" } else { "off" }))
}

/// Replaces the level filter. Takes a bare level such as `debug` or a full
/// `EnvFilter` directive.
pub fn set_log_level(level: &str) -> Result<()> {
    (controls()?.level)(level.to_owned())
}

pub fn set_console_enabled(enabled: bool) -> Result<()> {
    (controls()?.console)(enabled)
}

/// Appends log output to `path`, replacing any earlier log file. The parent
/// directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("cannot open log file '{}': {e}", path.display()))?;

    *controls()?
        .file
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(file);
    Ok(())
}

/// Executable stem, or `tax-estimator` when it cannot be determined.
pub fn app_name() -> &'static str {
    APP_NAME.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "tax-estimator".to_string())
    })
}

/// Installs the global subscriber at `RUST_LOG` or `info`. Later calls are
/// no-ops.
pub fn init_default_logging() {
    let file: SharedFile = Arc::new(Mutex::new(None));

    let (gate, gate_handle) = reload::Layer::new(EnvFilter::new("trace"));
    let (level, level_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );

    let console = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(gate);

    let to_file = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(false)
        .with_writer(FileSlot(Arc::clone(&file)));

    let installed = tracing_subscriber::registry()
        .with(level)
        .with(console)
        .with(to_file)
        .try_init()
        .is_ok();

    if installed {
        let _ = CONTROLS.set(Controls {
            level: reloader(level_handle, level_filter),
            console: reloader(gate_handle, console_gate),
            file,
        });
    }
}
