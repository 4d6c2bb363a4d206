//! Tracing subscriber setup
//!
//! Output goes to stdout, with `ERROR` events on stderr, or to the Android
//! system log when `RUN_IN_ANDROID` is set and `liblog.so` can be opened.

use std::ffi::CString;
use std::io;
use std::os::raw::{c_char, c_int};
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::dynlib::DynLib;

const LOG_TAG: &str = "EGL_WRAPPER";

// android/log.h priorities
const ANDROID_LOG_VERBOSE: c_int = 2;
const ANDROID_LOG_DEBUG: c_int = 3;
const ANDROID_LOG_INFO: c_int = 4;
const ANDROID_LOG_WARN: c_int = 5;
const ANDROID_LOG_ERROR: c_int = 6;

type AndroidLogWriteFn = unsafe extern "C" fn(c_int, *const c_char, *const c_char) -> c_int;

fn android_priority(level: &Level) -> c_int {
    match *level {
        Level::TRACE => ANDROID_LOG_VERBOSE,
        Level::DEBUG => ANDROID_LOG_DEBUG,
        Level::INFO => ANDROID_LOG_INFO,
        Level::WARN => ANDROID_LOG_WARN,
        Level::ERROR => ANDROID_LOG_ERROR,
    }
}

/// `MakeWriter` that forwards formatted events to `__android_log_write`
#[derive(Clone)]
pub struct AndroidLogWriter {
    // keeps liblog mapped while the writer is alive
    _lib: Arc<DynLib>,
    write: AndroidLogWriteFn,
    tag: CString,
}

impl AndroidLogWriter {
    pub fn open() -> Option<Self> {
        let lib = DynLib::open("liblog.so").ok()?;
        let write = unsafe { lib.lookup::<AndroidLogWriteFn>(c"__android_log_write")? };
        let tag = CString::new(LOG_TAG).ok()?;
        Some(Self {
            _lib: Arc::new(lib),
            write,
            tag,
        })
    }
}

pub struct AndroidLogLine<'a> {
    owner: &'a AndroidLogWriter,
    priority: c_int,
}

impl io::Write for AndroidLogLine<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text: Vec<u8> = buf
            .iter()
            .copied()
            .filter(|b| *b != 0)
            .collect();
        let text = String::from_utf8_lossy(&text);
        let text = text.trim_end_matches('\n');
        if let Ok(line) = CString::new(text) {
            unsafe {
                (self.owner.write)(self.priority, self.owner.tag.as_ptr(), line.as_ptr());
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for AndroidLogWriter {
    type Writer = AndroidLogLine<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        AndroidLogLine {
            owner: self,
            priority: ANDROID_LOG_INFO,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        AndroidLogLine {
            owner: self,
            priority: android_priority(meta.level()),
        }
    }
}

fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(config.log_level.as_tracing()).into())
    })
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed by the host; that
/// subscriber is left in place.
pub fn init(config: &Config) -> bool {
    if config.run_in_android {
        if let Some(writer) = AndroidLogWriter::open() {
            return tracing_subscriber::registry()
                .with(env_filter(config))
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .without_time()
                        .with_level(false),
                )
                .try_init()
                .is_ok();
        }
    }

    let writer = io::stderr
        .with_max_level(Level::ERROR)
        .or_else(io::stdout);

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt::layer().with_writer(writer).with_target(false))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_android_priority() {
        assert_eq!(android_priority(&Level::TRACE), ANDROID_LOG_VERBOSE);
        assert_eq!(android_priority(&Level::WARN), ANDROID_LOG_WARN);
        assert_eq!(android_priority(&Level::ERROR), ANDROID_LOG_ERROR);
    }

    #[test]
    fn test_init_twice() {
        let config = Config {
            log_level: LogLevel::Debug,
            ..Config::default()
        };
        let _ = init(&config);
        assert!(!init(&config));
    }
}
