use std::{
    sync::{Mutex, OnceLock},
    thread::{self, ThreadId},
};

use log::{LevelFilter, Log, Metadata, Record};

/// Keeps every log line with the thread that emitted it so parallel tests only see their own
struct CaptureLogger {
    lines: Mutex<Vec<(ThreadId, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.lines
            .lock()
            .unwrap()
            .push((thread::current().id(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};
static INIT: OnceLock<()> = OnceLock::new();

pub fn start() {
    INIT.get_or_init(|| {
        log::set_logger(&LOGGER).expect("another logger was already set");
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Lines logged so far by the calling thread
pub fn lines() -> Vec<String> {
    let id = thread::current().id();
    LOGGER
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|(thread, _)| *thread == id)
        .map(|(_, line)| line.clone())
        .collect()
}
