mod context;
mod loopback;
mod session;
mod shutdown;

use crate::init::{InitError, InitResult, Initializer};
use crate::server::{EmbeddedServer, ServerError, ServerFactory, ServerResult};

use std::io::{Cursor, Write};
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use error_location::ErrorLocation;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub(crate) const FAKE_URL: &str = "http://127.0.0.1:4321";
pub(crate) const FAKE_APP_KEY: &str = "0123456789abcdef0123456789abcdef";

/// Shared counters observed by every server a fake factory creates.
#[derive(Default)]
pub(crate) struct FakeCounters {
    pub(crate) starts: AtomicUsize,
    pub(crate) stops: AtomicUsize,
    pub(crate) running: AtomicUsize,
    pub(crate) max_running: AtomicUsize,
}

impl FakeCounters {
    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

/// Embedded server that reports fixed connection data.
#[derive(Clone)]
pub(crate) struct FakeServer {
    pub(crate) url: Option<String>,
    pub(crate) app_key: Option<String>,
    pub(crate) fail_start: bool,
    pub(crate) start_delay: Duration,
    pub(crate) counters: Arc<FakeCounters>,
    running: bool,
}

impl FakeServer {
    pub(crate) fn new(counters: Arc<FakeCounters>) -> Self {
        Self {
            url: Some(String::from(FAKE_URL)),
            app_key: Some(String::from(FAKE_APP_KEY)),
            fail_start: false,
            start_delay: Duration::ZERO,
            counters,
            running: false,
        }
    }

    pub(crate) fn factory(self) -> Arc<dyn ServerFactory> {
        Arc::new(move || -> Box<dyn EmbeddedServer> { Box::new(self.clone()) })
    }
}

#[async_trait]
impl EmbeddedServer for FakeServer {
    async fn start(&mut self) -> ServerResult<()> {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);

        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }

        if self.fail_start {
            return Err(ServerError::StartupTimeout {
                timeout_secs: 1,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let running = self.counters.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_running.fetch_max(running, Ordering::SeqCst);
        self.running = true;

        Ok(())
    }

    async fn stop(&mut self) -> ServerResult<()> {
        self.counters.stops.fetch_add(1, Ordering::SeqCst);

        if self.running {
            self.running = false;
            self.counters.running.fetch_sub(1, Ordering::SeqCst);
        }

        Ok(())
    }

    fn url(&self) -> Option<String> {
        self.url.clone().filter(|_| self.running)
    }

    fn app_key(&self) -> Option<String> {
        self.app_key.clone().filter(|_| self.running)
    }
}

/// Initializer counting how often and how concurrently its body runs.
#[derive(Default)]
pub(crate) struct CountingInitializer {
    pub(crate) runs: AtomicUsize,
    pub(crate) active: AtomicUsize,
    pub(crate) max_active: AtomicUsize,
    pub(crate) current: AtomicBool,
    pub(crate) fail: AtomicBool,
    pub(crate) panic: AtomicBool,
    pub(crate) body_delay: Duration,
}

impl CountingInitializer {
    pub(crate) fn with_delay(body_delay: Duration) -> Self {
        Self {
            body_delay,
            ..Self::default()
        }
    }

    pub(crate) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl Initializer for CountingInitializer {
    fn is_current(&self) -> InitResult<bool> {
        Ok(self.current.load(Ordering::SeqCst))
    }

    fn initialize(&self) -> InitResult<()> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        self.runs.fetch_add(1, Ordering::SeqCst);

        std::thread::sleep(self.body_delay);
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panic.swap(false, Ordering::SeqCst) {
            panic!("initializer panicked");
        }

        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(InitError::initialization("disk full"));
        }

        self.current.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Entry of an in-memory test archive.
pub(crate) enum Entry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
}

/// Build a stored (uncompressed) zip archive.
pub(crate) fn build_archive(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for entry in entries {
        match entry {
            Entry::Dir(name) => writer.add_directory(*name, options).unwrap(),
            Entry::File(name, contents) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Build a deflated archive the way streaming writers do, with sizes and
/// CRCs in data descriptors after each entry.
pub(crate) fn build_streamed_archive(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut writer = ZipWriter::new_stream(Vec::new());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        match entry {
            Entry::Dir(name) => writer.add_directory(*name, options).unwrap(),
            Entry::File(name, contents) => {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}
