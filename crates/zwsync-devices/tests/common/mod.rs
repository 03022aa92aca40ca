//! Mock driver shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use zwsync_devices::{Error, RawData, RawValue, Result, Transport, ValueGenre, ValueKey};

/// Transport that records writes and answers basic type queries from a table.
#[derive(Default)]
pub struct MockTransport {
    basic_types: HashMap<u8, u8>,
    writes: Mutex<Vec<(ValueKey, RawData)>>,
    fail_writes: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_basic_type(mut self, endpoint_id: u8, code: u8) -> Self {
        self.basic_types.insert(endpoint_id, code);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(ValueKey, RawData)> {
        self.writes.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn basic_type(&self, endpoint_id: u8) -> u8 {
        self.basic_types.get(&endpoint_id).copied().unwrap_or(0)
    }

    fn set_value(&self, value_id: &ValueKey, value: RawData) -> Result<()> {
        if self.fail_writes {
            return Err(Error::transport(format!("write to {} rejected", value_id)));
        }
        self.writes.lock().unwrap().push((*value_id, value));
        Ok(())
    }
}

pub fn user_value(key: ValueKey, label: &str, value: RawData) -> RawValue {
    RawValue::new(key, label, value).with_genre(ValueGenre::User)
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(|line| line.trim().to_string())
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with info-level messages captured, one message per line.
pub fn capture_logs(f: impl FnOnce()) -> Vec<String> {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    buffer.lines()
}
