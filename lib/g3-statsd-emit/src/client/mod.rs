/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::warn;

use crate::{
    MetricsPrefix, ParseError, StatsdBackend, StatsdClientBuildError, StatsdClientConfig,
    StatsdClientSnapshot, StatsdMetricsSink, StatsdTransport,
};

mod formatter;
pub use formatter::MetricFormatter;

mod timer;
pub use timer::TimingSpan;

/// A statsd client that can be shared by concurrent callers.
///
/// Every emit call is fire-and-forget: transport errors are counted and logged,
/// but never returned to the caller.
pub struct StatsdClient {
    prefix: MetricsPrefix,
    sink: Arc<StatsdMetricsSink>,

    create_instant: Instant,
    last_error_report: AtomicU64,
}

impl StatsdClient {
    /// Create a client sending to `host:port` with the default config.
    ///
    /// For the datagram transport a target that can not be resolved now will be
    /// resolved again in the background, after a send. For the stream transport
    /// it is an error.
    pub fn new(
        host: &str,
        port: u16,
        prefix: &str,
        transport: StatsdTransport,
    ) -> Result<Self, StatsdClientBuildError> {
        let prefix = MetricsPrefix::from_str(prefix)?;
        let mut config = StatsdClientConfig::with_prefix(prefix);
        config.set_backend(StatsdBackend::new(host, port, transport));
        config.build()
    }

    /// A client that drops everything, to turn metrics off without touching
    /// the emit call sites.
    pub fn discard() -> Self {
        StatsdClient::new_with_sink(MetricsPrefix::default(), StatsdMetricsSink::discard())
    }

    pub(crate) fn new_with_sink(prefix: MetricsPrefix, sink: StatsdMetricsSink) -> Self {
        StatsdClient {
            prefix,
            sink: Arc::new(sink),
            create_instant: Instant::now(),
            last_error_report: AtomicU64::new(u64::MAX),
        }
    }

    /// Create a client for `<prefix>.<sub>` names.
    ///
    /// The new client shares the transport, the batch buffer and the stats
    /// counters with this one.
    pub fn with_sub_prefix(&self, sub: &str) -> Result<StatsdClient, ParseError> {
        let sub = MetricsPrefix::from_str(sub)?;
        Ok(StatsdClient {
            prefix: self.prefix.join(&sub),
            sink: Arc::clone(&self.sink),
            create_instant: Instant::now(),
            last_error_report: AtomicU64::new(u64::MAX),
        })
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        self.prefix.as_str()
    }

    pub fn stats(&self) -> StatsdClientSnapshot {
        self.sink.stats().snapshot()
    }

    /// Send out all batched lines now.
    pub fn flush(&self) {
        if let Err(e) = self.sink.flush() {
            self.handle_emit_error(e);
        }
    }

    fn handle_emit_error(&self, e: io::Error) {
        let time_slice = self.create_instant.elapsed().as_secs() >> 6; // every 64s
        if self.last_error_report.swap(time_slice, Ordering::Relaxed) != time_slice {
            warn!("sending metrics error: {e:?}");
        }
    }
}

impl Drop for StatsdClient {
    fn drop(&mut self) {
        self.flush();
    }
}
