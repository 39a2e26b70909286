/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use itoa::Integer;
use log::debug;
use ryu::Float;
use smallvec::SmallVec;

use super::{StatsdClient, TimingSpan};
use crate::sample;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MetricType {
    Count,
    Gauge,
    Timing,
    Set,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Count => "c",
            MetricType::Gauge => "g",
            MetricType::Timing => "ms",
            MetricType::Set => "s",
        }
    }
}

type LineBuf = SmallVec<[u8; 256]>;

#[must_use = "the metric is only emitted by calling send"]
pub struct MetricFormatter<'a> {
    client: &'a StatsdClient,
    metric_type: MetricType,
    name: &'a str,
    value: SmallVec<[u8; 32]>,
    sample_rate: f64,
    reset_gauge: bool,
}

impl StatsdClient {
    pub fn count<'a, T: Integer>(&'a self, name: &'a str, value: T) -> MetricFormatter<'a> {
        let mut buffer = itoa::Buffer::new();
        let value = buffer.format(value);
        self.metric_with_type(MetricType::Count, name, value.as_bytes())
    }

    #[inline]
    pub fn increment<'a>(&'a self, name: &'a str) -> MetricFormatter<'a> {
        self.count(name, 1)
    }

    #[inline]
    pub fn increment_by<'a>(&'a self, name: &'a str, delta: i64) -> MetricFormatter<'a> {
        self.count(name, delta)
    }

    #[inline]
    pub fn decrement<'a>(&'a self, name: &'a str) -> MetricFormatter<'a> {
        self.count(name, -1)
    }

    #[inline]
    pub fn decrement_by<'a>(&'a self, name: &'a str, delta: i64) -> MetricFormatter<'a> {
        self.count(name, delta.saturating_neg())
    }

    /// Set a gauge to an absolute value.
    ///
    /// A signed value would be taken as an adjustment by the daemon, so a
    /// negative value is sent as a reset to 0 followed by the value, in the
    /// same packet.
    pub fn gauge<'a, T: Integer>(&'a self, name: &'a str, value: T) -> MetricFormatter<'a> {
        let mut buffer = itoa::Buffer::new();
        let value = buffer.format(value);
        self.absolute_gauge(name, value)
    }

    pub fn gauge_float<'a, T: Float>(&'a self, name: &'a str, value: T) -> MetricFormatter<'a> {
        let mut buffer = ryu::Buffer::new();
        let value = buffer.format(value);
        self.absolute_gauge(name, value)
    }

    fn absolute_gauge<'a>(&'a self, name: &'a str, value: &str) -> MetricFormatter<'a> {
        let mut f = self.metric_with_type(MetricType::Gauge, name, value.as_bytes());
        f.reset_gauge = value.starts_with('-');
        f
    }

    /// Adjust a gauge relatively, the value is always sent with an explicit sign.
    pub fn gauge_delta<'a>(&'a self, name: &'a str, delta: i64) -> MetricFormatter<'a> {
        let mut buffer = itoa::Buffer::new();
        let value = buffer.format(delta);
        let mut f = self.metric_with_type(MetricType::Gauge, name, b"");
        if delta >= 0 {
            f.value.push(b'+');
        }
        f.value.extend_from_slice(value.as_bytes());
        f
    }

    /// Record a duration in milliseconds.
    pub fn timing<'a>(&'a self, name: &'a str, millis: f64) -> MetricFormatter<'a> {
        let mut buffer = ryu::Buffer::new();
        let value = buffer.format(millis);
        self.metric_with_type(MetricType::Timing, name, value.as_bytes())
    }

    pub fn timing_duration<'a>(
        &'a self,
        name: &'a str,
        duration: Duration,
    ) -> MetricFormatter<'a> {
        self.timing(name, duration.as_secs_f64() * 1000.0)
    }

    /// Record a member of a set, the daemon counts unique members.
    pub fn set<'a>(&'a self, name: &'a str, member: &'a str) -> MetricFormatter<'a> {
        self.metric_with_type(MetricType::Set, name, member.as_bytes())
    }

    /// Start a timing span, its elapsed time is sent when it is dropped.
    pub fn timer<'a>(&'a self, name: &'a str) -> TimingSpan<'a> {
        TimingSpan::new(self, name)
    }

    fn metric_with_type<'a>(
        &'a self,
        metric_type: MetricType,
        name: &'a str,
        value: &[u8],
    ) -> MetricFormatter<'a> {
        MetricFormatter {
            client: self,
            metric_type,
            name,
            value: SmallVec::from_slice(value),
            sample_rate: 1.0,
            reset_gauge: false,
        }
    }
}

impl MetricFormatter<'_> {
    /// Only send the metric with probability `rate`.
    ///
    /// The rate is appended to the line if it is less than 1.0, so the daemon
    /// can scale the value back.
    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn send(self) {
        let client = self.client;
        if client.sink.is_discard() {
            return;
        }
        if self.name.is_empty() {
            debug!("metrics with empty name dropped");
            client.sink.stats().add_dropped(1);
            return;
        }
        if self.metric_type == MetricType::Set && !set_member_allowed(&self.value) {
            debug!("set member with reserved char dropped for metrics {}", self.name);
            client.sink.stats().add_dropped(1);
            return;
        }
        if !sample::sampled(self.sample_rate) {
            client.sink.stats().add_sampled_out();
            return;
        }

        let mut line = LineBuf::new();
        self.write_line(&mut line);
        let lines = if self.reset_gauge { 2 } else { 1 };
        if let Err(e) = client.sink.emit_lines(&line, lines) {
            client.handle_emit_error(e);
        }
    }

    fn write_name(&self, buf: &mut LineBuf) {
        let prefix = &self.client.prefix;
        if !prefix.is_empty() {
            buf.extend_from_slice(prefix.as_bytes());
            buf.push(b'.');
        }
        buf.extend_from_slice(self.name.as_bytes());
    }

    fn write_line(&self, buf: &mut LineBuf) {
        if self.reset_gauge {
            self.write_name(buf);
            buf.extend_from_slice(b":0|g\n");
        }
        self.write_name(buf);
        buf.push(b':');
        buf.extend_from_slice(self.value.as_slice());
        buf.push(b'|');
        buf.extend_from_slice(self.metric_type.as_str().as_bytes());

        if sample::need_rate_suffix(self.sample_rate) {
            let mut buffer = ryu::Buffer::new();
            buf.extend_from_slice(b"|@");
            buf.extend_from_slice(buffer.format(self.sample_rate).as_bytes());
        }
    }
}

/// Set members go between the `:` and `|` delimiters of a single line.
fn set_member_allowed(member: &[u8]) -> bool {
    !member
        .iter()
        .any(|&b| matches!(b, b'|' | b':') || b.is_ascii_control())
}
