/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::{Duration, Instant};

use super::StatsdClient;

/// A running timing measurement.
///
/// The elapsed time is sent as a timing metric when the span is dropped, so it
/// is recorded on every exit path of the enclosing scope, including early
/// returns, `?` error propagation and unwinding.
#[must_use = "the span is sent when dropped, bind it to a named variable"]
pub struct TimingSpan<'a> {
    client: &'a StatsdClient,
    name: &'a str,
    sample_rate: f64,
    start: Instant,
    finished: bool,
}

impl<'a> TimingSpan<'a> {
    pub(super) fn new(client: &'a StatsdClient, name: &'a str) -> Self {
        TimingSpan {
            client,
            name,
            sample_rate: 1.0,
            start: Instant::now(),
            finished: false,
        }
    }

    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = rate;
        self
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// End the span now instead of at the end of the scope.
    pub fn send(mut self) {
        self.finish();
    }

    /// Abandon the span, nothing will be sent.
    pub fn cancel(mut self) {
        self.finished = true;
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.client
            .timing_duration(self.name, self.start.elapsed())
            .with_sample_rate(self.sample_rate)
            .send();
    }
}

impl Drop for TimingSpan<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{buf_client, lines};
    use super::*;
    use std::io;
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    fn parse_timing(line: &str, name: &str) -> f64 {
        let value = line
            .strip_prefix(name)
            .and_then(|s| s.strip_prefix(':'))
            .and_then(|s| s.strip_suffix("|ms"))
            .unwrap();
        value.parse().unwrap()
    }

    #[test]
    fn scope_end() {
        let (client, capture) = buf_client("", None);
        {
            let _span = client.timer("foo_timer");
            thread::sleep(Duration::from_millis(5));
        }
        let lines = lines(&capture);
        assert_eq!(lines.len(), 1);
        assert!(parse_timing(&lines[0], "foo_timer") >= 5.0);
    }

    #[test]
    fn error_propagation() {
        fn step() -> io::Result<()> {
            Err(io::Error::other("work failed"))
        }

        fn work(client: &StatsdClient) -> io::Result<u32> {
            let _span = client.timer("foo_timer.^test=ala");
            step()?;
            Ok(1)
        }

        let (client, capture) = buf_client("", None);
        assert!(work(&client).is_err());
        let lines = lines(&capture);
        assert_eq!(lines.len(), 1);
        assert!(parse_timing(&lines[0], "foo_timer.^test=ala") >= 0.0);
    }

    #[test]
    fn unwinding() {
        let (client, capture) = buf_client("", None);
        let r = panic::catch_unwind(AssertUnwindSafe(|| {
            let _span = client.timer("foo_timer");
            panic!("work panicked");
        }));
        assert!(r.is_err());
        assert_eq!(lines(&capture).len(), 1);
    }

    #[test]
    fn send_once() {
        let (client, capture) = buf_client("app", None);
        let span = client.timer("foo_timer");
        assert!(span.elapsed() >= Duration::ZERO);
        span.send();
        let lines = lines(&capture);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("app.foo_timer:"));
    }

    #[test]
    fn cancel() {
        let (client, capture) = buf_client("", None);
        client.timer("foo_timer").cancel();
        assert!(capture.packets().is_empty());
    }

    #[test]
    fn sample_rate() {
        let (client, capture) = buf_client("", None);
        client.timer("foo_timer").with_sample_rate(1.0).send();
        client.timer("foo_timer").with_sample_rate(0.0).send();
        assert_eq!(lines(&capture).len(), 1);
        assert_eq!(client.stats().sampled_out, 1);
    }
}
