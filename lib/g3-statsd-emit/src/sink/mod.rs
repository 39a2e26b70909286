/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::stats::StatsdClientStats;

#[cfg(test)]
mod buf;
#[cfg(test)]
pub(crate) use buf::BufMetricsSink;

mod tcp;
pub(crate) use tcp::TcpMetricsSink;

mod udp;
pub(crate) use udp::UdpMetricsSink;

pub(crate) enum MetricsSinkIo {
    #[cfg(test)]
    Buf(BufMetricsSink),
    Udp(UdpMetricsSink),
    Tcp(TcpMetricsSink),
    Discard,
}

impl MetricsSinkIo {
    fn send_msg(&self, msg: &[u8]) -> io::Result<()> {
        match self {
            #[cfg(test)]
            MetricsSinkIo::Buf(b) => b.send_msg(msg),
            MetricsSinkIo::Udp(s) => s.send_msg(msg),
            MetricsSinkIo::Tcp(s) => s.send_msg(msg),
            MetricsSinkIo::Discard => Ok(()),
        }
    }
}

#[derive(Default)]
struct SinkBuf {
    data: Vec<u8>,
    lines: usize,
}

impl SinkBuf {
    fn is_empty(&self) -> bool {
        self.lines == 0
    }

    fn push_lines(&mut self, msg: &[u8], lines: usize) {
        if self.lines > 0 {
            self.data.push(b'\n');
        }
        self.data.extend_from_slice(msg);
        self.lines += lines;
    }

    fn clear(&mut self) {
        self.data.clear();
        self.lines = 0;
    }
}

pub(crate) struct StatsdMetricsSink {
    batch_size: Option<usize>,
    buf: Mutex<SinkBuf>,
    io: MetricsSinkIo,
    stats: StatsdClientStats,
}

impl StatsdMetricsSink {
    /// Create a sink that joins lines into packets of at most `batch_size` bytes,
    /// or sends each line as its own packet if no batch size is given.
    pub(crate) fn new(io: MetricsSinkIo, batch_size: Option<usize>) -> Self {
        let buf = SinkBuf {
            data: Vec::with_capacity(batch_size.unwrap_or_default()),
            lines: 0,
        };
        StatsdMetricsSink {
            batch_size,
            buf: Mutex::new(buf),
            io,
            stats: StatsdClientStats::default(),
        }
    }

    pub(crate) fn discard() -> Self {
        StatsdMetricsSink::new(MetricsSinkIo::Discard, None)
    }

    #[inline]
    pub(crate) fn is_discard(&self) -> bool {
        matches!(self.io, MetricsSinkIo::Discard)
    }

    #[inline]
    pub(crate) fn stats(&self) -> &StatsdClientStats {
        &self.stats
    }

    #[cfg(test)]
    fn emit(&self, line: &[u8]) -> io::Result<()> {
        self.emit_lines(line, 1)
    }

    /// Emit `lines` already joined lines, they always go out in the same packet.
    pub(crate) fn emit_lines(&self, msg: &[u8], lines: usize) -> io::Result<()> {
        let Some(batch_size) = self.batch_size else {
            return self.send_packet(msg, lines);
        };

        let mut buf = self.lock_buf();
        let mut r = Ok(());
        if !buf.is_empty() && buf.data.len() + 1 + msg.len() > batch_size {
            r = self.send_buf(&mut buf);
        }
        if msg.len() >= batch_size {
            // never split, send it on its own
            return r.and(self.send_packet(msg, lines));
        }
        buf.push_lines(msg, lines);
        r
    }

    pub(crate) fn flush(&self) -> io::Result<()> {
        if self.batch_size.is_none() {
            return Ok(());
        }
        let mut buf = self.lock_buf();
        if buf.is_empty() {
            return Ok(());
        }
        self.send_buf(&mut buf)
    }

    fn lock_buf(&self) -> MutexGuard<'_, SinkBuf> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send_buf(&self, buf: &mut SinkBuf) -> io::Result<()> {
        let r = self.send_packet(&buf.data, buf.lines);
        buf.clear();
        r
    }

    fn send_packet(&self, msg: &[u8], lines: usize) -> io::Result<()> {
        match self.io.send_msg(msg) {
            Ok(_) => {
                self.stats.add_sent(lines);
                Ok(())
            }
            Err(e) => {
                self.stats.add_dropped(lines);
                Err(e)
            }
        }
    }
}
