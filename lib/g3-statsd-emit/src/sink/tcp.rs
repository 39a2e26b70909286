/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use log::debug;

use g3_socket::BindAddr;

#[derive(Default)]
struct TcpSinkState {
    stream: Option<TcpStream>,
    write_buf: Vec<u8>,
}

/// Stream sink, every packet is written as newline terminated lines.
///
/// Writers are serialized by the state lock, so lines from concurrent callers
/// never interleave.
pub(crate) struct TcpMetricsSink {
    addr: SocketAddr,
    bind: BindAddr,
    timeout: Duration,
    state: Mutex<TcpSinkState>,
}

impl TcpMetricsSink {
    pub(crate) fn new(addr: SocketAddr, bind: BindAddr, timeout: Duration) -> Self {
        TcpMetricsSink {
            addr,
            bind,
            timeout,
            state: Mutex::default(),
        }
    }

    /// Try to connect now, so that the first send need not wait for it.
    pub(crate) fn connect_early(self) -> Self {
        match g3_socket::tcp::new_std_connect_to(self.addr, &self.bind, self.timeout) {
            Ok(stream) => {
                let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
                state.stream = Some(stream);
            }
            Err(e) => debug!("statsd tcp connect to {} failed: {e}", self.addr),
        }
        self
    }

    #[cfg(test)]
    pub(crate) fn is_connected(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.stream.is_some()
    }

    pub(super) fn send_msg(&self, msg: &[u8]) -> io::Result<()> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let TcpSinkState { stream, write_buf } = &mut *guard;

        write_buf.clear();
        write_buf.extend_from_slice(msg);
        write_buf.push(b'\n');

        match write_to_current(stream, write_buf.as_slice()) {
            WriteOutcome::Done => return Ok(()),
            WriteOutcome::NotConnected => {}
            WriteOutcome::Lost(e) => {
                debug!("statsd tcp connection to {} lost: {e}", self.addr);
            }
            WriteOutcome::Broken(e) => {
                debug!(
                    "statsd tcp connection to {} lost in the middle of a packet: {e}",
                    self.addr
                );
                return Err(e);
            }
        }

        // one reconnect attempt, the packet is dropped if it fails
        let mut s = g3_socket::tcp::new_std_connect_to(self.addr, &self.bind, self.timeout)?;
        write_packet(&mut s, write_buf.as_slice()).map_err(|e| e.error)?;
        *stream = Some(s);
        Ok(())
    }
}

enum WriteOutcome {
    Done,
    NotConnected,
    /// Nothing of the packet was written, it can be sent on a new connection.
    Lost(io::Error),
    /// Part of the packet was written, it must not be sent again.
    Broken(io::Error),
}

/// Write to the current stream, the stream is dropped on any error.
fn write_to_current<W: Write>(stream: &mut Option<W>, buf: &[u8]) -> WriteOutcome {
    let Some(s) = stream else {
        return WriteOutcome::NotConnected;
    };
    match write_packet(s, buf) {
        Ok(_) => WriteOutcome::Done,
        Err(PartialWrite { written, error }) => {
            *stream = None;
            if written > 0 {
                WriteOutcome::Broken(error)
            } else {
                WriteOutcome::Lost(error)
            }
        }
    }
}

struct PartialWrite {
    written: usize,
    error: io::Error,
}

fn write_packet<W: Write>(w: &mut W, mut buf: &[u8]) -> Result<(), PartialWrite> {
    let mut written = 0;
    while !buf.is_empty() {
        match w.write(buf) {
            Ok(0) => {
                return Err(PartialWrite {
                    written,
                    error: io::Error::new(io::ErrorKind::WriteZero, "failed to write whole packet"),
                });
            }
            Ok(n) => {
                written += n;
                buf = &buf[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(PartialWrite { written, error }),
        }
    }
    Ok(())
}
