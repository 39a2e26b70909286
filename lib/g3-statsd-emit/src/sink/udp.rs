/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, TryLockError};
use std::time::{Duration, Instant};

use log::{debug, warn};

use g3_socket::BindAddr;
use g3_socket::util::AddressFamily;

struct UdpTarget {
    host: String,
    port: u16,
    bind: BindAddr,
    send_buffer_size: Option<usize>,
    socket: OnceLock<UdpSocket>,
    resolving: AtomicBool,
}

impl UdpTarget {
    fn resolve(&self) {
        if let Err(e) = self.connect() {
            debug!(
                "failed to resolve statsd target {}:{}: {e}",
                self.host, self.port
            );
        }
        self.resolving.store(false, Ordering::Release);
    }

    fn connect(&self) -> io::Result<()> {
        let addr = g3_socket::util::resolve_first(&self.host, self.port)?;
        let socket = g3_socket::udp::new_std_socket_to(addr, &self.bind, self.send_buffer_size)?;
        debug!(
            "statsd target {}:{} resolved to {addr} ({})",
            self.host,
            self.port,
            AddressFamily::from(&addr)
        );
        // only one resolve thread runs at a time, so this is the first set
        let _ = self.socket.set(socket);
        Ok(())
    }
}

/// Datagram sink, lock free once the socket is connected.
///
/// If the target was not resolved at build time, it is resolved on a background
/// thread, started from the send path at most once per retry interval. Lines
/// sent before that finishes are dropped.
pub(crate) struct UdpMetricsSink {
    target: Arc<UdpTarget>,
    resolve_retry_interval: Duration,
    last_resolve: Mutex<Option<Instant>>,
}

impl UdpMetricsSink {
    pub(crate) fn new(
        host: String,
        port: u16,
        bind: BindAddr,
        send_buffer_size: Option<usize>,
        resolve_retry_interval: Duration,
    ) -> Self {
        let target = UdpTarget {
            host,
            port,
            bind,
            send_buffer_size,
            socket: OnceLock::new(),
            resolving: AtomicBool::new(false),
        };
        UdpMetricsSink {
            target: Arc::new(target),
            resolve_retry_interval,
            last_resolve: Mutex::new(None),
        }
    }

    /// Use a socket that has already been connected to the target.
    pub(crate) fn with_socket(self, socket: UdpSocket) -> Self {
        // the sink is not shared yet, so the cell is still empty
        let _ = self.target.socket.set(socket);
        self
    }

    #[cfg(test)]
    pub(crate) fn is_connected(&self) -> bool {
        self.target.socket.get().is_some()
    }

    pub(super) fn send_msg(&self, msg: &[u8]) -> io::Result<()> {
        let Some(socket) = self.target.socket.get() else {
            self.start_resolve();
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!(
                    "statsd target {}:{} not resolved yet",
                    self.target.host, self.target.port
                ),
            ));
        };
        let nw = socket.send(msg)?;
        if nw < msg.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("only {nw} of {} bytes sent", msg.len()),
            ));
        }
        Ok(())
    }

    fn start_resolve(&self) {
        {
            let mut last_resolve = match self.last_resolve.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(e)) => e.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            if let Some(last) = *last_resolve
                && last.elapsed() < self.resolve_retry_interval
            {
                return;
            }
            if self.target.resolving.swap(true, Ordering::AcqRel) {
                return;
            }
            *last_resolve = Some(Instant::now());
        }

        let target = Arc::clone(&self.target);
        let r = std::thread::Builder::new()
            .name("statsd-resolve".to_string())
            .spawn(move || target.resolve());
        if let Err(e) = r {
            warn!("failed to spawn statsd resolve thread: {e}");
            self.target.resolving.store(false, Ordering::Release);
        }
    }

    #[cfg(test)]
    fn is_resolving(&self) -> bool {
        self.target.resolving.load(Ordering::Acquire)
    }
}
