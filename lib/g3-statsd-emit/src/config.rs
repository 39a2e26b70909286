/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::IpAddr;
use std::time::Duration;

use log::warn;

use g3_socket::BindAddr;

use crate::sink::{MetricsSinkIo, TcpMetricsSink, UdpMetricsSink};
use crate::{MetricsPrefix, StatsdClient, StatsdClientBuildError, StatsdMetricsSink};

const DEFAULT_STATSD_HOST: &str = "127.0.0.1";
const DEFAULT_STATSD_PORT: u16 = 8125;
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(10);
const DEFAULT_RESOLVE_RETRY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatsdTransport {
    #[default]
    Datagram,
    Stream,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatsdBackend {
    Udp {
        host: String,
        port: u16,
        bind: Option<IpAddr>,
    },
    Tcp {
        host: String,
        port: u16,
        bind: Option<IpAddr>,
    },
    Discard,
}

impl Default for StatsdBackend {
    fn default() -> Self {
        StatsdBackend::Udp {
            host: DEFAULT_STATSD_HOST.to_string(),
            port: DEFAULT_STATSD_PORT,
            bind: None,
        }
    }
}

impl StatsdBackend {
    pub fn new(host: &str, port: u16, transport: StatsdTransport) -> Self {
        let host = host.to_string();
        match transport {
            StatsdTransport::Datagram => StatsdBackend::Udp {
                host,
                port,
                bind: None,
            },
            StatsdTransport::Stream => StatsdBackend::Tcp {
                host,
                port,
                bind: None,
            },
        }
    }

    fn check_target(host: &str, port: u16) -> Result<(), StatsdClientBuildError> {
        if host.is_empty() {
            return Err(StatsdClientBuildError::EmptyHost);
        }
        if port == 0 {
            return Err(StatsdClientBuildError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct StatsdClientConfig {
    backend: StatsdBackend,
    prefix: MetricsPrefix,
    batch_size: Option<usize>,
    send_buffer_size: Option<usize>,
    send_timeout: Duration,
    resolve_retry_interval: Duration,
}

impl Default for StatsdClientConfig {
    fn default() -> Self {
        StatsdClientConfig::with_prefix(MetricsPrefix::default())
    }
}

impl StatsdClientConfig {
    pub fn with_prefix(prefix: MetricsPrefix) -> Self {
        StatsdClientConfig {
            backend: StatsdBackend::default(),
            prefix,
            batch_size: None,
            send_buffer_size: None,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            resolve_retry_interval: DEFAULT_RESOLVE_RETRY_INTERVAL,
        }
    }

    pub fn set_backend(&mut self, target: StatsdBackend) {
        self.backend = target;
    }

    pub fn set_prefix(&mut self, prefix: MetricsPrefix) {
        self.prefix = prefix;
    }

    /// Join lines into packets of at most `size` bytes.
    ///
    /// Batched lines are held until the packet is full, or until
    /// [`StatsdClient::flush`] is called, so callers should flush periodically.
    pub fn set_batch_size(&mut self, size: usize) {
        self.batch_size = Some(size);
    }

    pub fn set_send_buffer_size(&mut self, size: usize) {
        self.send_buffer_size = Some(size);
    }

    /// Timeout for tcp connect and write, it should not be zero.
    pub fn set_send_timeout(&mut self, timeout: Duration) {
        self.send_timeout = timeout;
    }

    /// Minimal interval between udp target resolving tries, if it failed at
    /// build time.
    pub fn set_resolve_retry_interval(&mut self, interval: Duration) {
        self.resolve_retry_interval = interval;
    }

    #[inline]
    pub fn backend(&self) -> &StatsdBackend {
        &self.backend
    }

    #[inline]
    pub fn prefix(&self) -> &MetricsPrefix {
        &self.prefix
    }

    pub fn build(&self) -> Result<StatsdClient, StatsdClientBuildError> {
        if self.batch_size == Some(0) {
            return Err(StatsdClientBuildError::ZeroBatchSize);
        }
        if self.send_timeout.is_zero() {
            return Err(StatsdClientBuildError::ZeroSendTimeout);
        }

        let io = match &self.backend {
            StatsdBackend::Udp { host, port, bind } => {
                StatsdBackend::check_target(host, *port)?;
                let bind = BindAddr::from(*bind);
                let sink = UdpMetricsSink::new(
                    host.clone(),
                    *port,
                    bind,
                    self.send_buffer_size,
                    self.resolve_retry_interval,
                );
                match g3_socket::util::resolve_first(host, *port) {
                    Ok(addr) => {
                        let socket =
                            g3_socket::udp::new_std_socket_to(addr, &bind, self.send_buffer_size)
                                .map_err(StatsdClientBuildError::SocketError)?;
                        MetricsSinkIo::Udp(sink.with_socket(socket))
                    }
                    Err(e) => {
                        warn!(
                            "failed to resolve statsd target {host}:{port}, will retry on send: {e}"
                        );
                        MetricsSinkIo::Udp(sink)
                    }
                }
            }
            StatsdBackend::Tcp { host, port, bind } => {
                StatsdBackend::check_target(host, *port)?;
                let addr = g3_socket::util::resolve_first(host, *port).map_err(|e| {
                    StatsdClientBuildError::ResolveFailed {
                        host: host.clone(),
                        port: *port,
                        source: e,
                    }
                })?;
                let sink = TcpMetricsSink::new(addr, BindAddr::from(*bind), self.send_timeout);
                MetricsSinkIo::Tcp(sink.connect_early())
            }
            StatsdBackend::Discard => return Ok(StatsdClient::discard()),
        };

        let sink = StatsdMetricsSink::new(io, self.batch_size);
        Ok(StatsdClient::new_with_sink(self.prefix.clone(), sink))
    }
}
