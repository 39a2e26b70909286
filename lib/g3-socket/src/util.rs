/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use socket2::Domain;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "Ipv4"),
            AddressFamily::Ipv6 => write!(f, "Ipv6"),
        }
    }
}

impl From<AddressFamily> for Domain {
    fn from(v: AddressFamily) -> Self {
        match v {
            AddressFamily::Ipv4 => Domain::IPV4,
            AddressFamily::Ipv6 => Domain::IPV6,
        }
    }
}

impl From<&IpAddr> for AddressFamily {
    fn from(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl From<&SocketAddr> for AddressFamily {
    fn from(addr: &SocketAddr) -> Self {
        AddressFamily::from(&addr.ip())
    }
}

/// Resolve `host:port` with the system resolver and return the first address.
///
/// IPv4 addresses are preferred when the host has both kinds of records, as most
/// metrics daemons listen on IPv4 only by default.
pub fn resolve_first(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut first_v6: Option<SocketAddr> = None;
    for addr in (host, port).to_socket_addrs()? {
        match addr {
            SocketAddr::V4(_) => return Ok(addr),
            SocketAddr::V6(_) => {
                if first_v6.is_none() {
                    first_v6 = Some(addr);
                }
            }
        }
    }
    first_v6.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address found for host {host}"),
        )
    })
}
