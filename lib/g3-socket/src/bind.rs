/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2024-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{IpAddr, SocketAddr};

use socket2::{SockAddr, Socket};

use crate::util::AddressFamily;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BindAddr {
    #[default]
    None,
    Ip(IpAddr),
}

impl BindAddr {
    /// Bind the socket to the configured local address before connecting.
    ///
    /// Nothing is done for `BindAddr::None`, the OS will pick the local address
    /// when connecting.
    pub(crate) fn bind_for_connect(
        &self,
        socket: &Socket,
        peer_family: AddressFamily,
    ) -> io::Result<()> {
        match self {
            BindAddr::None => Ok(()),
            BindAddr::Ip(ip) => {
                if AddressFamily::from(ip) != peer_family {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "bind_ip should be of the same family with peer ip",
                    ));
                }
                let addr: SockAddr = SocketAddr::new(*ip, 0).into();
                socket.bind(&addr)
            }
        }
    }
}

impl From<Option<IpAddr>> for BindAddr {
    fn from(ip: Option<IpAddr>) -> Self {
        match ip {
            Some(ip) => BindAddr::Ip(ip),
            None => BindAddr::None,
        }
    }
}
