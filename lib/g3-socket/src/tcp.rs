/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use super::BindAddr;
use super::util::AddressFamily;

/// Connect to `peer_addr` within `timeout`.
///
/// The returned stream has nodelay set, and `timeout` is also applied as the
/// write timeout so that a stalled peer will never block the writer for long.
pub fn new_std_connect_to(
    peer_addr: SocketAddr,
    bind: &BindAddr,
    timeout: Duration,
) -> io::Result<TcpStream> {
    let peer_family = AddressFamily::from(&peer_addr);
    let socket = Socket::new(Domain::from(peer_family), Type::STREAM, Some(Protocol::TCP))?;
    bind.bind_for_connect(&socket, peer_family)?;
    let peer: SockAddr = peer_addr.into();
    socket.connect_timeout(&peer, timeout)?;

    let stream = TcpStream::from(socket);
    stream.set_nodelay(true)?;
    stream.set_write_timeout(Some(timeout))?;
    Ok(stream)
}
