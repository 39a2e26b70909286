/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{SocketAddr, UdpSocket};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use super::BindAddr;
use super::util::AddressFamily;

/// Create a non-blocking UDP socket connected to `peer_addr`.
///
/// The socket is connected so that plain `send` can be used, and so that the
/// kernel filters datagrams coming from other peers.
pub fn new_std_socket_to(
    peer_addr: SocketAddr,
    bind: &BindAddr,
    send_buffer_size: Option<usize>,
) -> io::Result<UdpSocket> {
    let peer_family = AddressFamily::from(&peer_addr);
    let socket = new_udp_socket(peer_family)?;
    if let Some(size) = send_buffer_size {
        socket.set_send_buffer_size(size)?;
    }
    bind.bind_for_connect(&socket, peer_family)?;
    let peer: SockAddr = peer_addr.into();
    socket.connect(&peer)?;
    Ok(UdpSocket::from(socket))
}

fn new_udp_socket(family: AddressFamily) -> io::Result<Socket> {
    let socket = Socket::new(Domain::from(family), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}
