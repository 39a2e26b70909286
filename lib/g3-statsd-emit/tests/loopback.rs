/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{ErrorKind, Read};
use std::net::{TcpListener, UdpSocket};
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use g3_statsd_emit::{
    MetricsPrefix, StatsdBackend, StatsdClient, StatsdClientConfig, StatsdTransport,
};

fn udp_server() -> (UdpSocket, u16) {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = server.local_addr().unwrap().port();
    (server, port)
}

fn recv_string(server: &UdpSocket) -> String {
    let mut buf = [0u8; 2048];
    let len = server.recv(&mut buf).unwrap();
    String::from_utf8(buf[..len].to_vec()).unwrap()
}

#[test]
fn udp_simple() {
    let (server, port) = udp_server();
    let client =
        StatsdClient::new("127.0.0.1", port, "test.ex", StatsdTransport::Datagram).unwrap();

    client.gauge("foo_gauge", 42).send();
    client.increment("foo_incr.^rate=1000").send();
    client.timing("foo_timer", 12.0).send();

    assert_eq!(recv_string(&server), "test.ex.foo_gauge:42|g");
    assert_eq!(recv_string(&server), "test.ex.foo_incr.^rate=1000:1|c");
    assert_eq!(recv_string(&server), "test.ex.foo_timer:12.0|ms");
    assert_eq!(client.stats().sent_packets, 3);
}

#[test]
fn udp_batch() {
    let (server, port) = udp_server();
    let mut config = StatsdClientConfig::with_prefix(MetricsPrefix::from_str("app").unwrap());
    config.set_backend(StatsdBackend::new("127.0.0.1", port, StatsdTransport::Datagram));
    config.set_batch_size(512);
    let client = config.build().unwrap();

    client.increment("a").send();
    client.gauge("b", 2).send();
    client.set("c", "x").send();
    client.flush();

    assert_eq!(recv_string(&server), "app.a:1|c\napp.b:2|g\napp.c:x|s");
    let stats = client.stats();
    assert_eq!(stats.sent_packets, 1);
    assert_eq!(stats.sent_lines, 3);
}

#[test]
fn udp_negative_gauge() {
    let (server, port) = udp_server();
    let client = StatsdClient::new("127.0.0.1", port, "", StatsdTransport::Datagram).unwrap();

    client.gauge("temp", -5).send();
    client.gauge_float("temp", -0.25f32).send();
    client.gauge_delta("temp", -5).send();

    assert_eq!(recv_string(&server), "temp:0|g\ntemp:-5|g");
    assert_eq!(recv_string(&server), "temp:0|g\ntemp:-0.25|g");
    assert_eq!(recv_string(&server), "temp:-5|g");
    let stats = client.stats();
    assert_eq!(stats.sent_packets, 3);
    assert_eq!(stats.sent_lines, 5);
}

#[test]
fn udp_closed_port() {
    let (server, port) = udp_server();
    drop(server);

    let client = StatsdClient::new("127.0.0.1", port, "", StatsdTransport::Datagram).unwrap();
    let begin = Instant::now();
    for _ in 0..100 {
        client.increment("foo").send();
        let _span = client.timer("bar");
    }
    assert!(begin.elapsed() < Duration::from_secs(5));

    let stats = client.stats();
    assert_eq!(stats.sent_lines + stats.dropped_lines, 200);
}

#[test]
fn tcp_lines() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let client = StatsdClient::new("127.0.0.1", port, "app", StatsdTransport::Stream).unwrap();
    client.increment("a").send();
    client.gauge("b", -2).send();
    drop(client);

    let (mut conn, _) = listener.accept().unwrap();
    let mut buf = String::new();
    conn.read_to_string(&mut buf).unwrap();
    assert_eq!(buf, "app.a:1|c\napp.b:0|g\napp.b:-2|g\n");
}

#[test]
fn tcp_concurrent_writers() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = StatsdClientConfig::default();
    config.set_backend(StatsdBackend::new("127.0.0.1", port, StatsdTransport::Stream));
    config.set_send_timeout(Duration::from_secs(1));
    let client = Arc::new(config.build().unwrap());

    let reader = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let mut buf = String::new();
        conn.read_to_string(&mut buf).unwrap();
        buf
    });

    let mut handles = Vec::new();
    for i in 0..4 {
        let client = Arc::clone(&client);
        handles.push(thread::spawn(move || {
            let name = format!("worker{i}");
            for v in 0..100 {
                client.gauge(&name, v).send();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    drop(client);

    let received = reader.join().unwrap();
    let lines: Vec<&str> = received.lines().collect();
    assert_eq!(lines.len(), 400);
    for line in lines {
        let (name, rest) = line.split_once(':').unwrap();
        assert!(name.starts_with("worker"));
        assert!(rest.ends_with("|g"));
    }
}

#[test]
fn tcp_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = StatsdClientConfig::default();
    config.set_backend(StatsdBackend::new("127.0.0.1", port, StatsdTransport::Stream));
    config.set_send_timeout(Duration::from_secs(1));
    let client = config.build().unwrap();

    let (mut conn, _) = listener.accept().unwrap();
    client.increment("before").send();
    let mut buf = [0u8; 64];
    let len = conn.read(&mut buf).unwrap();
    assert_eq!(&buf[..len], b"before:1|c\n");
    drop(conn);

    // writes to the closed connection fail after a while, then the client
    // connects again
    listener.set_nonblocking(true).unwrap();
    let mut conn = None;
    for _ in 0..200 {
        client.increment("after").send();
        match listener.accept() {
            Ok((c, _)) => {
                conn = Some(c);
                break;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => panic!("accept failed: {e}"),
        }
    }
    let mut conn = conn.expect("no reconnect from the client");
    drop(client);

    conn.set_nonblocking(false).unwrap();
    let mut received = String::new();
    conn.read_to_string(&mut received).unwrap();
    assert!(received.starts_with("after:1|c\n"));
    assert!(received.lines().all(|l| l == "after:1|c"));
}

#[test]
fn tcp_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = StatsdClient::new("127.0.0.1", port, "", StatsdTransport::Stream).unwrap();
    for _ in 0..10 {
        client.increment("foo").send();
    }
    let stats = client.stats();
    assert_eq!(stats.sent_packets, 0);
    assert_eq!(stats.dropped_lines, 10);
}
