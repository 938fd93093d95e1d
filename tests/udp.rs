// Copyright (C) 2022-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of syslog-udp-backend.
//
// syslog-udp-backend is free software: you can redistribute it and/or modify it under the terms of
// the GNU General Public License as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// syslog-udp-backend is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with syslog-udp-backend.
// If not, see <http://www.gnu.org/licenses/>.

//! End-to-end: log events in, datagrams out.

use syslog_udp_backend::{
    backend::Backend,
    config::Options,
    event::LogEvent,
    facility::{Facility, Level},
    rfc5424::Hostname,
    structured_data::SdSpec,
    timestamp::Timestamp,
    transport::UdpTransport,
    value::Value,
};

use std::{net::UdpSocket, time::Duration};

fn collector() -> UdpSocket {
    let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
    sock.set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    sock
}

fn recv(sock: &UdpSocket) -> Option<Vec<u8>> {
    let mut buf = [0u8; 65536];
    sock.recv(&mut buf).ok().map(|n| buf[..n].to_vec())
}

fn backend(sock: &UdpSocket) -> Backend<UdpTransport> {
    let mut backend = Backend::try_default().unwrap();
    backend
        .configure(
            Options::default()
                .host("127.0.0.1")
                .port(sock.local_addr().unwrap().port())
                .facility(Facility::LOG_LOCAL1)
                .app_name("svc"),
        )
        .unwrap();
    backend
}

#[test]
fn one_event_one_datagram() {
    let sock = collector();
    let backend = backend(&sock);

    assert!(backend.handle_event(&LogEvent::new(Level::LOG_ERR, "boom")));

    let packet = String::from_utf8(recv(&sock).unwrap()).unwrap();
    // <139>1 YYYY-MM-DDTHH:MM:SS.mmmZ hostname svc pid - boom\n
    let (header, rest) = packet.split_at("<139>1 ".len());
    assert_eq!(header, "<139>1 ");
    let (ts, rest) = rest.split_at("YYYY-MM-DDTHH:MM:SS.mmm".len());
    assert_eq!(ts.as_bytes()[10], b'T');
    assert_eq!(ts.as_bytes()[19], b'.');
    assert!(ts
        .bytes()
        .enumerate()
        .all(|(i, b)| matches!(i, 4 | 7 | 10 | 13 | 16 | 19) || b.is_ascii_digit()));
    assert_eq!(
        rest,
        format!(
            "Z {} svc {} - boom\n",
            Hostname::discover(),
            std::process::id()
        )
    );

    // Exactly one
    assert!(recv(&sock).is_none());
}

#[test]
fn ipv6_collectors() {
    let sock = collector();
    let mut backend = backend(&sock);
    // Hosts without IPv6 loopback have nothing to test
    let sock6 = match UdpSocket::bind("[::1]:0") {
        Ok(sock6) => sock6,
        Err(_) => return,
    };
    sock6
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    backend
        .configure(
            Options::default()
                .host("::1")
                .port(sock6.local_addr().unwrap().port()),
        )
        .unwrap();
    assert!(backend.config().destination().is_ipv6());

    assert!(backend.handle_event(&LogEvent::new(Level::LOG_ERR, "boom")));
    let packet = String::from_utf8(recv(&sock6).unwrap()).unwrap();
    assert!(packet.starts_with("<139>1 "));
    assert!(packet.ends_with(&format!(" svc {} - boom\n", std::process::id())));

    // ...and back again
    backend
        .configure(Options::default().host("127.0.0.1").port(sock.local_addr().unwrap().port()))
        .unwrap();
    assert!(backend.handle_event(&LogEvent::new(Level::LOG_ERR, "boom")));
    assert!(recv(&sock).is_some());
    assert!(recv(&sock6).is_none());
}

#[test]
fn filtered_events_send_nothing() {
    let sock = collector();
    let mut backend = backend(&sock);
    backend
        .configure(Options::default().level(Level::LOG_WARNING))
        .unwrap();

    assert!(!backend.handle_event(&LogEvent::new(Level::LOG_INFO, "chatty")));
    assert!(recv(&sock).is_none());
    assert!(backend.handle_event(&LogEvent::new(Level::LOG_ERR, "boom")));
    assert!(recv(&sock).is_some());
}

#[test]
fn structured_data_round_trip() {
    let sock = collector();
    let mut backend = backend(&sock);
    backend
        .configure(
            Options::default()
                .structured_data(vec![SdSpec::new("meta@32473", ["module", "line", "note"])])
                .format("$message"),
        )
        .unwrap();

    let event = LogEvent::new(Level::LOG_WARNING, "disk almost full")
        .at(Timestamp::new(2024, 1, 2, 3, 4, 5, 6))
        .with("module", Value::Symbol("mymod".into()))
        .with("line", 42i64)
        .with("note", "say \"cheese\"")
        .with("other", "x");
    assert!(backend.handle_event(&event));

    let packet = String::from_utf8(recv(&sock).unwrap()).unwrap();
    assert!(packet.starts_with("<140>1 2024-01-02T03:04:05.006Z "));
    assert!(packet.ends_with(
        " - [meta@32473 module=\"mymod\" line=\"42\" note=\"say \\\"cheese\\\"\"] disk almost full"
    ));

    let msg = syslog_rfc5424::parse_message(&packet).unwrap();
    assert_eq!(msg.appname.as_deref(), Some("svc"));
    assert_eq!(
        msg.sd.find_tuple("meta@32473", "note").map(|s| s.as_str()),
        Some("say \"cheese\"")
    );
    assert_eq!(msg.sd.find_tuple("meta@32473", "other"), None);
    assert_eq!(msg.msg, "disk almost full");
}

#[test]
fn shutdown_stops_sending() {
    let sock = collector();
    let mut backend = backend(&sock);
    backend.shutdown();
    assert!(!backend.handle_event(&LogEvent::new(Level::LOG_EMERG, "too late")));
    assert!(recv(&sock).is_none());
}
